//! Script Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::ScriptStorePort;
use crate::application::queries::{GetScripts, ScriptDocumentView};

/// GetScripts Handler
pub struct GetScriptsHandler {
    store: Arc<dyn ScriptStorePort>,
}

impl GetScriptsHandler {
    pub fn new(store: Arc<dyn ScriptStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetScripts) -> Result<Vec<ScriptDocumentView>, ApplicationError> {
        let mut documents = self.store.load_existing_scripts(&query.novel_id).await?;
        documents.sort_by_key(|d| d.chapter_number);
        Ok(documents.into_iter().map(ScriptDocumentView::from).collect())
    }
}
