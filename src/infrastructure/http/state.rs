//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    BatchController, ChapterPipeline, CreditLedgerPort, GenerateScriptsHandler,
    GenerativeTextPort, GetScriptsHandler, PipelineOptions, RunTrackerPort, ScriptStorePort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub generate_scripts_handler: Arc<GenerateScriptsHandler>,

    // ========== Query Handlers ==========
    pub get_scripts_handler: GetScriptsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        llm: Arc<dyn GenerativeTextPort>,
        credit_ledger: Arc<dyn CreditLedgerPort>,
        script_store: Arc<dyn ScriptStorePort>,
        run_tracker: Arc<dyn RunTrackerPort>,
        event_publisher: Arc<EventPublisher>,
        options: PipelineOptions,
    ) -> Self {
        let pipeline = ChapterPipeline::new(llm, credit_ledger, event_publisher.clone(), options);
        let controller = BatchController::new(pipeline, script_store.clone(), event_publisher.clone());

        Self {
            event_publisher,
            generate_scripts_handler: Arc::new(GenerateScriptsHandler::new(
                Arc::new(controller),
                run_tracker,
            )),
            get_scripts_handler: GetScriptsHandler::new(script_store),
        }
    }
}
