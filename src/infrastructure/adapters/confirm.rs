//! Static Regeneration Confirm
//!
//! HTTP 请求中 regenerate_existing 字段即调用方的确认结果

use async_trait::async_trait;

use crate::application::ports::RegenerationConfirmPort;
use crate::domain::script::NovelId;

pub struct StaticRegenerationConfirm {
    regenerate: bool,
}

impl StaticRegenerationConfirm {
    pub fn new(regenerate: bool) -> Self {
        Self { regenerate }
    }
}

#[async_trait]
impl RegenerationConfirmPort for StaticRegenerationConfirm {
    async fn confirm_regeneration(&self, novel_id: &NovelId, chapter_numbers: &[u32]) -> bool {
        tracing::debug!(
            novel_id = %novel_id,
            chapters = ?chapter_numbers,
            regenerate = self.regenerate,
            "Regeneration confirmation"
        );
        self.regenerate
    }
}
