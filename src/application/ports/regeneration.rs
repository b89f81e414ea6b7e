//! Regeneration Confirm Port - 覆盖已有剧本前的确认

use async_trait::async_trait;

use crate::domain::script::NovelId;

/// 当所选章节已有剧本时，询问调用方是否重新生成
#[async_trait]
pub trait RegenerationConfirmPort: Send + Sync {
    /// 返回 false 时这些章节被移出本次运行并保留原剧本
    async fn confirm_regeneration(&self, novel_id: &NovelId, chapter_numbers: &[u32]) -> bool;
}
