//! Script Commands

use crate::domain::script::{ChapterText, NovelId, UserId};

/// 为所选章节生成剧本
#[derive(Debug, Clone)]
pub struct GenerateScripts {
    pub novel_id: NovelId,
    pub user_id: UserId,
    /// 按处理顺序排列
    pub chapters: Vec<ChapterText>,
}
