//! Progress Sink Port - 进度通知抽象
//!
//! 纯观察者：流水线不依赖通知结果

use serde::Serialize;

use crate::domain::script::{ChapterPhase, NovelId};

/// 单章进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterProgress {
    pub novel_id: NovelId,
    pub chapter_number: u32,
    pub phase: ChapterPhase,
    pub percent: u8,
}

/// Progress Sink Port
pub trait ProgressSinkPort: Send + Sync {
    /// 单章阶段变化
    fn chapter_progress(&self, progress: ChapterProgress);

    /// 一章组装完成后的批次进度
    fn batch_progress(&self, novel_id: &NovelId, completed: usize, total: usize);

    /// 批次结束（完成、部分完成或中止）
    fn batch_finished(&self, novel_id: &NovelId, summary: &str);

    /// 批次失败（持久化等边界错误）
    fn batch_failed(&self, novel_id: &NovelId, error: &str);
}
