//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现，同时作为流水线的进度通知端口

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{ChapterProgress, ProgressSinkPort};
use crate::domain::script::{ChapterPhase, NovelId};

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ScriptEvent {
    /// 单章阶段变化
    ChapterProgress {
        novel_id: NovelId,
        chapter_number: u32,
        phase: String,
        percent: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        scene_index: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        scene_total: Option<usize>,
    },
    /// 单章组装完成
    ChapterAssembled {
        novel_id: NovelId,
        chapter_number: u32,
    },
    /// 批次进度（已完成章节 / 本次章节总数）
    BatchProgress {
        novel_id: NovelId,
        completed: usize,
        total: usize,
    },
    /// 批次结束
    BatchFinished {
        novel_id: NovelId,
        summary: String,
    },
    /// 批次失败
    BatchFailed {
        novel_id: NovelId,
        error: String,
    },
}

/// 事件发布器
pub struct EventPublisher {
    global_channel: broadcast::Sender<ScriptEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(256);
        Self {
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<ScriptEvent> {
        self.global_channel.subscribe()
    }

    fn publish(&self, event: ScriptEvent) {
        if let Err(e) = self.global_channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSinkPort for EventPublisher {
    fn chapter_progress(&self, progress: ChapterProgress) {
        let event = match progress.phase {
            ChapterPhase::Assembled => ScriptEvent::ChapterAssembled {
                novel_id: progress.novel_id,
                chapter_number: progress.chapter_number,
            },
            phase => {
                let (scene_index, scene_total) = match phase {
                    ChapterPhase::SceneLoop { index, total } => (Some(index), Some(total)),
                    _ => (None, None),
                };
                ScriptEvent::ChapterProgress {
                    novel_id: progress.novel_id,
                    chapter_number: progress.chapter_number,
                    phase: phase.as_str().to_string(),
                    percent: progress.percent,
                    scene_index,
                    scene_total,
                }
            }
        };
        self.publish(event);
    }

    fn batch_progress(&self, novel_id: &NovelId, completed: usize, total: usize) {
        self.publish(ScriptEvent::BatchProgress {
            novel_id: *novel_id,
            completed,
            total,
        });
    }

    fn batch_finished(&self, novel_id: &NovelId, summary: &str) {
        self.publish(ScriptEvent::BatchFinished {
            novel_id: *novel_id,
            summary: summary.to_string(),
        });
    }

    fn batch_failed(&self, novel_id: &NovelId, error: &str) {
        self.publish(ScriptEvent::BatchFailed {
            novel_id: *novel_id,
            error: error.to_string(),
        });
    }
}
