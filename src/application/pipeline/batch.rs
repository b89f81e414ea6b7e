//! 批次控制器
//!
//! 1. 读取已有剧本，已有剧本的章节需调用方确认是否重新生成
//! 2. 逐章运行流水线（严格顺序），每章组装后通知批次进度
//! 3. 积分不足时立即中止，已组装的章节保留
//! 4. 持久化：已有剧本 ∪ 本次生成（同章节以本次为准）

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::{ChapterPipeline, PipelineError};
use crate::application::error::ApplicationError;
use crate::application::ports::{ProgressSinkPort, RegenerationConfirmPort, ScriptStorePort};
use crate::domain::script::{ChapterText, NovelId, ScriptDocument, ScriptSet, UserId};

/// 批次请求
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub novel_id: NovelId,
    pub user_id: UserId,
    /// 按处理顺序排列
    pub chapters: Vec<ChapterText>,
}

/// 批次结局
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed,
    /// 所有章节已组装，但部分场景生成失败
    PartiallyCompleted { succeeded: usize, failed_scenes: usize },
    /// 积分不足中止
    Aborted { completed: usize, reason: String },
}

impl BatchOutcome {
    pub fn summary(&self) -> String {
        match self {
            BatchOutcome::Completed => "completed".to_string(),
            BatchOutcome::PartiallyCompleted { succeeded, .. } => {
                format!("partially completed ({} succeeded)", succeeded)
            }
            BatchOutcome::Aborted { completed, .. } => {
                format!("aborted (insufficient credit, {} completed)", completed)
            }
        }
    }
}

/// 批次结果
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    /// 本次组装的文档（按处理顺序）
    pub assembled: Vec<ScriptDocument>,
    /// 已有剧本且未确认重新生成而被跳过的章节
    pub skipped_existing: Vec<u32>,
    pub total_in_run: usize,
    pub persisted: bool,
}

pub struct BatchController {
    pipeline: ChapterPipeline,
    store: Arc<dyn ScriptStorePort>,
    progress: Arc<dyn ProgressSinkPort>,
}

impl BatchController {
    pub fn new(
        pipeline: ChapterPipeline,
        store: Arc<dyn ScriptStorePort>,
        progress: Arc<dyn ProgressSinkPort>,
    ) -> Self {
        Self {
            pipeline,
            store,
            progress,
        }
    }

    /// 运行一个批次
    ///
    /// confirm 只在所选章节已有剧本时被询问一次。
    pub async fn run(
        &self,
        request: BatchRequest,
        confirm: &dyn RegenerationConfirmPort,
    ) -> Result<BatchReport, ApplicationError> {
        let BatchRequest {
            novel_id,
            user_id,
            chapters,
        } = request;

        if chapters.is_empty() {
            return Err(ApplicationError::validation("No chapters selected"));
        }

        let mut seen = HashSet::new();
        let mut chapters: Vec<ChapterText> = chapters
            .into_iter()
            .filter(|c| seen.insert(c.number))
            .collect();

        let existing = match self.store.load_existing_scripts(&novel_id).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!(novel_id = %novel_id, error = %e, "Failed to load existing scripts");
                self.progress.batch_failed(&novel_id, &e.to_string());
                return Err(e.into());
            }
        };
        let mut script_set = ScriptSet::from_documents(existing);

        let existing: Vec<u32> = chapters
            .iter()
            .map(|c| c.number)
            .filter(|n| script_set.contains(*n))
            .collect();

        let mut skipped_existing = Vec::new();
        if !existing.is_empty() && !confirm.confirm_regeneration(&novel_id, &existing).await {
            tracing::info!(
                novel_id = %novel_id,
                chapters = ?existing,
                "Regeneration declined, keeping existing scripts"
            );
            chapters.retain(|c| !script_set.contains(c.number));
            skipped_existing = existing;
        }

        let total_in_run = chapters.len();
        tracing::info!(
            novel_id = %novel_id,
            total = total_in_run,
            skipped = skipped_existing.len(),
            "Script batch started"
        );

        let mut assembled: Vec<ScriptDocument> = Vec::with_capacity(total_in_run);
        let mut abort_reason = None;

        for chapter in &chapters {
            match self.pipeline.run(&novel_id, &user_id, chapter).await {
                Ok(document) => {
                    assembled.push(document);
                    self.progress
                        .batch_progress(&novel_id, assembled.len(), total_in_run);
                }
                Err(PipelineError::CreditInsufficient {
                    chapter_number,
                    reason,
                }) => {
                    tracing::warn!(
                        novel_id = %novel_id,
                        chapter = chapter_number,
                        completed = assembled.len(),
                        reason = %reason,
                        "Script batch aborted"
                    );
                    abort_reason = Some(reason);
                    break;
                }
                Err(e) => {
                    tracing::error!(novel_id = %novel_id, error = %e, "Chapter pipeline failed");
                    self.progress.batch_failed(&novel_id, &e.to_string());
                    return Err(ApplicationError::internal(e.to_string()));
                }
            }
        }

        let persisted = if assembled.is_empty() {
            false
        } else {
            script_set.merge(assembled.iter().cloned());

            if let Err(e) = self.store.save_scripts(&novel_id, &script_set.documents()).await {
                tracing::error!(
                    novel_id = %novel_id,
                    unsaved = assembled.len(),
                    error = %e,
                    "Failed to persist scripts"
                );
                self.progress.batch_failed(&novel_id, &e.to_string());
                return Err(ApplicationError::PersistenceFailed {
                    message: e.to_string(),
                    unsaved: assembled,
                });
            }
            true
        };

        let outcome = match abort_reason {
            Some(reason) => BatchOutcome::Aborted {
                completed: assembled.len(),
                reason,
            },
            None => {
                let failed_scenes: usize = assembled.iter().map(|d| d.failed_scene_count()).sum();
                if failed_scenes == 0 {
                    BatchOutcome::Completed
                } else {
                    BatchOutcome::PartiallyCompleted {
                        succeeded: assembled
                            .iter()
                            .filter(|d| d.failed_scene_count() == 0)
                            .count(),
                        failed_scenes,
                    }
                }
            }
        };

        tracing::info!(
            novel_id = %novel_id,
            outcome = %outcome.summary(),
            assembled = assembled.len(),
            persisted = persisted,
            "Script batch finished"
        );
        self.progress.batch_finished(&novel_id, &outcome.summary());

        Ok(BatchReport {
            outcome,
            assembled,
            skipped_existing,
            total_in_run,
            persisted,
        })
    }
}
