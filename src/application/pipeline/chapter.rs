//! 单章流水线
//!
//! PENDING → CREDIT_CHECK → SEGMENTING → NARRATING → SCENE_LOOP(i) → ASSEMBLED
//!
//! 每次迁移都会通知进度。只有积分校验失败会作为错误返回，
//! 其余生成错误都在各阶段内部以兜底内容吸收。

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use super::{NarrationSynthesizer, PipelineOptions, SceneScriptGenerator, Segmenter};
use crate::application::ports::{
    ChapterProgress, CreditLedgerPort, GenerativeTextPort, ProgressSinkPort,
};
use crate::domain::script::{ChapterPhase, ChapterText, NovelId, ScriptDocument, UserId};

/// 单章流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Insufficient credit for chapter {chapter_number}: {reason}")]
    CreditInsufficient { chapter_number: u32, reason: String },

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: ChapterPhase, to: ChapterPhase },
}

/// 当前阶段游标，负责校验迁移并通知进度
struct PhaseCursor<'a> {
    novel_id: NovelId,
    chapter_number: u32,
    phase: ChapterPhase,
    sink: &'a dyn ProgressSinkPort,
}

impl<'a> PhaseCursor<'a> {
    fn new(novel_id: NovelId, chapter_number: u32, sink: &'a dyn ProgressSinkPort) -> Self {
        Self {
            novel_id,
            chapter_number,
            phase: ChapterPhase::Pending,
            sink,
        }
    }

    fn advance(&mut self, next: ChapterPhase) -> Result<(), PipelineError> {
        if !self.phase.can_transition_to(&next) {
            return Err(PipelineError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::debug!(
            novel_id = %self.novel_id,
            chapter = self.chapter_number,
            from = %self.phase,
            to = %next,
            "Chapter phase transition"
        );

        self.phase = next;
        self.sink.chapter_progress(ChapterProgress {
            novel_id: self.novel_id,
            chapter_number: self.chapter_number,
            phase: next,
            percent: next.percent(),
        });
        Ok(())
    }
}

pub struct ChapterPipeline {
    segmenter: Segmenter,
    narrator: NarrationSynthesizer,
    scenes: SceneScriptGenerator,
    credit: Arc<dyn CreditLedgerPort>,
    progress: Arc<dyn ProgressSinkPort>,
    credit_feature_key: String,
}

impl ChapterPipeline {
    pub fn new(
        llm: Arc<dyn GenerativeTextPort>,
        credit: Arc<dyn CreditLedgerPort>,
        progress: Arc<dyn ProgressSinkPort>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            segmenter: Segmenter::new(llm.clone(), options.segmenter, options.segmentation_timeout)
                .with_ai(options.use_ai_segmentation),
            narrator: NarrationSynthesizer::new(
                llm.clone(),
                options.narration,
                options.narration_timeout,
            ),
            scenes: SceneScriptGenerator::new(llm, options.scene_timeout),
            credit,
            progress,
            credit_feature_key: options.credit_feature_key,
        }
    }

    /// 处理一章，返回组装好的剧本文档
    pub async fn run(
        &self,
        novel_id: &NovelId,
        user_id: &UserId,
        chapter: &ChapterText,
    ) -> Result<ScriptDocument, PipelineError> {
        let mut cursor = PhaseCursor::new(*novel_id, chapter.number, self.progress.as_ref());

        cursor.advance(ChapterPhase::CreditCheck)?;
        self.check_credit(user_id, chapter).await?;

        cursor.advance(ChapterPhase::Segmenting)?;
        let desired_count = self.segmenter.desired_count(chapter);
        let segments = self.segmenter.segment(&chapter.content, desired_count).await;

        cursor.advance(ChapterPhase::Narrating)?;
        let narrations = self.narrator.synthesize(&segments).await;

        let total = segments.len();
        let mut scenes = Vec::with_capacity(total);
        for (index, (segment, narration)) in segments.iter().zip(&narrations).enumerate() {
            cursor.advance(ChapterPhase::SceneLoop { index, total })?;
            scenes.push(self.scenes.generate_scene(segment, narration, chapter).await);
        }

        cursor.advance(ChapterPhase::Assembled)?;
        let document =
            ScriptDocument::assemble(chapter.number, chapter.title.clone(), scenes, Utc::now());

        tracing::info!(
            novel_id = %novel_id,
            chapter = chapter.number,
            scenes = document.scenes.len(),
            failed_scenes = document.failed_scene_count(),
            "Chapter script assembled"
        );

        Ok(document)
    }

    /// 积分校验：扣减被拒或积分服务不可用都视为积分不足
    async fn check_credit(&self, user_id: &UserId, chapter: &ChapterText) -> Result<(), PipelineError> {
        let note = format!("第 {} 章《{}》剧本生成", chapter.number, chapter.title);

        let reason = match self
            .credit
            .deduct(user_id, &self.credit_feature_key, &note)
            .await
        {
            Ok(outcome) if outcome.success => {
                tracing::debug!(
                    user_id = %user_id,
                    chapter = chapter.number,
                    balance = ?outcome.balance,
                    "Credit deducted"
                );
                return Ok(());
            }
            Ok(outcome) => outcome
                .error
                .unwrap_or_else(|| "insufficient credit".to_string()),
            Err(e) => e.to_string(),
        };

        tracing::warn!(
            user_id = %user_id,
            chapter = chapter.number,
            reason = %reason,
            "Credit check failed"
        );

        Err(PipelineError::CreditInsufficient {
            chapter_number: chapter.number,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::testing::{
        chapter, scripted_llm, CountingLedger, Recorded, RecordingProgress,
    };
    use crate::domain::script::SceneStatus;
    use crate::infrastructure::adapters::llm::ScriptedLlmClient;

    fn pipeline(
        llm: Arc<ScriptedLlmClient>,
        ledger: Arc<CountingLedger>,
        progress: Arc<RecordingProgress>,
    ) -> ChapterPipeline {
        ChapterPipeline::new(llm, ledger, progress, PipelineOptions::default())
    }

    #[tokio::test]
    async fn test_runs_all_phases_in_order() {
        let progress = Arc::new(RecordingProgress::default());
        let ledger = Arc::new(CountingLedger::default());
        let pipeline = pipeline(Arc::new(scripted_llm(None)), ledger.clone(), progress.clone());

        let document = pipeline
            .run(&NovelId::new(), &UserId::new("u1").unwrap(), &chapter(3))
            .await
            .unwrap();

        assert_eq!(document.chapter_number, 3);
        assert_eq!(document.scenes.len(), 5);
        assert!(document.scenes.iter().all(|s| s.status == SceneStatus::Success));
        assert_eq!(document.scenes[4].title, "第5幕");

        let phases = progress.phases_of(3);
        assert_eq!(phases.first(), Some(&ChapterPhase::CreditCheck));
        assert_eq!(phases.last(), Some(&ChapterPhase::Assembled));
        assert_eq!(phases.len(), 3 + 5 + 1);
        assert_eq!(ledger.notes(), vec!["第 3 章《第3章》剧本生成"]);
    }

    #[tokio::test]
    async fn test_failed_scene_still_assembles() {
        let progress = Arc::new(RecordingProgress::default());
        let pipeline = pipeline(
            Arc::new(scripted_llm(Some(2))),
            Arc::new(CountingLedger::default()),
            progress.clone(),
        );

        let document = pipeline
            .run(&NovelId::new(), &UserId::new("u1").unwrap(), &chapter(1))
            .await
            .unwrap();

        let failed = &document.scenes[1];
        assert_eq!(failed.status, SceneStatus::Failed);
        assert!(!failed.body.is_empty());
        assert_eq!(document.failed_scene_count(), 1);
        assert!(progress
            .events()
            .contains(&Recorded::Chapter(1, ChapterPhase::Assembled, 100)));
    }

    #[tokio::test]
    async fn test_credit_refusal_happens_before_generation() {
        let llm = Arc::new(scripted_llm(None));
        let progress = Arc::new(RecordingProgress::default());
        let pipeline = pipeline(llm.clone(), Arc::new(CountingLedger::refusing_on(1)), progress.clone());

        let result = pipeline
            .run(&NovelId::new(), &UserId::new("u1").unwrap(), &chapter(7))
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::CreditInsufficient { chapter_number: 7, .. })
        ));
        assert!(llm.prompts().await.is_empty());
        assert_eq!(progress.phases_of(7), vec![ChapterPhase::CreditCheck]);
    }
}
