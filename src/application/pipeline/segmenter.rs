//! 章节分段：生成服务优先，确定性兜底

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{complete_with_timeout, GenerationRequest, GenerativeTextPort};
use crate::domain::prompts::{extract_numbered_pieces, segmentation_prompt};
use crate::domain::script::{ChapterText, Segment};
use crate::domain::{desired_segment_count, segment_fallback, SegmenterConfig};

pub struct Segmenter {
    llm: Arc<dyn GenerativeTextPort>,
    config: SegmenterConfig,
    timeout: Duration,
    use_ai: bool,
}

impl Segmenter {
    pub fn new(llm: Arc<dyn GenerativeTextPort>, config: SegmenterConfig, timeout: Duration) -> Self {
        Self {
            llm,
            config,
            timeout,
            use_ai: true,
        }
    }

    pub fn with_ai(mut self, enabled: bool) -> Self {
        self.use_ai = enabled;
        self
    }

    /// 本章应切分的片段数
    pub fn desired_count(&self, chapter: &ChapterText) -> usize {
        desired_segment_count(chapter.char_count(), &self.config)
    }

    /// 切分章节，返回恰好 desired_count 个片段
    ///
    /// 生成服务的结果只要数量不符或含空片段就整体丢弃，不做部分合并。
    pub async fn segment(&self, chapter_text: &str, desired_count: usize) -> Vec<Segment> {
        if desired_count == 0 {
            return Vec::new();
        }

        if self.use_ai {
            if let Some(segments) = self.segment_with_llm(chapter_text, desired_count).await {
                return segments;
            }
        }

        segment_fallback(chapter_text, desired_count, &self.config)
    }

    async fn segment_with_llm(&self, chapter_text: &str, desired_count: usize) -> Option<Vec<Segment>> {
        let prompt = segmentation_prompt(chapter_text, desired_count, &self.config);
        let response =
            match complete_with_timeout(self.llm.as_ref(), GenerationRequest::new(prompt), self.timeout)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(error = %e, "Segmentation call failed, using fallback");
                    return None;
                }
            };

        let pieces = extract_numbered_pieces(&response);
        if pieces.len() != desired_count || pieces.iter().any(|p| p.is_empty()) {
            tracing::debug!(
                expected = desired_count,
                actual = pieces.len(),
                "Segmentation shape mismatch, using fallback"
            );
            return None;
        }

        Some(
            pieces
                .into_iter()
                .enumerate()
                .map(|(index, text)| Segment::new(index, text))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::llm::{ScriptedLlmClient, ScriptedReply};

    fn segmenter(llm: ScriptedLlmClient) -> Segmenter {
        Segmenter::new(Arc::new(llm), SegmenterConfig::default(), Duration::from_millis(50))
    }

    const TEXT: &str = "少年望着石碑。手掌被指甲刺破了。周围传来嘲笑声。他没有回头。夜里他独自坐在屋顶。月光很冷。";

    #[tokio::test]
    async fn test_uses_llm_pieces_when_count_matches() {
        let reply = "[1] 少年望着石碑。\n[2] 手掌被指甲刺破了。\n[3] 周围传来嘲笑声。\n[4] 他没有回头。\n[5] 夜里他独自坐在屋顶。月光很冷。";
        let segments = segmenter(ScriptedLlmClient::with_replies(vec![ScriptedReply::Text(
            reply.into(),
        )]))
        .segment(TEXT, 5)
        .await;

        assert_eq!(segments.len(), 5);
        assert_eq!(segments[3].text, "他没有回头。");
    }

    #[tokio::test]
    async fn test_count_mismatch_discards_llm_result() {
        let reply = "[1] 少年望着石碑。\n[2] 其余全部内容。";
        let segments = segmenter(ScriptedLlmClient::with_replies(vec![ScriptedReply::Text(
            reply.into(),
        )]))
        .segment(TEXT, 5)
        .await;

        assert_eq!(segments, segment_fallback(TEXT, 5, &SegmenterConfig::default()));
    }

    #[tokio::test]
    async fn test_failure_and_timeout_fall_back() {
        let expected = segment_fallback(TEXT, 5, &SegmenterConfig::default());

        let failing = segmenter(ScriptedLlmClient::with_replies(vec![ScriptedReply::Fail(
            "503".into(),
        )]));
        assert_eq!(failing.segment(TEXT, 5).await, expected);

        let hanging = segmenter(ScriptedLlmClient::with_replies(vec![ScriptedReply::Hang]));
        assert_eq!(hanging.segment(TEXT, 5).await, expected);
    }

    #[tokio::test]
    async fn test_disabled_ai_never_calls_service() {
        let llm = Arc::new(ScriptedLlmClient::new());
        let segmenter = Segmenter::new(llm.clone(), SegmenterConfig::default(), Duration::from_secs(1))
            .with_ai(false);

        assert_eq!(segmenter.segment(TEXT, 5).await.len(), 5);
        assert!(llm.prompts().await.is_empty());
    }

    #[test]
    fn test_desired_count_has_floor_of_five() {
        let segmenter = segmenter(ScriptedLlmClient::new());
        let chapter = ChapterText::new(1, "短章", "一句话。").unwrap();
        assert_eq!(segmenter.desired_count(&chapter), 5);
    }
}
