//! 旁白合成：一次调用覆盖全部片段

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{complete_with_timeout, GenerationRequest, GenerativeTextPort};
use crate::domain::narration::{fallback_units, units_from_response, NarrationConfig};
use crate::domain::prompts::narration_prompt;
use crate::domain::script::{NarrationUnit, Segment};

pub struct NarrationSynthesizer {
    llm: Arc<dyn GenerativeTextPort>,
    config: NarrationConfig,
    timeout: Duration,
}

impl NarrationSynthesizer {
    pub fn new(llm: Arc<dyn GenerativeTextPort>, config: NarrationConfig, timeout: Duration) -> Self {
        Self {
            llm,
            config,
            timeout,
        }
    }

    /// 为每个片段生成一条旁白，数量与顺序与输入一致
    ///
    /// 调用失败、超时或结果未通过校验时，整体改用片段原文截取的兜底旁白。
    pub async fn synthesize(&self, segments: &[Segment]) -> Vec<NarrationUnit> {
        if segments.is_empty() {
            return Vec::new();
        }

        let prompt = narration_prompt(segments, &self.config);
        let raw =
            match complete_with_timeout(self.llm.as_ref(), GenerationRequest::new(prompt), self.timeout)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(
                        segments = segments.len(),
                        error = %e,
                        "Narration call failed, using fallback"
                    );
                    return fallback_units(segments, &self.config);
                }
            };

        match units_from_response(&raw, segments, &self.config) {
            Ok(units) => units,
            Err(e) => {
                tracing::warn!(error = %e, "Narration rejected, using fallback");
                fallback_units(segments, &self.config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::llm::{ScriptedLlmClient, ScriptedReply};

    fn segments(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| Segment::new(i, format!("第{}段，少年在广场上望着测验石碑，周围的人群议论纷纷。", i)))
            .collect()
    }

    fn synthesizer(reply: ScriptedReply, timeout: Duration) -> NarrationSynthesizer {
        NarrationSynthesizer::new(
            Arc::new(ScriptedLlmClient::with_replies(vec![reply])),
            NarrationConfig::default(),
            timeout,
        )
    }

    fn assert_in_band(units: &[NarrationUnit], n: usize) {
        assert_eq!(units.len(), n);
        for (i, unit) in units.iter().enumerate() {
            assert_eq!(unit.segment_index, i);
            assert!((20..=22).contains(&unit.char_count()), "unit {} = {:?}", i, unit.text);
        }
    }

    #[tokio::test]
    async fn test_oversized_response_is_trimmed_and_split() {
        let raw = "他站在石碑前，沉默良久，终于转身离开，".repeat(16);
        let units = synthesizer(ScriptedReply::Text(raw), Duration::from_secs(1))
            .synthesize(&segments(10))
            .await;
        assert_in_band(&units, 10);
    }

    #[tokio::test]
    async fn test_streamed_chunks_are_accumulated() {
        let chunks = vec!["他站在石碑前，".to_string(); 30];
        let units = synthesizer(ScriptedReply::Chunks(chunks), Duration::from_secs(1))
            .synthesize(&segments(6))
            .await;
        assert_in_band(&units, 6);
    }

    #[tokio::test]
    async fn test_timeout_uses_segment_prefixes() {
        let segs = segments(4);
        let units = synthesizer(ScriptedReply::Hang, Duration::from_millis(20))
            .synthesize(&segs)
            .await;

        assert_in_band(&units, 4);
        let expected: String = segs[2].text.chars().take(21).collect();
        assert_eq!(units[2].text, expected);
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let units = synthesizer(ScriptedReply::Fail("boom".into()), Duration::from_secs(1))
            .synthesize(&segments(3))
            .await;
        assert_in_band(&units, 3);
    }

    #[tokio::test]
    async fn test_no_segments_skips_call() {
        let llm = Arc::new(ScriptedLlmClient::new());
        let synthesizer =
            NarrationSynthesizer::new(llm.clone(), NarrationConfig::default(), Duration::from_secs(1));
        assert!(synthesizer.synthesize(&[]).await.is_empty());
        assert!(llm.prompts().await.is_empty());
    }
}
