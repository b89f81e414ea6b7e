//! 场景剧本生成：每个片段一次调用

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{complete_with_timeout, GenerationRequest, GenerativeTextPort};
use crate::domain::prompts::{detect_shot_type, extract_scene_title, scene_prompt};
use crate::domain::script::{ChapterText, NarrationUnit, SceneScript, Segment};

pub struct SceneScriptGenerator {
    llm: Arc<dyn GenerativeTextPort>,
    timeout: Duration,
}

impl SceneScriptGenerator {
    pub fn new(llm: Arc<dyn GenerativeTextPort>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// 生成单个场景，失败时返回占位场景而不是错误
    pub async fn generate_scene(
        &self,
        segment: &Segment,
        narration: &NarrationUnit,
        chapter: &ChapterText,
    ) -> SceneScript {
        let prompt = scene_prompt(chapter, segment, narration);
        let result =
            complete_with_timeout(self.llm.as_ref(), GenerationRequest::new(prompt), self.timeout).await;

        match result {
            Ok(body) if !body.trim().is_empty() => {
                let body = body.trim().to_string();
                let title = extract_scene_title(&body)
                    .unwrap_or_else(|| SceneScript::default_title(segment.index));
                let shot = detect_shot_type(&body);
                SceneScript::success(segment.index, title, body, shot)
            }
            Ok(_) => {
                tracing::warn!(
                    chapter = chapter.number,
                    segment = segment.index,
                    "Scene generation returned empty text"
                );
                SceneScript::failed(segment.index, "empty response")
            }
            Err(e) => {
                tracing::warn!(
                    chapter = chapter.number,
                    segment = segment.index,
                    error = %e,
                    "Scene generation failed"
                );
                SceneScript::failed(segment.index, &e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{SceneStatus, ShotType};
    use crate::infrastructure::adapters::llm::{ScriptedLlmClient, ScriptedReply};

    async fn generate(reply: ScriptedReply) -> SceneScript {
        let generator = SceneScriptGenerator::new(
            Arc::new(ScriptedLlmClient::with_replies(vec![reply])),
            Duration::from_millis(50),
        );
        let chapter = ChapterText::new(2, "退婚", "少年站在大厅中央。").unwrap();
        generator
            .generate_scene(
                &Segment::new(2, "少年站在大厅中央。"),
                &NarrationUnit::new(2, "他站在大厅中央，神情平静，没有开口"),
                &chapter,
            )
            .await
    }

    #[tokio::test]
    async fn test_extracts_title_and_shot() {
        let scene = generate(ScriptedReply::Text(
            "\n[SCENE 3: 大厅对峙]\nMedium shot: 少年立于大厅中央\n".into(),
        ))
        .await;

        assert_eq!(scene.status, SceneStatus::Success);
        assert_eq!(scene.title, "大厅对峙");
        assert_eq!(scene.shot, Some(ShotType::Medium));
        assert!(scene.body.starts_with("[SCENE 3"));
    }

    #[tokio::test]
    async fn test_missing_header_defaults_title() {
        let scene = generate(ScriptedReply::Text("Close-up: 少年的眼睛".into())).await;
        assert_eq!(scene.title, "Scene 3");
        assert_eq!(scene.status, SceneStatus::Success);
    }

    #[tokio::test]
    async fn test_error_yields_failed_placeholder() {
        let scene = generate(ScriptedReply::Fail("HTTP 500".into())).await;
        assert!(scene.is_failed());
        assert!(scene.body.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_empty_and_hanging_responses_fail() {
        assert!(generate(ScriptedReply::Text("  \n ".into())).await.is_failed());
        assert!(generate(ScriptedReply::Hang).await.is_failed());
    }
}
