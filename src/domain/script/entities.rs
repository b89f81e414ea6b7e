//! Script Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ScriptError;

/// 场景之间的分隔符（空行）
pub const SCENE_SEPARATOR: &str = "\n\n";

/// 章节原文 - 流水线的只读输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterText {
    pub number: u32,
    pub title: String,
    pub content: String,
}

impl ChapterText {
    pub fn new(
        number: u32,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ScriptError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ScriptError::InvalidContent(format!(
                "第 {} 章内容为空",
                number
            )));
        }
        Ok(Self {
            number,
            title: title.into(),
            content,
        })
    }

    /// 章节字符数（按 Unicode 字符计）
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// 文本片段
///
/// 不变量:
/// - index 从 0 开始，按章节顺序排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub text: String,
}

impl Segment {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 旁白单元，与片段一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationUnit {
    pub segment_index: usize,
    pub text: String,
}

impl NarrationUnit {
    pub fn new(segment_index: usize, text: impl Into<String>) -> Self {
        Self {
            segment_index,
            text: text.into(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 场景生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    Success,
    Failed,
}

impl SceneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Success => "success",
            SceneStatus::Failed => "failed",
        }
    }
}

/// 镜头类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    Wide,
    Medium,
    CloseUp,
}

/// 单个场景脚本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneScript {
    pub segment_index: usize,
    pub title: String,
    pub body: String,
    pub status: SceneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot: Option<ShotType>,
}

impl SceneScript {
    /// 场景编号（从 1 开始）
    pub fn scene_number(segment_index: usize) -> usize {
        segment_index + 1
    }

    /// 未能解析出标题时使用的默认标题
    pub fn default_title(segment_index: usize) -> String {
        format!("Scene {}", Self::scene_number(segment_index))
    }

    pub fn success(
        segment_index: usize,
        title: impl Into<String>,
        body: impl Into<String>,
        shot: Option<ShotType>,
    ) -> Self {
        Self {
            segment_index,
            title: title.into(),
            body: body.into(),
            status: SceneStatus::Success,
            shot,
        }
    }

    /// 生成失败的占位场景，body 非空
    pub fn failed(segment_index: usize, reason: &str) -> Self {
        let number = Self::scene_number(segment_index);
        Self {
            segment_index,
            title: Self::default_title(segment_index),
            body: format!(
                "[SCENE {}: Scene {}]\nScene generation failed: {}",
                number, number, reason
            ),
            status: SceneStatus::Failed,
            shot: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == SceneStatus::Failed
    }
}

/// 单章剧本文档
///
/// 不变量:
/// - scenes 按 segment_index 升序
/// - full_text 由 scenes 派生，不单独存储
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDocument {
    pub chapter_number: u32,
    pub chapter_title: String,
    pub scenes: Vec<SceneScript>,
    pub generated_at: DateTime<Utc>,
}

impl ScriptDocument {
    pub fn assemble(
        chapter_number: u32,
        chapter_title: impl Into<String>,
        mut scenes: Vec<SceneScript>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        scenes.sort_by_key(|s| s.segment_index);
        Self {
            chapter_number,
            chapter_title: chapter_title.into(),
            scenes,
            generated_at,
        }
    }

    /// 按顺序拼接所有场景 body，以空行分隔
    pub fn full_text(&self) -> String {
        self.scenes
            .iter()
            .map(|s| s.body.as_str())
            .collect::<Vec<_>>()
            .join(SCENE_SEPARATOR)
    }

    pub fn failed_scene_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.is_failed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_rejects_blank_content() {
        assert!(ChapterText::new(1, "第一章", " \n ").is_err());
        let chapter = ChapterText::new(1, "第一章", "少年抬起头。").unwrap();
        assert_eq!(chapter.char_count(), 6);
    }

    #[test]
    fn test_full_text_joins_bodies_in_order() {
        let scenes = vec![
            SceneScript::success(1, "B", "[SCENE 2: B]\nMedium shot", None),
            SceneScript::success(0, "A", "[SCENE 1: A]\nWide shot", None),
        ];
        let doc = ScriptDocument::assemble(3, "第三章", scenes, Utc::now());

        assert_eq!(doc.scenes[0].segment_index, 0);
        assert_eq!(
            doc.full_text(),
            "[SCENE 1: A]\nWide shot\n\n[SCENE 2: B]\nMedium shot"
        );
    }

    #[test]
    fn test_failed_scene_has_placeholder() {
        let scene = SceneScript::failed(4, "timeout");
        assert!(scene.is_failed());
        assert_eq!(scene.title, "Scene 5");
        assert!(scene.body.contains("failed"));
        assert!(!scene.body.is_empty());
    }

    #[test]
    fn test_empty_document_full_text() {
        let doc = ScriptDocument::assemble(1, "t", Vec::new(), Utc::now());
        assert_eq!(doc.full_text(), "");
        assert_eq!(doc.failed_scene_count(), 0);
    }
}
