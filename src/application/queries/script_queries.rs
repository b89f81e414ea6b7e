//! Script Queries

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::script::{NovelId, SceneScript, ScriptDocument};

/// 获取小说的全部剧本
#[derive(Debug, Clone)]
pub struct GetScripts {
    pub novel_id: NovelId,
}

/// 剧本文档视图，附带派生的 full_text
#[derive(Debug, Clone, Serialize)]
pub struct ScriptDocumentView {
    pub chapter_number: u32,
    pub chapter_title: String,
    pub scenes: Vec<SceneScript>,
    pub full_text: String,
    pub failed_scenes: usize,
    pub generated_at: DateTime<Utc>,
}

impl From<ScriptDocument> for ScriptDocumentView {
    fn from(document: ScriptDocument) -> Self {
        let full_text = document.full_text();
        let failed_scenes = document.failed_scene_count();
        Self {
            chapter_number: document.chapter_number,
            chapter_title: document.chapter_title,
            scenes: document.scenes,
            full_text,
            failed_scenes,
            generated_at: document.generated_at,
        }
    }
}
