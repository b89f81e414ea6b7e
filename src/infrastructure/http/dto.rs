//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ScriptDocumentView;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Script DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChapterInput {
    pub number: u32,
    #[serde(default)]
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateScriptsRequest {
    pub novel_id: Uuid,
    pub user_id: String,
    pub chapters: Vec<ChapterInput>,
    /// 已有剧本的章节是否重新生成
    #[serde(default)]
    pub regenerate_existing: bool,
}

/// 立即返回，进度与结果通过 WS 通知
#[derive(Debug, Serialize)]
pub struct GenerateScriptsResponse {
    pub novel_id: Uuid,
    pub status: &'static str,
    pub chapters: usize,
}

#[derive(Debug, Deserialize)]
pub struct NovelScriptsRequest {
    pub novel_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ScriptListResponse {
    pub novel_id: Uuid,
    pub total: usize,
    pub documents: Vec<ScriptDocumentView>,
}

#[derive(Debug, Serialize)]
pub struct ScriptStatusResponse {
    pub novel_id: Uuid,
    pub running: bool,
}
