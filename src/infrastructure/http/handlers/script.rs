//! Script HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GenerateScripts, GetScripts};
use crate::domain::script::{ChapterText, NovelId, UserId};
use crate::infrastructure::adapters::StaticRegenerationConfirm;
use crate::infrastructure::http::dto::{
    ApiResponse, GenerateScriptsRequest, GenerateScriptsResponse, NovelScriptsRequest,
    ScriptListResponse, ScriptStatusResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 生成剧本（后台运行，立即返回，进度通过 WS 通知）
pub async fn generate_scripts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateScriptsRequest>,
) -> Result<Json<ApiResponse<GenerateScriptsResponse>>, ApiError> {
    if req.chapters.is_empty() {
        return Err(ApiError::BadRequest("chapters must not be empty".to_string()));
    }

    let user_id = UserId::new(req.user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let chapters = req
        .chapters
        .into_iter()
        .map(|c| {
            let title = if c.title.trim().is_empty() {
                format!("第{}章", c.number)
            } else {
                c.title
            };
            ChapterText::new(c.number, title, c.content)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let novel_id = NovelId::from_uuid(req.novel_id);
    let chapter_count = chapters.len();
    let ticket = state.generate_scripts_handler.start(&novel_id)?;

    let command = GenerateScripts {
        novel_id,
        user_id,
        chapters,
    };
    let confirm = StaticRegenerationConfirm::new(req.regenerate_existing);
    let handler = state.generate_scripts_handler.clone();

    tokio::spawn(async move {
        match handler.execute(ticket, command, &confirm).await {
            Ok(report) => {
                tracing::info!(
                    novel_id = %novel_id,
                    outcome = %report.outcome.summary(),
                    persisted = report.persisted,
                    "Background script generation finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    novel_id = %novel_id,
                    error = %e,
                    "Background script generation failed"
                );
            }
        }
    });

    tracing::info!(
        novel_id = %novel_id,
        chapters = chapter_count,
        regenerate_existing = req.regenerate_existing,
        "Script generation started"
    );

    Ok(Json(ApiResponse::success(GenerateScriptsResponse {
        novel_id: req.novel_id,
        status: "running",
        chapters: chapter_count,
    })))
}

/// 列出小说的剧本
pub async fn list_scripts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelScriptsRequest>,
) -> Result<Json<ApiResponse<ScriptListResponse>>, ApiError> {
    let documents = state
        .get_scripts_handler
        .handle(GetScripts {
            novel_id: NovelId::from_uuid(req.novel_id),
        })
        .await?;

    Ok(Json(ApiResponse::success(ScriptListResponse {
        novel_id: req.novel_id,
        total: documents.len(),
        documents,
    })))
}

/// 查询小说是否正在生成
pub async fn script_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NovelScriptsRequest>,
) -> Json<ApiResponse<ScriptStatusResponse>> {
    let running = state
        .generate_scripts_handler
        .is_running(&NovelId::from_uuid(req.novel_id));

    Json(ApiResponse::success(ScriptStatusResponse {
        novel_id: req.novel_id,
        running,
    }))
}
