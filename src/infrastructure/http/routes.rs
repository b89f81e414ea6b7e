//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/script/generate   POST  生成剧本（后台运行，通过 WS 通知进度）
//! - /api/script/list       POST  获取小说的全部剧本
//! - /api/script/status     POST  查询小说是否正在生成
//! - /ws/events             WS    全局 WebSocket（生成进度事件，可按 novel_id 过滤）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/script", script_routes())
}

/// Script 路由
fn script_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(handlers::generate_scripts))
        .route("/list", post(handlers::list_scripts))
        .route("/status", post(handlers::script_status))
}
