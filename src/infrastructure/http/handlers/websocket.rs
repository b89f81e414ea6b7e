//! WebSocket Handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::infrastructure::events::ScriptEvent;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventFilter {
    /// 只接收该小说的事件
    pub novel_id: Option<Uuid>,
}

/// 全局 WebSocket 连接处理（剧本生成进度）
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    Query(filter): Query<EventFilter>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, filter, state))
}

fn event_novel_id(event: &ScriptEvent) -> Uuid {
    let novel_id = match event {
        ScriptEvent::ChapterProgress { novel_id, .. }
        | ScriptEvent::ChapterAssembled { novel_id, .. }
        | ScriptEvent::BatchProgress { novel_id, .. }
        | ScriptEvent::BatchFinished { novel_id, .. }
        | ScriptEvent::BatchFailed { novel_id, .. } => novel_id,
    };
    *novel_id.as_uuid()
}

async fn handle_global_socket(socket: WebSocket, filter: EventFilter, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut event_rx = state.event_publisher.subscribe_global();

    tracing::info!(novel_id = ?filter.novel_id, "Global WebSocket connected");

    // 事件转发任务
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Global WebSocket lagged behind");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };

            if let Some(wanted) = filter.novel_id {
                if event_novel_id(&event) != wanted {
                    continue;
                }
            }

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send global WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Global WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Global WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!("Global WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::NovelId;

    #[test]
    fn test_event_novel_id() {
        let novel_id = NovelId::new();
        let event = ScriptEvent::BatchFinished {
            novel_id,
            summary: "completed".into(),
        };
        assert_eq!(event_novel_id(&event), *novel_id.as_uuid());
    }
}
