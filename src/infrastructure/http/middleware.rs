//! HTTP Middleware
//!
//! 请求日志中间件：记录耗时，4xx/5xx 升级日志级别

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// 请求日志中间件
///
/// 业务错误（errno != 0）以 200 返回，在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::error!(method = %method, uri = %uri, status, elapsed_ms, "HTTP server error");
    } else if response.status().is_client_error() {
        tracing::warn!(method = %method, uri = %uri, status, elapsed_ms, "HTTP client error");
    } else {
        tracing::debug!(method = %method, uri = %uri, status, elapsed_ms, "HTTP request handled");
    }

    response
}
