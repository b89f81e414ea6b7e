//! Generative Text Port - 文本生成服务抽象
//!
//! 生成服务以流的形式返回文本片段，调用方累积为完整字符串。
//! 具体实现在 infrastructure/adapters 层

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use thiserror::Error;

/// 生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// 生成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// 流式文本块
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Generative Text Port
#[async_trait]
pub trait GenerativeTextPort: Send + Sync {
    /// 发起生成请求，返回文本块流
    async fn stream(&self, request: GenerationRequest) -> Result<TextStream, GenerationError>;

    /// 累积整个流为最终文本
    async fn complete(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let mut stream = self.stream(request).await?;
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            text.push_str(&chunk?);
        }
        Ok(text)
    }
}

/// 带超时的生成调用
///
/// 超时后丢弃进行中的请求（即取消），返回 `GenerationError::Timeout`。
pub async fn complete_with_timeout(
    port: &dyn GenerativeTextPort,
    request: GenerationRequest,
    timeout: Duration,
) -> Result<String, GenerationError> {
    tokio::time::timeout(timeout, port.complete(request))
        .await
        .map_err(|_| GenerationError::Timeout)?
}
