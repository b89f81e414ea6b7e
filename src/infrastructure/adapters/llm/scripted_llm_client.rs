//! Scripted LLM Client - 用于测试的生成客户端
//!
//! 按预设顺序回放响应，或按 prompt 内容即时构造响应，不访问网络

use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::Mutex;

use crate::application::ports::{
    GenerationError, GenerationRequest, GenerativeTextPort, TextStream,
};

/// 预设响应
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// 一次性返回完整文本
    Text(String),
    /// 分块返回
    Chunks(Vec<String>),
    /// 请求失败
    Fail(String),
    /// 永不结束（用于超时测试）
    Hang,
}

type Responder = Box<dyn Fn(&str) -> ScriptedReply + Send + Sync>;

/// Scripted LLM Client
///
/// 先消费回放队列，队列为空时交给 responder；两者都没有则返回服务错误。
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    responder: Option<Responder>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            responder: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 按顺序回放
    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::new()
        }
    }

    /// 根据 prompt 构造响应
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> ScriptedReply + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    pub async fn push_reply(&self, reply: ScriptedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// 已收到的全部 prompt（按调用顺序）
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

impl Default for ScriptedLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeTextPort for ScriptedLlmClient {
    async fn stream(&self, request: GenerationRequest) -> Result<TextStream, GenerationError> {
        self.prompts.lock().await.push(request.prompt.clone());

        let queued = self.replies.lock().await.pop_front();
        let reply = match (queued, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(&request.prompt),
            (None, None) => ScriptedReply::Fail("no scripted reply".to_string()),
        };

        tracing::debug!(reply = ?reply, "ScriptedLlmClient: replaying");

        match reply {
            ScriptedReply::Text(text) => Ok(Box::pin(stream::iter(vec![Ok(text)]))),
            ScriptedReply::Chunks(chunks) => {
                Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
            }
            ScriptedReply::Fail(message) => Err(GenerationError::Service(message)),
            ScriptedReply::Hang => Ok(Box::pin(stream::pending())),
        }
    }
}
