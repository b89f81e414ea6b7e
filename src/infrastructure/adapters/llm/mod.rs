//! LLM Adapter - 文本生成客户端实现

mod http_llm_client;
mod scripted_llm_client;

pub use http_llm_client::{HttpLlmClient, HttpLlmClientConfig};
pub use scripted_llm_client::{ScriptedLlmClient, ScriptedReply};
