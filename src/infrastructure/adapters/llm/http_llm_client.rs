//! HTTP LLM Client - 调用外部文本生成服务
//!
//! 实现 GenerativeTextPort trait，走 OpenAI 兼容接口并开启流式返回
//!
//! 外部 API:
//! POST {base_url}/v1/chat/completions
//! Request: {"model": "...", "messages": [{"role": "user", "content": "..."}], "stream": true}
//! Response: text/event-stream，每行 `data: {"choices":[{"delta":{"content":"..."}}]}`，以 `data: [DONE]` 结束

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    GenerationError, GenerationRequest, GenerativeTextPort, TextStream,
};

/// Chat 请求体
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// 流式增量
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// 非流式完整响应（服务端忽略 stream 参数时）
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP LLM 客户端配置
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// Bearer token
    pub api_key: Option<String>,
    /// 模型名称
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            model: "default".to_string(),
            timeout_secs: 120,
            temperature: 0.7,
        }
    }
}

impl HttpLlmClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP LLM 客户端
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    /// 创建新的 HTTP LLM 客户端
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl GenerativeTextPort for HttpLlmClient {
    async fn stream(&self, request: GenerationRequest) -> Result<TextStream, GenerationError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            stream: true,
            temperature: self.config.temperature,
        };

        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            prompt_chars = request.prompt.chars().count(),
            "Sending generation request"
        );

        let mut builder = self.client.post(self.completions_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else if e.is_connect() {
                GenerationError::Network(format!("Cannot connect to generation service: {}", e))
            } else {
                GenerationError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let is_event_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/event-stream"))
            .unwrap_or(false);

        if !is_event_stream {
            let completion: ChatCompletion = response
                .json()
                .await
                .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
            let text = completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| GenerationError::InvalidResponse("missing choices".to_string()))?;
            return Ok(Box::pin(futures_util::stream::iter(vec![Ok(text)])));
        }

        Ok(Box::pin(decode_sse(response.bytes_stream())))
    }
}

/// 把字节流解码为文本增量流
///
/// 末尾追加一个 None，用来冲刷缓冲区中没有换行结尾的最后一行。
fn decode_sse<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, GenerationError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    bytes
        .map(Some)
        .chain(futures_util::stream::once(futures_util::future::ready(None)))
        .scan(SseDecoder::default(), |decoder, chunk| {
            let items = match chunk {
                Some(Ok(bytes)) => decoder.push(bytes.as_ref()),
                Some(Err(e)) => vec![Err(GenerationError::Stream(e.to_string()))],
                None => decoder.finish(),
            };
            futures_util::future::ready(Some(items))
        })
        .flat_map(futures_util::stream::iter)
}

/// Server-Sent Events 增量解码器
///
/// 以字节缓冲按行切分，避免多字节字符被网络分包截断。
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, GenerationError>> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut items = Vec::new();
        while !self.done {
            let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.decode_line(&line, &mut items);
        }
        items
    }

    /// 流结束时处理缓冲区中剩余的不完整行
    fn finish(&mut self) -> Vec<Result<String, GenerationError>> {
        let mut items = Vec::new();
        if !self.done && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.decode_line(&line, &mut items);
        }
        self.done = true;
        items
    }

    fn decode_line(&mut self, line: &[u8], items: &mut Vec<Result<String, GenerationError>>) {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line.trim(),
            Err(e) => {
                items.push(Err(GenerationError::Stream(format!("Invalid UTF-8: {}", e))));
                return;
            }
        };

        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data == "[DONE]" {
            self.done = true;
            self.buffer.clear();
            return;
        }

        match serde_json::from_str::<ChatChunk>(data) {
            Ok(chunk) => {
                let content: String = chunk
                    .choices
                    .into_iter()
                    .filter_map(|c| c.delta.and_then(|d| d.content))
                    .collect();
                if !content.is_empty() {
                    items.push(Ok(content));
                }
            }
            Err(e) => items.push(Err(GenerationError::InvalidResponse(format!(
                "Failed to parse chunk: {}",
                e
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: Vec<Result<String, GenerationError>>) -> Vec<String> {
        items.into_iter().map(|i| i.unwrap()).collect()
    }

    #[test]
    fn test_config_builder() {
        let config = HttpLlmClientConfig::new("http://example.com:9000")
            .with_model("qwen")
            .with_timeout(60);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.model, "qwen");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let client = HttpLlmClient::new(HttpLlmClientConfig::new("http://llm:8000/")).unwrap();
        assert_eq!(client.completions_url(), "http://llm:8000/v1/chat/completions");
    }

    #[test]
    fn test_sse_decoder_yields_deltas() {
        let mut decoder = SseDecoder::default();
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"少年\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"转身\"}}]}\n\n\
                    data: [DONE]\n\n";
        assert_eq!(texts(decoder.push(body.as_bytes())), vec!["少年", "转身"]);
        assert!(decoder.push(b"data: {\"choices\":[]}\n").is_empty());
    }

    #[test]
    fn test_sse_decoder_handles_split_multibyte_chars() {
        let mut decoder = SseDecoder::default();
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"石碑\"}}]}\n".as_bytes();
        // 在 "石" 的 UTF-8 编码中间切开
        let split = line.iter().position(|&b| b >= 0x80).unwrap() + 1;

        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(texts(decoder.push(&line[split..])), vec!["石碑"]);
    }

    #[test]
    fn test_sse_decoder_reports_bad_json() {
        let mut decoder = SseDecoder::default();
        let items = decoder.push(b"data: {not json}\n");
        assert!(matches!(items[0], Err(GenerationError::InvalidResponse(_))));
    }

    #[test]
    fn test_sse_decoder_flushes_unterminated_last_line() {
        let mut decoder = SseDecoder::default();
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"少年\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"转身\"}}]}";

        assert_eq!(texts(decoder.push(body.as_bytes())), vec!["少年"]);
        assert_eq!(texts(decoder.finish()), vec!["转身"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_sse_decoder_finish_after_done_is_empty() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert!(decoder.finish().is_empty());

        let mut decoder = SseDecoder::default();
        decoder.push(b"data: [DONE]\n");
        assert!(decoder.finish().is_empty());
    }

    #[tokio::test]
    async fn test_decode_sse_stream_without_trailing_newline() {
        let chunks: Vec<Result<&[u8], std::io::Error>> = vec![
            Ok(&b"data: {\"choices\":[{\"delta\":{\"content\":\"\xe5\xb0\x91\xe5\xb9\xb4\"}}]}\n\nda"[..]),
            Ok(&b"ta: {\"choices\":[{\"delta\":{\"content\":\"left\"}}]}"[..]),
        ];

        let items: Vec<_> = decode_sse(futures_util::stream::iter(chunks)).collect().await;
        assert_eq!(texts(items), vec!["少年", "left"]);
    }
}
