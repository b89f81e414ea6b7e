//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::PipelineOptions;
use crate::domain::narration::NarrationConfig;
use crate::domain::SegmenterConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 文本生成服务配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 文本生成服务配置（OpenAI 兼容接口）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// 服务基础 URL
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// 单次请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_llm_model() -> String {
    "default".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            temperature: default_temperature(),
        }
    }
}

/// 流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_segment_min")]
    pub segment_min_chars: usize,

    #[serde(default = "default_segment_target")]
    pub segment_target_chars: usize,

    #[serde(default = "default_segment_max")]
    pub segment_max_chars: usize,

    #[serde(default = "default_narration_min")]
    pub narration_min_chars: usize,

    #[serde(default = "default_narration_max")]
    pub narration_max_chars: usize,

    /// 每章最少场景数
    #[serde(default = "default_min_scene_count")]
    pub min_scene_count: usize,

    #[serde(default = "default_narration_timeout")]
    pub narration_timeout_secs: u64,

    #[serde(default = "default_segmentation_timeout")]
    pub segmentation_timeout_secs: u64,

    #[serde(default = "default_scene_timeout")]
    pub scene_timeout_secs: u64,

    /// 积分扣减使用的功能标识
    #[serde(default = "default_feature_key")]
    pub credit_feature_key: String,

    /// 每章扣减的积分
    #[serde(default = "default_credit_cost")]
    pub credit_cost: i64,

    #[serde(default = "default_use_ai_segmentation")]
    pub use_ai_segmentation: bool,
}

fn default_segment_min() -> usize {
    50
}

fn default_segment_target() -> usize {
    55
}

fn default_segment_max() -> usize {
    60
}

fn default_narration_min() -> usize {
    20
}

fn default_narration_max() -> usize {
    22
}

fn default_min_scene_count() -> usize {
    5
}

fn default_narration_timeout() -> u64 {
    30
}

fn default_segmentation_timeout() -> u64 {
    60
}

fn default_scene_timeout() -> u64 {
    120
}

fn default_feature_key() -> String {
    "script_generation".to_string()
}

fn default_credit_cost() -> i64 {
    1
}

fn default_use_ai_segmentation() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_min_chars: default_segment_min(),
            segment_target_chars: default_segment_target(),
            segment_max_chars: default_segment_max(),
            narration_min_chars: default_narration_min(),
            narration_max_chars: default_narration_max(),
            min_scene_count: default_min_scene_count(),
            narration_timeout_secs: default_narration_timeout(),
            segmentation_timeout_secs: default_segmentation_timeout(),
            scene_timeout_secs: default_scene_timeout(),
            credit_feature_key: default_feature_key(),
            credit_cost: default_credit_cost(),
            use_ai_segmentation: default_use_ai_segmentation(),
        }
    }
}

impl PipelineConfig {
    /// 转换为流水线参数
    pub fn to_options(&self) -> PipelineOptions {
        PipelineOptions {
            segmenter: SegmenterConfig {
                min_chars: self.segment_min_chars,
                target_chars: self.segment_target_chars,
                max_chars: self.segment_max_chars,
                min_segments: self.min_scene_count,
            },
            narration: NarrationConfig {
                min_chars: self.narration_min_chars,
                max_chars: self.narration_max_chars,
                // 兜底旁白取区间中值
                fallback_chars: (self.narration_min_chars + self.narration_max_chars) / 2,
                ..NarrationConfig::default()
            },
            segmentation_timeout: Duration::from_secs(self.segmentation_timeout_secs),
            narration_timeout: Duration::from_secs(self.narration_timeout_secs),
            scene_timeout: Duration::from_secs(self.scene_timeout_secs),
            credit_feature_key: self.credit_feature_key.clone(),
            use_ai_segmentation: self.use_ai_segmentation,
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/scriptor.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
