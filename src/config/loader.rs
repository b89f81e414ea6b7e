//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `SCRIPTOR_SERVER__PORT=8080`
/// - `SCRIPTOR_LLM__BASE_URL=http://llm:8000`
/// - `SCRIPTOR_LLM__API_KEY=sk-...`
/// - `SCRIPTOR_PIPELINE__USE_AI_SEGMENTATION=false`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("llm.base_url", "http://localhost:8000")?
        .set_default("llm.model", "default")?
        .set_default("llm.timeout_secs", 120)?
        .set_default("llm.temperature", 0.7)?
        .set_default("pipeline.segment_min_chars", 50)?
        .set_default("pipeline.segment_target_chars", 55)?
        .set_default("pipeline.segment_max_chars", 60)?
        .set_default("pipeline.narration_min_chars", 20)?
        .set_default("pipeline.narration_max_chars", 22)?
        .set_default("pipeline.min_scene_count", 5)?
        .set_default("pipeline.narration_timeout_secs", 30)?
        .set_default("pipeline.segmentation_timeout_secs", 60)?
        .set_default("pipeline.scene_timeout_secs", 120)?
        .set_default("pipeline.credit_feature_key", "script_generation")?
        .set_default("pipeline.credit_cost", 1)?
        .set_default("pipeline.use_ai_segmentation", true)?
        .set_default("database.path", "data/scriptor.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），前缀 SCRIPTOR_，层级分隔符 __
    builder = builder.add_source(
        Environment::with_prefix("SCRIPTOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    if config.llm.base_url.trim().is_empty() {
        return Err(invalid("LLM base URL cannot be empty"));
    }

    if config.database.path.is_empty() {
        return Err(invalid("Database path cannot be empty"));
    }

    let p = &config.pipeline;
    if p.segment_min_chars == 0
        || p.segment_min_chars > p.segment_target_chars
        || p.segment_target_chars > p.segment_max_chars
    {
        return Err(invalid("Segment bands must satisfy 0 < min <= target <= max"));
    }

    if p.narration_min_chars == 0 || p.narration_min_chars > p.narration_max_chars {
        return Err(invalid("Narration bands must satisfy 0 < min <= max"));
    }

    if p.min_scene_count == 0 {
        return Err(invalid("Minimum scene count cannot be 0"));
    }

    if config.llm.timeout_secs == 0
        || p.narration_timeout_secs == 0
        || p.segmentation_timeout_secs == 0
        || p.scene_timeout_secs == 0
    {
        return Err(invalid("Timeouts cannot be 0"));
    }

    if p.credit_feature_key.trim().is_empty() {
        return Err(invalid("Credit feature key cannot be empty"));
    }

    if p.credit_cost < 0 {
        return Err(invalid("Credit cost cannot be negative"));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("LLM: {} (model {})", config.llm.base_url, config.llm.model);
    tracing::info!("LLM Timeout: {}s", config.llm.timeout_secs);
    tracing::info!(
        "Segment Band: {}~{} (target {}), min scenes {}",
        config.pipeline.segment_min_chars,
        config.pipeline.segment_max_chars,
        config.pipeline.segment_target_chars,
        config.pipeline.min_scene_count
    );
    tracing::info!(
        "Narration Band: {}~{}",
        config.pipeline.narration_min_chars,
        config.pipeline.narration_max_chars
    );
    tracing::info!("AI Segmentation: {}", config.pipeline.use_ai_segmentation);
    tracing::info!(
        "Credit: {} x{}",
        config.pipeline.credit_feature_key,
        config.pipeline.credit_cost
    );
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
