//! Scriptor - 小说章节分镜剧本生成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Script Context: 章节、片段、旁白、场景与剧本集合
//! - 文本分割、旁白校验、指令与结果解析
//!
//! 应用层 (application/):
//! - Ports: 端口定义（GenerativeText, CreditLedger, ScriptStore, ProgressSink, RunTracker）
//! - Pipeline: 单章流水线与批量控制器
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Adapters: 流式 LLM 客户端
//! - Persistence: SQLite 剧本存储与积分账本
//! - Memory: 运行中批次登记
//! - Events: 进度事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
