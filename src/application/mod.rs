//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（文本生成、积分、剧本存储、进度通知等）
//! - pipeline: 章节剧本流水线与批次控制
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{GenerateScriptsHandler, RunTicket},
    GenerateScripts,
};

pub use error::ApplicationError;

pub use pipeline::{
    BatchController, BatchOutcome, BatchReport, BatchRequest, ChapterPipeline, PipelineError,
    PipelineOptions,
};

pub use ports::{
    ChapterProgress, CreditError, CreditLedgerPort, DeductOutcome, GenerationError,
    GenerationRequest, GenerativeTextPort, ProgressSinkPort, RegenerationConfirmPort,
    RepositoryError, RunTrackerPort, ScriptStorePort,
};

pub use queries::{handlers::GetScriptsHandler, GetScripts, ScriptDocumentView};
