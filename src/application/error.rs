//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::domain::script::ScriptDocument;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 同一小说已有批次在运行
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 持久化失败，unsaved 为已生成但未保存的文档
    #[error("Persistence failed: {message}")]
    PersistenceFailed {
        message: String,
        unsaved: Vec<ScriptDocument>,
    },

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::application::ports::RepositoryError> for ApplicationError {
    fn from(err: crate::application::ports::RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<crate::domain::script::ScriptError> for ApplicationError {
    fn from(err: crate::domain::script::ScriptError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
