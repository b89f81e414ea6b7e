//! Script Store Port - 剧本文档持久化抽象
//!
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::script::{NovelId, ScriptDocument};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Script Store Port
#[async_trait]
pub trait ScriptStorePort: Send + Sync {
    /// 读取小说已有的全部剧本文档（按章节号升序）
    async fn load_existing_scripts(
        &self,
        novel_id: &NovelId,
    ) -> Result<Vec<ScriptDocument>, RepositoryError>;

    /// 以给定文档集合整体替换小说的剧本
    async fn save_scripts(
        &self,
        novel_id: &NovelId,
        documents: &[ScriptDocument],
    ) -> Result<(), RepositoryError>;
}
