//! Script Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("无效的章节: {0}")]
    InvalidChapter(String),

    #[error("无效的文本内容: {0}")]
    InvalidContent(String),

    #[error("旁白长度越界: 第 {index} 条为 {len} 字")]
    NarrationOutOfBand { index: usize, len: usize },

    #[error("旁白数量不匹配: 期望 {expected}，实际 {actual}")]
    NarrationCountMismatch { expected: usize, actual: usize },
}
