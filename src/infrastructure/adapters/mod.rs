//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod confirm;
pub mod llm;

pub use confirm::StaticRegenerationConfirm;
pub use llm::*;
