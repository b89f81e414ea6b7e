//! Memory Layer - In-Memory State Management
//!
//! 记录正在生成剧本的小说

mod run_tracker;

pub use run_tracker::InMemoryRunTracker;
