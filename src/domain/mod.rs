//! Domain Layer - 领域层
//!
//! - Script Context: 章节、片段、旁白、场景剧本
//! - 文本分割器、旁白切分、生成指令与结果解析（纯函数）

pub mod narration;
pub mod prompts;
pub mod script;

mod text_segmenter;

pub use text_segmenter::{
    desired_segment_count, redistribute_leftovers, segment_fallback, split_sentences,
    SegmenterConfig,
};
