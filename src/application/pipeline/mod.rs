//! Script Pipeline - 章节 → 片段 → 旁白 → 场景剧本
//!
//! - Segmenter: 生成服务分段，失败或数量不符时走确定性兜底
//! - NarrationSynthesizer: 一次调用生成全部旁白，再切分为等长单元
//! - SceneScriptGenerator: 每个片段一次调用，失败记为占位场景
//! - ChapterPipeline: 单章状态机（积分校验在所有生成调用之前）
//! - BatchController: 多章批次，合并已有剧本并持久化

mod batch;
mod chapter;
mod narration;
mod scene;
mod segmenter;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use crate::domain::narration::NarrationConfig;
use crate::domain::SegmenterConfig;

pub use batch::{BatchController, BatchOutcome, BatchReport, BatchRequest};
pub use chapter::{ChapterPipeline, PipelineError};
pub use narration::NarrationSynthesizer;
pub use scene::SceneScriptGenerator;
pub use segmenter::Segmenter;

/// 流水线参数
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub segmenter: SegmenterConfig,
    pub narration: NarrationConfig,
    pub segmentation_timeout: Duration,
    pub narration_timeout: Duration,
    pub scene_timeout: Duration,
    /// 积分扣减使用的功能标识
    pub credit_feature_key: String,
    /// 关闭后直接使用确定性分段
    pub use_ai_segmentation: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            narration: NarrationConfig::default(),
            segmentation_timeout: Duration::from_secs(60),
            narration_timeout: Duration::from_secs(30),
            scene_timeout: Duration::from_secs(120),
            credit_feature_key: "script_generation".to_string(),
            use_ai_segmentation: true,
        }
    }
}
