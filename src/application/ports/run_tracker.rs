//! Run Tracker Port - 生成中的小说登记表
//!
//! 同一小说同一时间只允许一个批次运行

use crate::domain::script::NovelId;

pub trait RunTrackerPort: Send + Sync {
    /// 登记开始运行，若已在运行返回 false
    fn try_begin(&self, novel_id: &NovelId) -> bool;

    /// 注销运行
    fn finish(&self, novel_id: &NovelId);

    fn is_running(&self, novel_id: &NovelId) -> bool;
}
