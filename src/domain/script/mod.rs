//! Script Context - 剧本限界上下文
//!
//! 职责:
//! - 章节原文、片段、旁白、场景等实体
//! - 单章剧本文档与按章节归档的剧本集合
//! - 单章流水线状态机

mod aggregate;
mod entities;
mod errors;
mod state;
mod value_objects;

pub use aggregate::ScriptSet;
pub use entities::{
    ChapterText, NarrationUnit, SceneScript, SceneStatus, ScriptDocument, Segment, ShotType,
    SCENE_SEPARATOR,
};
pub use errors::ScriptError;
pub use state::ChapterPhase;
pub use value_objects::{NovelId, UserId};
