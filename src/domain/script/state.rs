//! Script Context - 单章流水线状态机

use serde::{Deserialize, Serialize};

/// 单章处理阶段
///
/// PENDING → CREDIT_CHECK → SEGMENTING → NARRATING → SCENE_LOOP(i) → ASSEMBLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ChapterPhase {
    Pending,
    CreditCheck,
    Segmenting,
    Narrating,
    SceneLoop { index: usize, total: usize },
    Assembled,
}

impl ChapterPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterPhase::Pending => "pending",
            ChapterPhase::CreditCheck => "credit_check",
            ChapterPhase::Segmenting => "segmenting",
            ChapterPhase::Narrating => "narrating",
            ChapterPhase::SceneLoop { .. } => "scene_loop",
            ChapterPhase::Assembled => "assembled",
        }
    }

    /// 阶段对应的章节内进度百分比
    pub fn percent(&self) -> u8 {
        match self {
            ChapterPhase::Pending => 0,
            ChapterPhase::CreditCheck => 5,
            ChapterPhase::Segmenting => 10,
            ChapterPhase::Narrating => 25,
            ChapterPhase::SceneLoop { index, total } => {
                let total = (*total).max(1);
                (30 + 65 * index / total).min(95) as u8
            }
            ChapterPhase::Assembled => 100,
        }
    }

    /// 检查状态迁移是否合法
    pub fn can_transition_to(&self, next: &ChapterPhase) -> bool {
        use ChapterPhase::*;
        match (self, next) {
            (Pending, CreditCheck) => true,
            (CreditCheck, Segmenting) => true,
            (Segmenting, Narrating) => true,
            (Narrating, SceneLoop { index: 0, total }) => *total > 0,
            (Narrating, Assembled) => true,
            (SceneLoop { index, total }, SceneLoop { index: next_index, total: next_total }) => {
                total == next_total && *next_index == index + 1 && *next_index < *total
            }
            (SceneLoop { index, total }, Assembled) => index + 1 == *total,
            _ => false,
        }
    }
}

impl std::fmt::Display for ChapterPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChapterPhase::SceneLoop { index, total } => {
                write!(f, "scene_loop({}/{})", index + 1, total)
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            ChapterPhase::Pending,
            ChapterPhase::CreditCheck,
            ChapterPhase::Segmenting,
            ChapterPhase::Narrating,
            ChapterPhase::SceneLoop { index: 0, total: 2 },
            ChapterPhase::SceneLoop { index: 1, total: 2 },
            ChapterPhase::Assembled,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_rejects_skipping_phases() {
        assert!(!ChapterPhase::Pending.can_transition_to(&ChapterPhase::Segmenting));
        assert!(!ChapterPhase::SceneLoop { index: 0, total: 3 }
            .can_transition_to(&ChapterPhase::Assembled));
        assert!(!ChapterPhase::SceneLoop { index: 0, total: 3 }
            .can_transition_to(&ChapterPhase::SceneLoop { index: 2, total: 3 }));
    }

    #[test]
    fn test_percent_is_monotonic() {
        let phases = [
            ChapterPhase::CreditCheck,
            ChapterPhase::Segmenting,
            ChapterPhase::Narrating,
            ChapterPhase::SceneLoop { index: 0, total: 4 },
            ChapterPhase::SceneLoop { index: 3, total: 4 },
            ChapterPhase::Assembled,
        ];
        for pair in phases.windows(2) {
            assert!(pair[0].percent() <= pair[1].percent());
        }
    }
}
