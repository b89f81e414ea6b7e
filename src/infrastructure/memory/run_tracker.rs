//! In-Memory Run Tracker Implementation

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::RunTrackerPort;
use crate::domain::script::NovelId;

/// 内存运行登记表
pub struct InMemoryRunTracker {
    /// novel_id -> 开始时间
    running: DashMap<NovelId, DateTime<Utc>>,
}

impl InMemoryRunTracker {
    pub fn new() -> Self {
        Self {
            running: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }
}

impl Default for InMemoryRunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTrackerPort for InMemoryRunTracker {
    fn try_begin(&self, novel_id: &NovelId) -> bool {
        match self.running.entry(*novel_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Utc::now());
                tracing::debug!(novel_id = %novel_id, "Script run registered");
                true
            }
        }
    }

    fn finish(&self, novel_id: &NovelId) {
        if let Some((_, started_at)) = self.running.remove(novel_id) {
            let elapsed_ms = (Utc::now() - started_at).num_milliseconds();
            tracing::debug!(novel_id = %novel_id, elapsed_ms, "Script run released");
        }
    }

    fn is_running(&self, novel_id: &NovelId) -> bool {
        self.running.contains_key(novel_id)
    }
}
