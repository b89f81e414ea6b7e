//! Script Context - Aggregate Root

use std::collections::BTreeMap;

use super::ScriptDocument;

/// 剧本集合：章节号 -> 剧本文档
///
/// 不变量:
/// - 每个章节号至多一份文档
/// - 合并时新文档覆盖同章节旧文档，其余章节保持不变
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSet {
    documents: BTreeMap<u32, ScriptDocument>,
}

impl ScriptSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: impl IntoIterator<Item = ScriptDocument>) -> Self {
        let mut set = Self::new();
        set.merge(documents);
        set
    }

    /// 合并新生成的文档：previous (minus regenerated keys) ∪ new
    pub fn merge(&mut self, documents: impl IntoIterator<Item = ScriptDocument>) {
        for doc in documents {
            self.documents.insert(doc.chapter_number, doc);
        }
    }

    pub fn contains(&self, chapter_number: u32) -> bool {
        self.documents.contains_key(&chapter_number)
    }

    pub fn get(&self, chapter_number: u32) -> Option<&ScriptDocument> {
        self.documents.get(&chapter_number)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn chapter_numbers(&self) -> Vec<u32> {
        self.documents.keys().copied().collect()
    }

    /// 按章节号升序返回所有文档
    pub fn documents(&self) -> Vec<ScriptDocument> {
        self.documents.values().cloned().collect()
    }

    pub fn into_documents(self) -> Vec<ScriptDocument> {
        self.documents.into_values().collect()
    }
}
