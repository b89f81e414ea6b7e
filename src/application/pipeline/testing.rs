//! 流水线测试用的端口替身

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{
    ChapterProgress, CreditError, CreditLedgerPort, DeductOutcome, ProgressSinkPort,
    RegenerationConfirmPort, RepositoryError, ScriptStorePort,
};
use crate::domain::script::{ChapterPhase, ChapterText, NovelId, ScriptDocument, UserId};
use crate::infrastructure::adapters::llm::{ScriptedLlmClient, ScriptedReply};

/// 约 200 字的章节，默认切分为 5 个片段
pub(crate) fn chapter(number: u32) -> ChapterText {
    let content = (0..20)
        .map(|i| format!("第{}章的第{}句话写到这里。", number, i))
        .collect::<String>();
    ChapterText::new(number, format!("第{}章", number), content).unwrap()
}

/// 从场景指令中取出场景编号
pub(crate) fn scene_number_in(prompt: &str) -> Option<usize> {
    let rest = &prompt[prompt.find("[SCENE ")? + "[SCENE ".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// 分段调用失败（走兜底），旁白与场景正常返回；fail_scene 指定的场景编号返回错误
pub(crate) fn scripted_llm(fail_scene: Option<usize>) -> ScriptedLlmClient {
    ScriptedLlmClient::with_responder(move |prompt| {
        if prompt.contains("切分为恰好") {
            ScriptedReply::Fail("segmentation unavailable".into())
        } else if prompt.contains("连续的旁白") {
            ScriptedReply::Text("少年站在石碑前，望着上面的字迹，".repeat(20))
        } else {
            match scene_number_in(prompt) {
                Some(n) if Some(n) == fail_scene => ScriptedReply::Fail("scene backend down".into()),
                Some(n) => ScriptedReply::Text(format!("[SCENE {n}: 第{n}幕]\nWide shot: 广场上人群散去")),
                None => ScriptedReply::Fail("unexpected prompt".into()),
            }
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Recorded {
    Chapter(u32, ChapterPhase, u8),
    Batch(usize, usize),
    Finished(String),
    Failed(String),
}

#[derive(Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingProgress {
    pub(crate) fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn phases_of(&self, chapter_number: u32) -> Vec<ChapterPhase> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Chapter(n, phase, _) if n == chapter_number => Some(phase),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSinkPort for RecordingProgress {
    fn chapter_progress(&self, progress: ChapterProgress) {
        self.events.lock().unwrap().push(Recorded::Chapter(
            progress.chapter_number,
            progress.phase,
            progress.percent,
        ));
    }

    fn batch_progress(&self, _novel_id: &NovelId, completed: usize, total: usize) {
        self.events.lock().unwrap().push(Recorded::Batch(completed, total));
    }

    fn batch_finished(&self, _novel_id: &NovelId, summary: &str) {
        self.events.lock().unwrap().push(Recorded::Finished(summary.to_string()));
    }

    fn batch_failed(&self, _novel_id: &NovelId, error: &str) {
        self.events.lock().unwrap().push(Recorded::Failed(error.to_string()));
    }
}

/// 第 refuse_on 次（从 1 开始）扣减时拒绝
#[derive(Default)]
pub(crate) struct CountingLedger {
    refuse_on: Option<usize>,
    calls: AtomicUsize,
    notes: Mutex<Vec<String>>,
}

impl CountingLedger {
    pub(crate) fn refusing_on(call: usize) -> Self {
        Self {
            refuse_on: Some(call),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn notes(&self) -> Vec<String> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CreditLedgerPort for CountingLedger {
    async fn deduct(
        &self,
        _user_id: &UserId,
        _feature_key: &str,
        note: &str,
    ) -> Result<DeductOutcome, CreditError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.notes.lock().unwrap().push(note.to_string());
        if Some(call) == self.refuse_on {
            Ok(DeductOutcome::refused(Some(0), "余额不足"))
        } else {
            Ok(DeductOutcome::approved(100 - call as i64))
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryScriptStore {
    existing: Vec<ScriptDocument>,
    saved: Mutex<Option<Vec<ScriptDocument>>>,
    fail_save: bool,
}

impl MemoryScriptStore {
    pub(crate) fn with_existing(existing: Vec<ScriptDocument>) -> Self {
        Self {
            existing,
            ..Default::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_save: true,
            ..Default::default()
        }
    }

    pub(crate) fn saved(&self) -> Option<Vec<ScriptDocument>> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptStorePort for MemoryScriptStore {
    async fn load_existing_scripts(
        &self,
        _novel_id: &NovelId,
    ) -> Result<Vec<ScriptDocument>, RepositoryError> {
        Ok(self.existing.clone())
    }

    async fn save_scripts(
        &self,
        _novel_id: &NovelId,
        documents: &[ScriptDocument],
    ) -> Result<(), RepositoryError> {
        if self.fail_save {
            return Err(RepositoryError::DatabaseError("disk full".into()));
        }
        *self.saved.lock().unwrap() = Some(documents.to_vec());
        Ok(())
    }
}

pub(crate) struct FixedConfirm {
    answer: bool,
    asked: Mutex<Vec<Vec<u32>>>,
}

impl FixedConfirm {
    pub(crate) fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn asked(&self) -> Vec<Vec<u32>> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegenerationConfirmPort for FixedConfirm {
    async fn confirm_regeneration(&self, _novel_id: &NovelId, chapter_numbers: &[u32]) -> bool {
        self.asked.lock().unwrap().push(chapter_numbers.to_vec());
        self.answer
    }
}
