//! Script Command Handlers

use std::sync::Arc;

use crate::application::commands::GenerateScripts;
use crate::application::error::ApplicationError;
use crate::application::pipeline::{BatchController, BatchReport, BatchRequest};
use crate::application::ports::{RegenerationConfirmPort, RunTrackerPort};
use crate::domain::script::NovelId;

/// 运行登记凭证，drop 时注销
pub struct RunTicket {
    novel_id: NovelId,
    tracker: Arc<dyn RunTrackerPort>,
}

impl RunTicket {
    pub fn novel_id(&self) -> &NovelId {
        &self.novel_id
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        self.tracker.finish(&self.novel_id);
    }
}

/// GenerateScripts Handler
///
/// 同一小说同时只允许一个批次：start 登记，execute 运行，凭证释放即注销。
/// HTTP 层先同步 start 以便立即返回冲突，再把 execute 放到后台任务。
pub struct GenerateScriptsHandler {
    controller: Arc<BatchController>,
    tracker: Arc<dyn RunTrackerPort>,
}

impl GenerateScriptsHandler {
    pub fn new(controller: Arc<BatchController>, tracker: Arc<dyn RunTrackerPort>) -> Self {
        Self {
            controller,
            tracker,
        }
    }

    /// 登记运行，已在运行时返回 Conflict
    pub fn start(&self, novel_id: &NovelId) -> Result<RunTicket, ApplicationError> {
        if !self.tracker.try_begin(novel_id) {
            return Err(ApplicationError::conflict(format!(
                "Script generation already running for novel {}",
                novel_id
            )));
        }
        Ok(RunTicket {
            novel_id: *novel_id,
            tracker: self.tracker.clone(),
        })
    }

    pub async fn execute(
        &self,
        ticket: RunTicket,
        command: GenerateScripts,
        confirm: &dyn RegenerationConfirmPort,
    ) -> Result<BatchReport, ApplicationError> {
        if ticket.novel_id() != &command.novel_id {
            return Err(ApplicationError::internal("Run ticket does not match command"));
        }

        let report = self
            .controller
            .run(
                BatchRequest {
                    novel_id: command.novel_id,
                    user_id: command.user_id,
                    chapters: command.chapters,
                },
                confirm,
            )
            .await;

        drop(ticket);
        report
    }

    pub async fn handle(
        &self,
        command: GenerateScripts,
        confirm: &dyn RegenerationConfirmPort,
    ) -> Result<BatchReport, ApplicationError> {
        let ticket = self.start(&command.novel_id)?;
        self.execute(ticket, command, confirm).await
    }

    pub fn is_running(&self, novel_id: &NovelId) -> bool {
        self.tracker.is_running(novel_id)
    }
}
