//! Ports - 应用层对外部能力的抽象
//!
//! 具体实现在 infrastructure 层

mod credit_ledger;
mod generative_text;
mod progress;
mod regeneration;
mod run_tracker;
mod script_store;

pub use credit_ledger::{CreditError, CreditLedgerPort, DeductOutcome};
pub use generative_text::{
    complete_with_timeout, GenerationError, GenerationRequest, GenerativeTextPort, TextStream,
};
pub use progress::{ChapterProgress, ProgressSinkPort};
pub use regeneration::RegenerationConfirmPort;
pub use run_tracker::RunTrackerPort;
pub use script_store::{RepositoryError, ScriptStorePort};
