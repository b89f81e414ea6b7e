//! Command Handlers

mod script_handlers;

pub use script_handlers::{GenerateScriptsHandler, RunTicket};
