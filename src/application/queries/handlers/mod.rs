//! Query Handlers

mod script_handlers;

pub use script_handlers::GetScriptsHandler;
