//! HTTP Handlers

mod ping;
mod script;
mod websocket;

pub use ping::*;
pub use script::*;
pub use websocket::*;
