//! SQLite Persistence - SQLite 数据库持久化实现

mod credit_ledger;
mod database;
mod script_store;

pub use credit_ledger::*;
pub use database::*;
pub use script_store::*;
