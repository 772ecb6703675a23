// core logic - ai, database, and sql guard

mod ai;
mod db;
mod safety;

pub use ai::{AiResponse, Claude, ToolCall};
pub use db::{Db, QueryResult};
pub use safety::Guard;
