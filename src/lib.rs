// cliniq library - ai-driven appointment server for postgres

pub mod cli;
pub mod config;
mod core;
mod dispatch;
mod error;
mod server;
pub mod stdio;
pub mod tools;

pub use core::{AiResponse, Claude, Db, Guard, QueryResult, ToolCall};
pub use dispatch::{Dispatcher, Request, Response};
pub use error::Error;
pub use server::Server;
