use async_trait::async_trait;
use serde_json::Value;

use crate::core::{Claude, Db, QueryResult};
use crate::tools::ToolRegistry;
use crate::Error;

/// Everything a handler may reach during one tool execution. The registry
/// reference lets the natural-language tool invoke whatever the model picked.
pub struct ToolContext<'a> {
    pub db: &'a Db,
    pub ai: Option<&'a Claude>,
    pub registry: &'a ToolRegistry,
}

/// What a tool hands back to the dispatcher.
#[derive(Debug)]
pub struct ToolOutput {
    pub text: String,
    pub rows: Option<QueryResult>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: None,
        }
    }

    pub fn rows(text: impl Into<String>, rows: QueryResult) -> Self {
        Self {
            text: text.into(),
            rows: Some(rows),
        }
    }
}

/// A tool's execution handler.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &ToolContext<'_>, args: &Value) -> Result<ToolOutput, Error>;
}

/// A tool definition: json schema for the model + handler for execution.
pub struct ToolDef {
    pub name: String,
    pub schema: Value,
    pub handler: Box<dyn ToolHandler>,
}
