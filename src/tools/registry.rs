use serde_json::Value;

use super::handler::{ToolContext, ToolDef, ToolHandler, ToolOutput};
use crate::Error;

/// Catalog of available tools. Loaded once at startup, immutable afterward;
/// names are unique and lookup is a direct scan.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. The schema is the complete json tool definition
    /// (name, description, input_schema) sent to the model. Registering the
    /// same name twice is a startup error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        schema: Value,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), Error> {
        let name = name.into();
        if self.tools.iter().any(|t| t.name == name) {
            return Err(Error::Server(format!("duplicate tool: {name}")));
        }

        self.tools.push(ToolDef {
            name,
            schema,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDef, Error> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// Execute a tool by name within the given context.
    pub async fn execute(
        &self,
        name: &str,
        ctx: &ToolContext<'_>,
        args: &Value,
    ) -> Result<ToolOutput, Error> {
        self.lookup(name)?.handler.call(ctx, args).await
    }

    /// All tool schemas for the model request body, minus any excluded names.
    pub fn schemas_except(&self, excluded: &str) -> Vec<Value> {
        self.tools
            .iter()
            .filter(|t| t.name != excluded)
            .map(|t| t.schema.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
