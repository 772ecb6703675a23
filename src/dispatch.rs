// request dispatcher - one registry lookup, one tool execution per request

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Claude, Db, QueryResult};
use crate::tools::{ToolContext, ToolRegistry};
use crate::Error;

/// An inbound request from any channel.
#[derive(Deserialize, Debug)]
pub struct Request {
    #[serde(default)]
    pub channel: String,
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Serialize, Debug)]
pub struct Response {
    pub tool: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn failure(command: &str, error: &Error) -> Self {
        Self {
            tool: command.to_string(),
            content: String::new(),
            rows: None,
            error: Some(error.to_string()),
        }
    }
}

pub struct Dispatcher {
    db: Db,
    ai: Option<Claude>,
    registry: ToolRegistry,
}

impl Dispatcher {
    pub fn new(db: Db, ai: Option<Claude>, registry: ToolRegistry) -> Self {
        Self { db, ai, registry }
    }

    /// Look the command up and run it. Unregistered commands fail with
    /// `Error::UnknownTool`; every other failure carries its own kind up.
    pub async fn dispatch(&self, request: &Request) -> Result<Response, Error> {
        tracing::info!(channel = %request.channel, command = %request.command, "dispatch");

        let ctx = ToolContext {
            db: &self.db,
            ai: self.ai.as_ref(),
            registry: &self.registry,
        };

        let output = self
            .registry
            .execute(&request.command, &ctx, &request.payload)
            .await
            .inspect_err(|e| tracing::error!(command = %request.command, error = %e, "dispatch failed"))?;

        Ok(Response {
            tool: request.command.clone(),
            content: output.text,
            rows: output.rows,
            error: None,
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}
