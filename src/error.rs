use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Database connection error: {0}")]
    Connection(sqlx::Error),

    #[error("Query error: {0}")]
    Query(sqlx::Error),

    #[error("AI service error: {0}")]
    Service(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing API key. Set one of: ANTHROPIC_API_KEY, CLAUDE_API_KEY, or CLAUDE_KEY")]
    MissingApiKey,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}
