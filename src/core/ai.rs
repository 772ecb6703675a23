// claude integration - turns plain english into tool invocations

use crate::{Error, config};
use serde::Serialize;
use serde_json::Value;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub struct Claude {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// Free-form text plus an optional structured tool invocation.
#[derive(Debug)]
pub struct AiResponse {
    pub text: String,
    pub tool_call: Option<ToolCall>,
}

#[derive(Debug)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

// what we send to claude
#[derive(Serialize)]
struct Request<'a> {
    model: &'static str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [Value],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl Claude {
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: config::api_key(api_key)?,
            base_url: "https://api.anthropic.com".into(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// One completion round. `tools` are complete json tool definitions;
    /// if the model answers with a tool_use block it lands in `tool_call`.
    pub async fn complete(
        &self,
        prompt: &str,
        system: &str,
        tools: &[Value],
    ) -> Result<AiResponse, Error> {
        let request = Request {
            model: DEFAULT_MODEL,
            max_tokens: 1024,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            tools,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Service(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Service(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Service(format!("{status}: {body}")));
        }

        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| Error::Service(format!("unparseable response: {e}")))?;

        Ok(parse_response(&parsed))
    }
}

// pick apart the content blocks: text concatenated, first tool_use wins
fn parse_response(parsed: &Value) -> AiResponse {
    let blocks = parsed["content"].as_array().cloned().unwrap_or_default();

    let mut text = String::new();
    let mut tool_call = None;

    for block in &blocks {
        match block["type"].as_str() {
            Some("text") => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(block["text"].as_str().unwrap_or(""));
            }
            Some("tool_use") if tool_call.is_none() => {
                if let Some(name) = block["name"].as_str() {
                    tool_call = Some(ToolCall {
                        name: name.to_string(),
                        arguments: block["input"].clone(),
                    });
                }
            }
            _ => {}
        }
    }

    AiResponse {
        text: text.trim().to_string(),
        tool_call,
    }
}
