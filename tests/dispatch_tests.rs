// tests for tool registration and request dispatch
// handlers here never touch the database, so a lazy pool is enough

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use cliniq::tools::{self, ToolContext, ToolHandler, ToolOutput, ToolRegistry};
use cliniq::{Db, Dispatcher, Error, Request};

struct CountingTool {
    hits: Arc<AtomicUsize>,
    reply: &'static str,
}

#[async_trait]
impl ToolHandler for CountingTool {
    async fn call(&self, _ctx: &ToolContext<'_>, _args: &Value) -> Result<ToolOutput, Error> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(ToolOutput::text(self.reply))
    }
}

struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    async fn call(&self, _ctx: &ToolContext<'_>, args: &Value) -> Result<ToolOutput, Error> {
        Ok(ToolOutput::text(args["message"].as_str().unwrap_or("").to_string()))
    }
}

fn lazy_db() -> Db {
    Db::connect_lazy("postgres://postgres@localhost:5432/postgres").unwrap()
}

fn schema_for(name: &str) -> Value {
    json!({
        "name": name,
        "description": "test tool",
        "input_schema": {"type": "object", "properties": {}}
    })
}

fn request(command: &str, payload: Value) -> Request {
    Request {
        channel: "chat".into(),
        command: command.into(),
        payload,
    }
}

#[tokio::test]
async fn dispatch_routes_to_correct_handler_exactly_once() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let mut registry = ToolRegistry::new();
    registry
        .register(
            "first",
            schema_for("first"),
            CountingTool {
                hits: first.clone(),
                reply: "from first",
            },
        )
        .unwrap();
    registry
        .register(
            "second",
            schema_for("second"),
            CountingTool {
                hits: second.clone(),
                reply: "from second",
            },
        )
        .unwrap();

    let dispatcher = Dispatcher::new(lazy_db(), None, registry);
    let response = dispatcher
        .dispatch(&request("second", json!({})))
        .await
        .unwrap();

    assert_eq!(response.tool, "second");
    assert_eq!(response.content, "from second");
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert_eq!(first.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dispatch_unknown_command_fails() {
    let dispatcher = Dispatcher::new(lazy_db(), None, ToolRegistry::new());

    let err = dispatcher
        .dispatch(&request("no_such_tool", json!({})))
        .await
        .unwrap_err();

    match err {
        Error::UnknownTool(name) => assert_eq!(name, "no_such_tool"),
        other => panic!("expected UnknownTool, got {other:?}"),
    }
}

#[tokio::test]
async fn dispatch_passes_payload_through() {
    let mut registry = ToolRegistry::new();
    registry.register("echo", schema_for("echo"), EchoTool).unwrap();

    let dispatcher = Dispatcher::new(lazy_db(), None, registry);
    let response = dispatcher
        .dispatch(&request("echo", json!({"message": "hello agenda"})))
        .await
        .unwrap();

    assert_eq!(response.content, "hello agenda");
}

#[test]
fn duplicate_registration_is_an_error() {
    let mut registry = ToolRegistry::new();
    registry.register("echo", schema_for("echo"), EchoTool).unwrap();

    let err = registry
        .register("echo", schema_for("echo"), EchoTool)
        .unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn registry_lookup_unknown_is_unknown_tool() {
    let registry = ToolRegistry::new();
    assert!(matches!(
        registry.lookup("missing"),
        Err(Error::UnknownTool(_))
    ));
}

#[test]
fn default_registry_carries_the_appointment_tools() {
    let registry = tools::default_registry().unwrap();
    let names = registry.names();

    for expected in [
        "list_tables",
        "retrieve_all_data",
        "retrieve_data_with_conditions",
        "create_appointment",
        "get_agenda_summary",
        "ask",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }
    assert_eq!(registry.len(), 6);
}

#[test]
fn ask_schema_is_excluded_from_model_tool_list() {
    let registry = tools::default_registry().unwrap();
    let schemas = registry.schemas_except("ask");

    assert_eq!(schemas.len(), 5);
    assert!(schemas.iter().all(|s| s["name"] != "ask"));
}
