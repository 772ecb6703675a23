// http channel - run the dispatcher as an api

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{Dispatcher, Error, Request, Response};

struct AppState {
    dispatcher: Dispatcher,
    schema: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub struct Server;

impl Server {
    pub async fn run(dispatcher: Dispatcher, host: &str, port: u16) -> Result<(), Error> {
        let schema = dispatcher.db().schema().await?;
        let state = Arc::new(AppState { dispatcher, schema });

        let app = Router::new()
            .route("/health", get(health))
            .route("/schema", get(get_schema))
            .route("/tools", get(get_tools))
            .route("/dispatch", post(dispatch))
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr = format!("{host}:{port}");
        tracing::info!(%addr, "http channel listening");
        println!("server running at http://{addr}");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn get_schema(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "schema": state.schema }))
}

async fn get_tools(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "tools": state.dispatcher.registry().names() }))
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Request>,
) -> (StatusCode, Json<Response>) {
    match state.dispatcher.dispatch(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => (status_for(&e), Json(Response::failure(&request.command, &e))),
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::UnknownTool(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) | Error::Query(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
        Error::Service(_) => StatusCode::BAD_GATEWAY,
        Error::Connection(_) | Error::MissingApiKey | Error::Server(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
