//! HTTP Endpoints
//!
//! REST API for call setup, stored conversation logs and the sales tools,
//! plus the minimal browser page.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use maxwell_tools::{ContentBlock, ToolExecutor};

use crate::session::CallOptions;
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_enabled = state.config.server.cors_enabled;

    let mut router = Router::new()
        // Call setup
        .route("/api/calls", post(create_call))
        .route("/api/calls/:id/config", post(configure_call))
        .route("/ws/:id", get(ws_handler))
        // Stored conversation logs
        .route("/conversations", get(list_conversations))
        .route("/conversations/stats", get(conversation_stats))
        .route("/conversations/:id", get(get_conversation))
        .route("/conversations/:id", delete(delete_conversation))
        .route("/download/conversations", get(download_conversations))
        // Tools
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(call_tool))
        // Browser page and health
        .route("/", get(index))
        .route("/health", get(health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

/// Create a new call session
async fn create_call(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.sessions.create() {
        Ok(session) => Ok(Json(serde_json::json!({
            "call_id": session.id,
            "websocket_url": format!("/ws/{}", session.id),
            "config_url": format!("/api/calls/{}/config", session.id),
        }))),
        Err(e) => {
            tracing::warn!("Failed to create call session: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Per-call configuration payload
#[derive(Debug, Deserialize)]
struct CallConfigRequest {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    voice_name: String,
    #[serde(default)]
    system_prompt: String,
}

/// Set a pending call's credentials, voice and prompt
async fn configure_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CallConfigRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    if !request.system_prompt.is_empty() {
        tracing::info!(
            call_id = %id,
            prompt_chars = request.system_prompt.len(),
            "Received system prompt for call"
        );
    }

    session.configure(CallOptions {
        api_key: non_empty(request.api_key),
        voice: non_empty(request.voice_name),
        system_prompt: non_empty(request.system_prompt),
    });
    session.touch();

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// List all available conversation logs
async fn list_conversations(State(state): State<AppState>) -> Json<serde_json::Value> {
    let conversations = state.logs.list();
    Json(serde_json::json!({ "conversations": conversations }))
}

/// Get the content of a specific conversation log
async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.logs.fetch(&id) {
        Ok(content) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": id, "content": content })),
        ),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("Could not read conversation: {}", e) })),
        ),
    }
}

/// Delete a specific conversation log
async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.logs.delete(&id) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": format!("Conversation {} deleted", id),
            })),
        ),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// Aggregate statistics across all stored conversations
async fn conversation_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.logs.stats();
    Json(serde_json::json!({ "stats": stats }))
}

/// Download all conversation logs as a ZIP file
async fn download_conversations(State(state): State<AppState>) -> impl IntoResponse {
    match state.logs.export_zip() {
        Ok((filename, bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// List tools
async fn list_tools(State(state): State<AppState>) -> Json<serde_json::Value> {
    let tools: Vec<serde_json::Value> = state
        .tools
        .list_tools()
        .into_iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
            })
        })
        .collect();

    Json(serde_json::json!({ "tools": tools }))
}

/// Tool call request
#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Call a tool by name
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ToolCallRequest>,
) -> Json<serde_json::Value> {
    match state.tools.execute(&name, request.arguments).await {
        Ok(output) => {
            let content: Vec<serde_json::Value> = output
                .content
                .into_iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => {
                        serde_json::json!({ "type": "text", "text": text })
                    }
                    ContentBlock::Resource { uri, mime_type } => {
                        serde_json::json!({ "type": "resource", "uri": uri, "mime_type": mime_type })
                    }
                })
                .collect();

            Json(serde_json::json!({
                "content": content,
                "is_error": output.is_error,
            }))
        }
        Err(e) => {
            tracing::error!("Tool error: {}", e);
            Json(serde_json::json!({
                "content": [ { "type": "text", "text": e.message } ],
                "is_error": true,
            }))
        }
    }
}

/// Minimal browser page for driving a call
async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Health check
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxwell_config::{RunMode, Settings};
    use tempfile::TempDir;

    #[test]
    fn test_router_creation() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.logging.work_dir = dir.path().join("agent_data").display().to_string();
        settings.logging.log_dir = dir.path().join("conversation_logs").display().to_string();

        let state = AppState::new(settings, RunMode::Server).unwrap();
        let _ = create_router(state);
    }
}
