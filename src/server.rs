// ABOUTME: HTTP boundary exposing session coordination and chat classification as JSON
// ABOUTME: Maps store errors to status codes; all payloads are camelCase JSON over axum

use crate::assistant::{AssistantReply, CompletionBackend, ReplyComposer};
use crate::config::Config;
use crate::session::{Session, SessionStore, StoreError};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub session_store: SessionStore,
    pub composer: ReplyComposer,
    pub completion: Option<Arc<dyn CompletionBackend>>,
    pub config: Arc<Config>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        Ok(AppState {
            session_store: SessionStore::new(),
            composer: ReplyComposer::new(&config.assistant.name)?,
            completion: None,
            config,
            metrics_handle: None,
        })
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidSessionId(_) | StoreError::InvalidUser(_) => StatusCode::BAD_REQUEST,
            StoreError::LockPoisoned(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub message: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/session/create", post(create_session))
        .route("/session/join", post(join_session))
        .route("/session/list", get(list_sessions))
        .route("/session/{session_id}", get(get_session))
        .route("/session/{session_id}/rename", post(rename_session))
        .route("/chat/message", post(chat_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn start_server(state: Arc<AppState>) -> Result<()> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "HTTP server listening");
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> std::result::Result<Json<Session>, StoreError> {
    let session = state
        .session_store
        .create(&req.session_id, &req.user_id, &req.user_name)?;
    Ok(Json(session))
}

pub async fn join_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> std::result::Result<Json<Session>, StoreError> {
    let session = state
        .session_store
        .join(&req.session_id, &req.user_id, &req.user_name)?;
    Ok(Json(session))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<Session>, StoreError> {
    let session = state.session_store.get(&session_id)?;
    Ok(Json(session))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> std::result::Result<Json<Vec<Session>>, StoreError> {
    let sessions = state.session_store.sessions_for_user(&query.user_id)?;
    Ok(Json(sessions))
}

pub async fn rename_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> std::result::Result<Json<Session>, StoreError> {
    let session = state.session_store.rename(&session_id, &req.name)?;
    Ok(Json(session))
}

/// Classify a message, route it to a card type, and when a completion
/// backend is configured, run the composed prompt through it.
pub async fn chat_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let mut reply = state.composer.classify(&req.message);

    // Member context is only available when the caller names a session;
    // an unknown session id is surfaced, not silently substituted.
    let members = match &req.session_id {
        Some(session_id) => match state.session_store.get(session_id) {
            Ok(session) => session.members,
            Err(e) => return e.into_response(),
        },
        None => Vec::new(),
    };

    if let Some(backend) = &state.completion {
        let sender_name = req
            .user_name
            .as_deref()
            .unwrap_or(req.user_id.as_str());
        let prompt = state
            .composer
            .compose_prompt(&req.message, sender_name, &members, &reply);
        match backend.complete(&prompt).await {
            Ok(text) => reply.reply = Some(text),
            Err(e) => {
                tracing::error!(error = %e, "Completion backend failed");
                let body = Json(json!({ "error": format!("Completion failed: {}", e) }));
                return (StatusCode::BAD_GATEWAY, body).into_response();
            }
        }
    }

    Json::<AssistantReply>(reply).into_response()
}
