//! HTTP + WebSocket API for MindSpace
//!
//! Endpoints:
//! - GET  /health               - Health check
//! - POST /session/new          - Create session
//! - GET  /session/:id          - Transcript, mood and status
//! - DELETE /session/:id        - Drop a session
//! - POST /session/:id/message  - Send a user message
//! - POST /session/:id/retry    - Re-send an unanswered message
//! - POST /session/:id/reset    - Back to the greeting
//! - GET  /session/:id/export   - Plain-text transcript
//! - WS   /ws/:id               - Live updates
//!
//! The session map lock is never held across the model call.

use axum::{
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, broadcast::error::RecvError, RwLock};
use tracing::{debug, info};

use crate::core::gateway::ChatGateway;
use crate::core::session::{ChatSession, ExchangeTicket, Submission};
use crate::error::{ChatError, GatewayError, SessionError};
use crate::types::{Exchange, MoodBand, MoodSummary, Turn};
use crate::GREETING;

/// A hosted session and its update channel
pub struct SessionEntry {
    pub session: ChatSession,
    pub update_tx: broadcast::Sender<SessionUpdate>,
}

impl SessionEntry {
    fn new(scoring: bool) -> Self {
        let (update_tx, _) = broadcast::channel(100);
        Self {
            session: ChatSession::new(scoring),
            update_tx,
        }
    }

    /// Push the current state to WebSocket subscribers
    fn broadcast(&self) {
        let last_crisis = self
            .session
            .turns()
            .last()
            .map(|t| t.is_crisis_card)
            .unwrap_or(false);
        let update = SessionUpdate {
            turn_count: self.session.turns().len(),
            awaiting_reply: self.session.is_awaiting_reply(),
            mood: self.session.mood().current(),
            band: self.session.mood().band(),
            last_crisis,
        };
        // No subscribers is fine
        let _ = self.update_tx.send(update);
    }

    fn status(&self, session_id: String) -> SessionStatusResponse {
        SessionStatusResponse {
            session_id,
            turns: self.session.turns().to_vec(),
            mood: self.session.mood().summary(),
            awaiting_reply: self.session.is_awaiting_reply(),
            scoring: self.session.scoring(),
        }
    }
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub turn_count: usize,
    pub awaiting_reply: bool,
    pub mood: f64,
    pub band: MoodBand,
    pub last_crisis: bool,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, SessionEntry>>,
    pub gateway: Arc<dyn ChatGateway>,
    pub scoring: bool,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub greeting: String,
    pub websocket_url: String,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
    pub mood: MoodSummary,
    pub awaiting_reply: bool,
    pub scoring: bool,
}

/// Send message request
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Error body for failed requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Request failures mapped to HTTP statuses
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Session(SessionError),
    Gateway(GatewayError),
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Session(e) => ApiError::Session(e),
            ChatError::Gateway(e) => ApiError::Gateway(e),
            ChatError::Config(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let simple = |kind: &str, message: String| ErrorResponse {
            kind: kind.to_string(),
            message,
            status: None,
            body: None,
        };

        let (code, body) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, simple("not_found", "unknown session".into())),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, simple("internal", message)),
            ApiError::Session(err) => {
                let (code, kind) = match err {
                    SessionError::EmptyMessage => (StatusCode::UNPROCESSABLE_ENTITY, "session"),
                    SessionError::AwaitingReply | SessionError::NothingToRetry => (StatusCode::CONFLICT, "session"),
                    SessionError::Superseded => (StatusCode::CONFLICT, "superseded"),
                };
                (code, simple(kind, err.to_string()))
            }
            ApiError::Gateway(err) => {
                let (status, body) = match &err {
                    GatewayError::RemoteRejected { status, body } => (Some(*status), Some(body.clone())),
                    GatewayError::EmptyContent { body } => (None, Some(body.clone())),
                    GatewayError::Transport { .. } => (None, None),
                };
                let response = ErrorResponse {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                    status,
                    body,
                };
                (StatusCode::BAD_GATEWAY, response)
            }
        };

        (code, Json(body)).into_response()
    }
}

/// Create the API router
pub fn create_router(gateway: Arc<dyn ChatGateway>, scoring: bool) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        gateway,
        scoring,
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/message", post(post_message))
        .route("/session/:id/retry", post(post_retry))
        .route("/session/:id/reset", post(reset_session))
        .route("/session/:id/export", get(export_session))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create new session
async fn create_session(State(state): State<Arc<AppState>>) -> Json<NewSessionResponse> {
    let session_id = uuid::Uuid::new_v4().to_string();

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), SessionEntry::new(state.scoring));
    info!(session = %session_id, active = sessions.len(), "session created");

    Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
        greeting: GREETING.to_string(),
    })
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(entry.status(id)))
}

/// Drop a session; its WebSocket subscribers see the channel close
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state.sessions.write().await;
    sessions.remove(&id).ok_or(ApiError::NotFound)?;
    info!(session = %id, active = sessions.len(), "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Send a user message
async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Exchange>, ApiError> {
    let (ticket, history) = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or(ApiError::NotFound)?;
        let submission = entry.session.submit(&req.text)?;
        entry.broadcast();
        match submission {
            Submission::Crisis(exchange) => return Ok(Json(exchange)),
            Submission::AwaitingReply(ticket) => (ticket, entry.session.turns().to_vec()),
        }
    };

    let exchange = finish_exchange(&state, &id, ticket, &history).await?;
    Ok(Json(exchange))
}

/// Re-send the unanswered user message
async fn post_retry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Exchange>, ApiError> {
    let (ticket, history) = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or(ApiError::NotFound)?;
        let ticket = entry.session.retry()?;
        entry.broadcast();
        (ticket, entry.session.turns().to_vec())
    };

    let mut exchange = finish_exchange(&state, &id, ticket, &history).await?;
    exchange.turns_appended = exchange.turns_appended.saturating_sub(1);
    Ok(Json(exchange))
}

/// Call the model without the lock held, then apply the result.
/// A reset while the call is out makes `ticket` stale and the reply is dropped.
async fn finish_exchange(
    state: &AppState,
    id: &str,
    ticket: ExchangeTicket,
    history: &[Turn],
) -> Result<Exchange, ApiError> {
    debug!(session = %id, turns = history.len(), "awaiting model reply");
    let result = state.gateway.reply(history).await;

    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(id).ok_or(ApiError::NotFound)?;
    let outcome = entry.session.complete(ticket, result);
    if !matches!(outcome, Err(ChatError::Session(SessionError::Superseded))) {
        entry.broadcast();
    }
    Ok(outcome?)
}

/// Reset session to its greeting
async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions.get_mut(&id).ok_or(ApiError::NotFound)?;
    entry.session.reset();
    entry.broadcast();
    info!(session = %id, "session reset");
    Ok(Json(entry.status(id)))
}

/// Plain-text transcript
async fn export_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(ApiError::NotFound)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        entry.session.export(),
    ))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.sessions.read().await;
    let entry = sessions.get(&id).ok_or(ApiError::NotFound)?;
    let rx = entry.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<SessionUpdate>) {
    while let Some(update) = next_update(&mut rx).await {
        let json = serde_json::to_string(&update).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Next update for a subscriber; a lagging one skips ahead, `None` once the session is gone
async fn next_update(rx: &mut broadcast::Receiver<SessionUpdate>) -> Option<SessionUpdate> {
    loop {
        match rx.recv().await {
            Ok(update) => return Some(update),
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "websocket client lagging, skipping stale updates");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    gateway: Arc<dyn ChatGateway>,
    scoring: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(gateway, scoring);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, scoring, "MindSpace API listening");
    axum::serve(listener, router).await?;
    Ok(())
}
