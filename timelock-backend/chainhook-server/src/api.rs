// src/api.rs
use crate::{
    chainhooks::{ChainhooksClient, RegistrationError},
    config::Config,
    models::{ErrorBody, RegisterResponse, WebhookAck},
    webhook::WebhookReceiver,
};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

// The shared state for our Axum handlers
pub struct AppState {
    pub chainhooks: ChainhooksClient,
    pub receiver: WebhookReceiver,
}

type SharedState = State<Arc<AppState>>;

/// Failures surfaced to HTTP callers as `{ "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    Register(RegistrationError),
    List(RegistrationError),
    /// Already logged by the receiver.
    Webhook,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Register(e) => {
                error!(error = %e, "Failed to register chainhook");
                "Failed to register chainhook"
            }
            ApiError::List(e) => {
                error!(error = %e, "Failed to get chainhooks");
                "Failed to get chainhooks"
            }
            ApiError::Webhook => "Webhook processing failed",
        };
        let body = ErrorBody { error: message.to_string() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// POST /api/chainhooks
async fn register_chainhook(State(state): SharedState) -> Result<Json<RegisterResponse>, ApiError> {
    let uuid = state.chainhooks.register().await.map_err(ApiError::Register)?;
    Ok(Json(RegisterResponse { success: true, uuid }))
}

// GET /api/chainhooks
async fn list_chainhooks(State(state): SharedState) -> Result<Json<Value>, ApiError> {
    let listing = state.chainhooks.list_raw().await.map_err(ApiError::List)?;
    Ok(Json(listing))
}

// POST /api/webhook
async fn receive_webhook(State(state): SharedState, body: Bytes) -> Result<Json<WebhookAck>, ApiError> {
    let ack = state.receiver.receive(&body).await.map_err(|_| ApiError::Webhook)?;
    Ok(Json(ack))
}

// GET /health
async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/api/chainhooks", post(register_chainhook).get(list_chainhooks))
        .route("/api/webhook", post(receive_webhook))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_api_server(config: Arc<Config>, state: Arc<AppState>) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.server_bind_address).await?;
    info!(address = %config.server_bind_address, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
