//! HTTP boundary
//!
//! Thin translation between JSON requests and [`Registry`] calls.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use partycode_core::MAX_PEER_ID_LEN;

use crate::messages::{CreateRequest, CreateResponse, ErrorResponse, HealthResponse, LookupResponse};
use crate::registry::{Registry, RegistryError};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// Build the service router
pub fn router(registry: Arc<Registry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let codes = Router::new()
        .route("/create/", post(create_code))
        .route("/create", post(create_code))
        .route("/lookup/:code/", get(lookup_code))
        .route("/lookup/:code", get(lookup_code));

    Router::new()
        .nest("/api/party-codes", codes)
        .route("/health", get(health))
        .with_state(AppState { registry })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl-C
pub async fn serve(registry: Arc<Registry>, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    info!("Party code server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn create_code(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<CreateResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let peer_id = request
        .peer_id()
        .ok_or_else(|| ApiError::Validation("peer_id is required".into()))?;

    if peer_id.chars().count() > MAX_PEER_ID_LEN {
        return Err(ApiError::Validation(format!(
            "peer_id must be at most {} characters",
            MAX_PEER_ID_LEN
        )));
    }

    let entry = state.registry.create(peer_id)?;
    Ok(Json(entry.into()))
}

async fn lookup_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<LookupResponse>, ApiError> {
    match state.registry.resolve(&code)? {
        Some(entry) => Ok(Json(LookupResponse {
            peer_id: entry.peer_id,
        })),
        None => Err(ApiError::NotFound),
    }
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "healthy".into(),
        codes: state.registry.live_count()?,
    }))
}

/// Errors returned to HTTP clients
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    Validation(String),
    /// Code absent or expired (404)
    NotFound,
    /// Storage or entropy failure (500)
    Internal(RegistryError),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => {
                debug!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Party code not found".to_string()),
            ApiError::Internal(e) => {
                error!("Registry failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
