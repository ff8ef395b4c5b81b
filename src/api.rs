//! HTTP surface of the gateway.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::{AllowedOrigins, CorsConfig};
use crate::store::{StoreError, StoredRecord, SubmissionStore};
use crate::submission::{
    ContactForm, ContactMessage, SubmissionError, WaitlistEntry, WaitlistForm,
};

const X_CUSTOM_HEADER: HeaderName = HeaderName::from_static("x-custom-header");

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn SubmissionStore>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request body: `{0}`")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    MissingFields(#[from] SubmissionError),
    #[error("{action}: `{source}`")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("not found")]
    NotFound,
}

impl ApiError {
    fn store(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { action, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidBody(_) => (StatusCode::BAD_REQUEST, "Invalid request body"),
            Self::MissingFields(_) => (StatusCode::BAD_REQUEST, "Missing required fields"),
            Self::Store { action, .. } => (StatusCode::INTERNAL_SERVER_ERROR, *action),
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found"),
        };

        if status.is_server_error() {
            error!("{self}");
        } else {
            debug!("rejected request: {self}");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Body returned when a submission is stored.
#[derive(Debug, Serialize)]
struct Created<T> {
    message: &'static str,
    data: StoredRecord<T>,
}

#[derive(Debug, Serialize)]
struct WaitlistCount {
    count: u64,
}

pub fn router(store: Arc<dyn SubmissionStore>, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/waitlist/count", get(waitlist_count))
        .route("/api/waitlist", post(add_waitlist))
        .route("/api/contact", post(add_contact))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(AppState { store })
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = match &config.allowed_origins {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(origins) => AllowOrigin::list(origins.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, X_CUSTOM_HEADER])
        .allow_credentials(config.allow_credentials)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn waitlist_count(State(state): State<AppState>) -> Result<Json<WaitlistCount>, ApiError> {
    let count = state
        .store
        .waitlist_count()
        .await
        .map_err(ApiError::store("Failed to count waitlist entries"))?;

    Ok(Json(WaitlistCount { count }))
}

async fn add_waitlist(
    State(state): State<AppState>,
    payload: Result<Json<WaitlistForm>, JsonRejection>,
) -> Result<Json<Created<WaitlistEntry>>, ApiError> {
    let Json(form) = payload?;
    let entry = WaitlistEntry::try_from(form)?;

    let record = state
        .store
        .add_waitlist(entry)
        .await
        .map_err(ApiError::store("Failed to add to waitlist"))?;
    info!("waitlist entry stored");

    Ok(Json(Created {
        message: "Successfully added to waitlist!",
        data: record,
    }))
}

async fn add_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<Created<ContactMessage>>, ApiError> {
    let Json(form) = payload?;
    let message = ContactMessage::try_from(form)?;

    let record = state
        .store
        .add_contact(message)
        .await
        .map_err(ApiError::store("Failed to send message"))?;
    info!("contact message stored");

    Ok(Json(Created {
        message: "Message sent successfully!",
        data: record,
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
