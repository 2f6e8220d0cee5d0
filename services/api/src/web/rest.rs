//! services/api/src/web/rest.rs
//!
//! Contains the small account and service endpoints, and the master
//! definition for the OpenAPI specification.

use crate::web::{auth, flows, history, protocol, state::AppState};
use axum::{extract::State, http::StatusCode, response::Json, Extension};
use satyashodh_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        profile_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        flows::analyze_handler,
        flows::analyze_upload_handler,
        flows::summarize_handler,
        flows::summarize_upload_handler,
        flows::chat_handler,
        flows::speech_handler,
        flows::news_feed_handler,
        history::history_handler,
        history::history_stream_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            protocol::ContentRequest,
            protocol::ChatRequest,
            protocol::SpeechRequest,
            protocol::AnalysisResponse,
            protocol::SummaryResponse,
            protocol::ChatResponse,
            protocol::SpeechResponse,
            protocol::NewsArticleResponse,
            protocol::NewsFeedResponse,
            protocol::FraudHistoryItem,
            protocol::SummaryHistoryItem,
            protocol::HistoryResponse,
            protocol::ProfileResponse,
        )
    ),
    tags(
        (name = "SatyaShodh API", description = "Misinformation detection, summaries, news, and a multilingual assistant.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Handlers
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct HealthResponse {
    pub status: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The server is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// The signed-in user's profile.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile found", body = protocol::ProfileResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No profile for this user"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<protocol::ProfileResponse>, (StatusCode, String)> {
    match state.db.get_user_profile(user_id).await {
        Ok(profile) => Ok(Json(profile.into())),
        Err(PortError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Profile not found".to_string()))
        }
        Err(e) => {
            error!(%user_id, "Failed to load profile: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load profile".to_string(),
            ))
        }
    }
}
