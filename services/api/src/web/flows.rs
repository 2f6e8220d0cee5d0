//! services/api/src/web/flows.rs
//!
//! Axum handlers for the generative features: fraud detection, summaries, the
//! multilingual chatbot, speech, and the news feed. Each handler calls one
//! operation on the `FlowService`; completed analyses and summaries are written
//! to history in the background.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use bytes::Bytes;
use satyashodh_core::{
    history,
    validation::{self, ValidationError},
    AnalysisRequest, FlowError, FraudDetectionRecord, HistoryRecord, SummaryRecord,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::protocol::{
    AnalysisResponse, ChatRequest, ChatResponse, ContentRequest, NewsFeedResponse,
    SpeechRequest, SpeechResponse, SummaryResponse,
};
use crate::web::state::AppState;

/// Shown for any provider failure; the details only go to the log.
pub const PROVIDER_FAILURE_MESSAGE: &str =
    "The AI service could not complete this request. Please try again.";

type HandlerError = (StatusCode, String);

//=========================================================================================
// Error Mapping and History
//=========================================================================================

/// Input errors become `400` with their message; everything else is a generic `502`.
pub fn flow_error_response(e: FlowError) -> HandlerError {
    if e.is_input_error() {
        info!("Rejected request input: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        error!("Flow failed: {:?}", e);
        (StatusCode::BAD_GATEWAY, PROVIDER_FAILURE_MESSAGE.to_string())
    }
}

fn bad_request(e: ValidationError) -> HandlerError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Saves the record without holding up the response, then tells history subscribers.
fn spawn_history_write(state: &Arc<AppState>, record: HistoryRecord) {
    let state = state.clone();
    tokio::spawn(async move {
        if history::record_best_effort(state.db.as_ref(), &record).await.is_ok() {
            // No subscribers is not an error.
            let _ = state.history_events.send(record.user_id());
        }
    });
}

async fn run_analysis(
    state: &Arc<AppState>,
    user_id: Uuid,
    request: AnalysisRequest,
) -> Result<Json<AnalysisResponse>, HandlerError> {
    let result = state
        .flows
        .analyze(&request)
        .await
        .map_err(flow_error_response)?;

    let record = FraudDetectionRecord::from_analysis(user_id, &request, &result);
    spawn_history_write(state, HistoryRecord::FraudDetection(record));
    Ok(Json(result.into()))
}

async fn run_summary(
    state: &Arc<AppState>,
    user_id: Uuid,
    request: AnalysisRequest,
) -> Result<Json<SummaryResponse>, HandlerError> {
    let result = state
        .flows
        .summarize(&request)
        .await
        .map_err(flow_error_response)?;

    let record = SummaryRecord::from_summary(user_id, &request, &result);
    spawn_history_write(state, HistoryRecord::Summary(record));
    Ok(Json(result.into()))
}

//=========================================================================================
// Multipart Uploads
//=========================================================================================

#[derive(Default)]
struct UploadForm {
    kind: Option<String>,
    language: Option<String>,
    file: Option<UploadedFile>,
}

struct UploadedFile {
    name: Option<String>,
    content_type: String,
    data: Bytes,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, HandlerError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "file" => {
                    let name = field.file_name().map(str::to_string);
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .ok_or_else(|| {
                            (
                                StatusCode::BAD_REQUEST,
                                "The uploaded file has no content type.".to_string(),
                            )
                        })?;
                    let data = field.bytes().await.map_err(|e| {
                        (
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file bytes: {}", e),
                        )
                    })?;
                    form.file = Some(UploadedFile {
                        name,
                        content_type,
                        data,
                    });
                }
                "kind" | "language" => {
                    let value = field.text().await.map_err(|e| {
                        (
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read field '{}': {}", field_name, e),
                        )
                    })?;
                    if field_name == "kind" {
                        form.kind = Some(value);
                    } else {
                        form.language = Some(value);
                    }
                }
                other => warn!("Ignoring unexpected multipart field '{}'", other),
            }
        }
        Ok(form)
    }

    /// Encodes the file as a data URI and validates it like a JSON request.
    fn into_request(self) -> Result<AnalysisRequest, HandlerError> {
        let file = self.file.ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include a file".to_string(),
            )
        })?;
        if file.data.is_empty() {
            return Err(bad_request(ValidationError::Empty("File")));
        }
        let data_uri = validation::DataUri::from_bytes(&file.content_type, &file.data);
        let kind = self.kind.unwrap_or_else(|| {
            if data_uri.is_video() { "video" } else { "file" }.to_string()
        });

        ContentRequest {
            kind,
            payload: data_uri.into_string(),
            file_name: file.name,
            language: self.language,
        }
        .into_request()
        .map_err(bad_request)
    }
}

//=========================================================================================
// Fraud Detection
//=========================================================================================

/// Analyze text, a link, a file, or a video for misinformation.
#[utoipa::path(
    post,
    path = "/fraud-detection",
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Analysis completed", body = AnalysisResponse),
        (status = 400, description = "Invalid or empty input"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "The AI provider failed")
    ),
    tag = "fraud-detection"
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<ContentRequest>,
) -> Result<Json<AnalysisResponse>, HandlerError> {
    let request = body.into_request().map_err(bad_request)?;
    run_analysis(&state, user_id, request).await
}

/// Analyze an uploaded file or video.
///
/// Form fields: `file` (required), `kind` (`file` or `video`, inferred from the
/// content type when absent), `language` (optional).
#[utoipa::path(
    post,
    path = "/fraud-detection/upload",
    request_body(content_type = "multipart/form-data", description = "The file or video to analyze."),
    responses(
        (status = 200, description = "Analysis completed", body = AnalysisResponse),
        (status = 400, description = "Missing or unsupported file"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "The AI provider failed")
    ),
    tag = "fraud-detection"
)]
pub async fn analyze_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, HandlerError> {
    let request = UploadForm::read(multipart).await?.into_request()?;
    run_analysis(&state, user_id, request).await
}

//=========================================================================================
// Summaries
//=========================================================================================

/// Summarize text, a link, a file, or a video in the requested language.
#[utoipa::path(
    post,
    path = "/summaries",
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 400, description = "Invalid or empty input"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "The AI provider failed")
    ),
    tag = "summaries"
)]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<ContentRequest>,
) -> Result<Json<SummaryResponse>, HandlerError> {
    let request = body.into_request().map_err(bad_request)?;
    run_summary(&state, user_id, request).await
}

#[utoipa::path(
    post,
    path = "/summaries/upload",
    request_body(content_type = "multipart/form-data", description = "The file or video to summarize."),
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 400, description = "Missing or unsupported file"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "The AI provider failed")
    ),
    tag = "summaries"
)]
pub async fn summarize_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>, HandlerError> {
    let request = UploadForm::read(multipart).await?.into_request()?;
    run_summary(&state, user_id, request).await
}

//=========================================================================================
// Chatbot and Speech
//=========================================================================================

/// Ask the multilingual assistant a question, optionally with a spoken reply.
///
/// A speech failure never fails the chat; the reply is returned without audio.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Empty message or unsupported language"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "The AI provider failed")
    ),
    tag = "chat"
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, HandlerError> {
    let language = validation::parse_language(req.language.as_deref()).map_err(bad_request)?;
    let reply = state
        .flows
        .chat(language, &req.query)
        .await
        .map_err(flow_error_response)?;

    let media = if req.speak {
        match state.flows.speak(&reply.response).await {
            Ok(audio) => Some(audio.media),
            Err(e) => {
                warn!("Speech synthesis failed, returning text only: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(Json(ChatResponse {
        response: reply.response,
        media,
    }))
}

/// Read a piece of text aloud. Returns an `audio/mpeg` data URI.
#[utoipa::path(
    post,
    path = "/speech",
    request_body = SpeechRequest,
    responses(
        (status = 200, description = "Synthesized audio", body = SpeechResponse),
        (status = 400, description = "Empty text"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "The speech provider failed")
    ),
    tag = "chat"
)]
pub async fn speech_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<SpeechResponse>, HandlerError> {
    let audio = state
        .flows
        .speak(&req.text)
        .await
        .map_err(flow_error_response)?;
    Ok(Json(SpeechResponse { media: audio.media }))
}

//=========================================================================================
// News Feed
//=========================================================================================

/// Generate a fresh set of news articles. Every call replaces the previous feed.
#[utoipa::path(
    get,
    path = "/news-feed",
    responses(
        (status = 200, description = "A freshly generated feed", body = NewsFeedResponse),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "The AI provider failed")
    ),
    tag = "news"
)]
pub async fn news_feed_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NewsFeedResponse>, HandlerError> {
    let feed = state
        .flows
        .generate_news()
        .await
        .map_err(flow_error_response)?;
    Ok(Json(feed.into()))
}
