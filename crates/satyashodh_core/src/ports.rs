//! crates/satyashodh_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the model provider, the speech engine, and the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{FraudDetectionRecord, SummaryRecord, UserCredentials, UserProfile};
use crate::validation::DataUri;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Generative Model
//=========================================================================================

/// An uploaded document, image, or video attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub data_uri: DataUri,
    /// Name the user uploaded the file under, when known.
    pub file_name: Option<String>,
}

/// A single prompt sent to the model, with the JSON Schema its answer must follow.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Stable name of the prompt template, used for logging and schema naming.
    pub prompt_name: &'static str,
    pub prompt: String,
    /// Inline media the prompt refers to.
    pub media: Option<MediaAttachment>,
    pub output_schema: serde_json::Value,
}

#[async_trait]
pub trait GenerativeModelService: Send + Sync {
    /// Runs the prompt and returns the model's structured JSON output, unvalidated.
    async fn generate(&self, request: GenerationRequest) -> PortResult<serde_json::Value>;

    /// Whether the model can read inline media of this MIME type.
    fn accepts_media(&self, _mime_type: &str) -> bool {
        true
    }
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates MP3 audio from a string of text.
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>>;
}

//=========================================================================================
// Persistence
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users and Profiles ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: Option<&str>,
    ) -> PortResult<UserProfile>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// Inserts the profile, or refreshes its identity attributes if it already exists.
    async fn upsert_user_profile(&self, profile: &UserProfile) -> PortResult<()>;

    async fn get_user_profile(&self, user_id: Uuid) -> PortResult<UserProfile>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- History (append-only, newest first on read) ---
    async fn append_fraud_record(&self, record: &FraudDetectionRecord) -> PortResult<()>;

    async fn append_summary_record(&self, record: &SummaryRecord) -> PortResult<()>;

    async fn list_fraud_history(&self, user_id: Uuid) -> PortResult<Vec<FraudDetectionRecord>>;

    async fn list_summary_history(&self, user_id: Uuid) -> PortResult<Vec<SummaryRecord>>;
}
