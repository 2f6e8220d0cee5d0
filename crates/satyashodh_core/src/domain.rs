//! crates/satyashodh_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Result shapes carry serde derives because they are the wire contract with the
//! generative model; everything else is independent of any storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Flow Results
//=========================================================================================

/// The classification attached to every fraud analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Real,
    Fraudulent,
    Unsure,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "Real",
            Verdict::Fraudulent => "Fraudulent",
            Verdict::Unsure => "Unsure",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Real" => Some(Verdict::Real),
            "Fraudulent" => Some(Verdict::Fraudulent),
            "Unsure" => Some(Verdict::Unsure),
            _ => None,
        }
    }
}

/// The outcome of one fraud analysis, exactly as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub verdict: Verdict,
    pub fraud_percentage: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// A single synthetic article shown in the news feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub category: String,
    pub image_url: String,
    pub image_hint: String,
    pub description: String,
    pub author: String,
    pub date: String,
}

/// One refresh worth of articles. A new feed always replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    pub articles: Vec<NewsArticle>,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

/// Synthesized speech, encoded as a self-describing data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAudio {
    pub media: String,
}

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Link,
    File,
    Video,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Link => "link",
            InputKind::File => "file",
            InputKind::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(InputKind::Text),
            "link" => Some(InputKind::Link),
            "file" => Some(InputKind::File),
            "video" => Some(InputKind::Video),
            _ => None,
        }
    }
}

/// Binary content that has already been encoded as a data URI by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInput {
    pub data_uri: String,
    pub file_name: Option<String>,
}

/// The raw payload of a request, discriminated by input kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentInput {
    Text(String),
    Link(String),
    File(MediaInput),
    Video(MediaInput),
}

impl ContentInput {
    pub fn kind(&self) -> InputKind {
        match self {
            ContentInput::Text(_) => InputKind::Text,
            ContentInput::Link(_) => InputKind::Link,
            ContentInput::File(_) => InputKind::File,
            ContentInput::Video(_) => InputKind::Video,
        }
    }

    /// What a history entry shows for this input: the text, the URL, or the file name.
    pub fn history_label(&self) -> String {
        match self {
            ContentInput::Text(text) => text.clone(),
            ContentInput::Link(url) => url.clone(),
            ContentInput::File(media) | ContentInput::Video(media) => media
                .file_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "uploaded file".to_string()),
        }
    }
}

/// An ephemeral request for an analysis or a summary.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub input: ContentInput,
    pub language: Option<Language>,
}

/// The output languages the summarizer and chatbot support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Bengali,
    Marathi,
    Telugu,
    Tamil,
    Gujarati,
    Urdu,
    Kannada,
    Odia,
    Malayalam,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Hindi,
        Language::Bengali,
        Language::Marathi,
        Language::Telugu,
        Language::Tamil,
        Language::Gujarati,
        Language::Urdu,
        Language::Kannada,
        Language::Odia,
        Language::Malayalam,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Bengali => "Bengali",
            Language::Marathi => "Marathi",
            Language::Telugu => "Telugu",
            Language::Tamil => "Tamil",
            Language::Gujarati => "Gujarati",
            Language::Urdu => "Urdu",
            Language::Kannada => "Kannada",
            Language::Odia => "Odia",
            Language::Malayalam => "Malayalam",
        }
    }

    /// Case-insensitive lookup by English name.
    pub fn from_name(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.name().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//=========================================================================================
// History
//=========================================================================================

/// Persisted record of one completed fraud analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudDetectionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input_type: InputKind,
    pub input_content: String,
    pub verdict: Verdict,
    pub fraud_percentage: f64,
    pub explanation: String,
    pub analysis_timestamp: DateTime<Utc>,
}

/// Persisted record of one completed summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input_type: InputKind,
    pub input_content: String,
    pub summarized_content: String,
    pub input_language: Option<String>,
    pub output_language: Language,
    pub summary_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryRecord {
    FraudDetection(FraudDetectionRecord),
    Summary(SummaryRecord),
}

impl HistoryRecord {
    pub fn user_id(&self) -> Uuid {
        match self {
            HistoryRecord::FraudDetection(r) => r.user_id,
            HistoryRecord::Summary(r) => r.user_id,
        }
    }
}

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// Identity attributes shown on the dashboard. Created on first sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
