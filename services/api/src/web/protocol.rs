//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.
//! Core domain types stay free of web concerns; these structs carry the OpenAPI
//! schema annotations and the conversions in both directions.

use chrono::{DateTime, Utc};
use satyashodh_core::domain::{
    AnalysisRequest, AnalysisResult, ContentInput, FraudDetectionRecord, InputKind, MediaInput,
    NewsArticle, NewsFeed, SummaryRecord, SummaryResult, UserProfile,
};
use satyashodh_core::validation::{self, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests FROM the Client
//=========================================================================================

/// Content to analyze or summarize. `payload` holds the text, the URL, or a
/// `data:<mime>;base64,...` URI for files and videos.
#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    /// One of `text`, `link`, `file`, `video`.
    pub kind: String,
    pub payload: String,
    /// Original file name, shown in history for file and video inputs.
    pub file_name: Option<String>,
    /// Output language name, e.g. `Hindi`.
    pub language: Option<String>,
}

impl ContentRequest {
    pub fn into_request(self) -> Result<AnalysisRequest, ValidationError> {
        let kind = InputKind::parse(&self.kind)
            .ok_or_else(|| ValidationError::UnsupportedKind(self.kind.clone()))?;
        let language = match self.language.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(validation::parse_language(Some(name))?),
            _ => None,
        };
        let media = |data_uri: String| MediaInput {
            data_uri,
            file_name: self.file_name.clone(),
        };
        let input = match kind {
            InputKind::Text => ContentInput::Text(self.payload),
            InputKind::Link => ContentInput::Link(self.payload),
            InputKind::File => ContentInput::File(media(self.payload)),
            InputKind::Video => ContentInput::Video(media(self.payload)),
        };
        Ok(AnalysisRequest { input, language })
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ChatRequest {
    pub language: Option<String>,
    pub query: String,
    /// Also synthesize the reply as speech.
    #[serde(default)]
    pub speak: bool,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SpeechRequest {
    pub text: String,
}

//=========================================================================================
// Responses TO the Client
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// One of `Real`, `Fraudulent`, `Unsure`.
    pub verdict: String,
    pub fraud_percentage: f64,
    pub explanation: String,
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            verdict: result.verdict.as_str().to_string(),
            fraud_percentage: result.fraud_percentage,
            explanation: result.explanation,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct SummaryResponse {
    pub summary: String,
}

impl From<SummaryResult> for SummaryResponse {
    fn from(result: SummaryResult) -> Self {
        Self {
            summary: result.summary,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ChatResponse {
    pub response: String,
    /// Spoken reply as an `audio/mpeg` data URI, when requested and available.
    pub media: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SpeechResponse {
    pub media: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticleResponse {
    pub id: String,
    pub title: String,
    pub category: String,
    pub image_url: String,
    pub image_hint: String,
    pub description: String,
    pub author: String,
    pub date: String,
}

impl From<NewsArticle> for NewsArticleResponse {
    fn from(a: NewsArticle) -> Self {
        Self {
            id: a.id,
            title: a.title,
            category: a.category,
            image_url: a.image_url,
            image_hint: a.image_hint,
            description: a.description,
            author: a.author,
            date: a.date,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeedResponse {
    pub articles: Vec<NewsArticleResponse>,
    pub generated_at: DateTime<Utc>,
}

impl From<NewsFeed> for NewsFeedResponse {
    fn from(feed: NewsFeed) -> Self {
        Self {
            articles: feed.articles.into_iter().map(Into::into).collect(),
            generated_at: feed.generated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FraudHistoryItem {
    pub id: Uuid,
    pub input_type: String,
    pub input_content: String,
    pub verdict: String,
    pub fraud_percentage: f64,
    pub explanation: String,
    pub analysis_timestamp: DateTime<Utc>,
}

impl From<FraudDetectionRecord> for FraudHistoryItem {
    fn from(r: FraudDetectionRecord) -> Self {
        Self {
            id: r.id,
            input_type: r.input_type.as_str().to_string(),
            input_content: r.input_content,
            verdict: r.verdict.as_str().to_string(),
            fraud_percentage: r.fraud_percentage,
            explanation: r.explanation,
            analysis_timestamp: r.analysis_timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SummaryHistoryItem {
    pub id: Uuid,
    pub input_type: String,
    pub input_content: String,
    pub summarized_content: String,
    pub input_language: Option<String>,
    pub output_language: String,
    pub summary_timestamp: DateTime<Utc>,
}

impl From<SummaryRecord> for SummaryHistoryItem {
    fn from(r: SummaryRecord) -> Self {
        Self {
            id: r.id,
            input_type: r.input_type.as_str().to_string(),
            input_content: r.input_content,
            summarized_content: r.summarized_content,
            input_language: r.input_language,
            output_language: r.output_language.name().to_string(),
            summary_timestamp: r.summary_timestamp,
        }
    }
}

/// Both history collections, each ordered newest first.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub fraud_detection: Vec<FraudHistoryItem>,
    pub summaries: Vec<SummaryHistoryItem>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            user_id: p.user_id,
            email: p.email,
            display_name: p.display_name,
            photo_url: p.photo_url,
            created_at: p.created_at,
        }
    }
}
