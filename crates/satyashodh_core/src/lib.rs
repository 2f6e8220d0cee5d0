pub mod auth;
pub mod domain;
pub mod flows;
pub mod history;
pub mod ports;
pub mod prompts;
pub mod schema;
pub mod validation;

pub use auth::{AuthState, GateDecision, Principal};
pub use domain::{
    AnalysisRequest, AnalysisResult, AuthSession, ChatReply, ContentInput, FraudDetectionRecord,
    HistoryRecord, InputKind, Language, MediaInput, NewsArticle, NewsFeed, SpeechAudio,
    SummaryRecord, SummaryResult, UserCredentials, UserProfile, Verdict,
};
pub use flows::{FlowError, FlowResult, FlowService};
pub use ports::{
    DatabaseService, GenerationRequest, GenerativeModelService, MediaAttachment, PortError,
    PortResult, TextToSpeechService,
};
