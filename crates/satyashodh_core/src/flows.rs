//! crates/satyashodh_core/src/flows.rs
//!
//! The request façade: one async operation per capability. Each operation validates
//! its input, renders a prompt, makes a single call to the model, and decodes the
//! structured answer. Nothing is retried and nothing is persisted here.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{
    AnalysisRequest, AnalysisResult, ChatReply, ContentInput, Language, MediaInput, NewsFeed,
    SpeechAudio, SummaryResult,
};
use crate::ports::{
    GenerationRequest, GenerativeModelService, MediaAttachment, PortError, TextToSpeechService,
};
use crate::prompts;
use crate::schema::{self, StructuredOutput, NEWS_FEED_SIZE};
use crate::validation::{self, DataUri, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Rejected before any provider call.
    #[error("{0}")]
    InvalidInput(#[from] ValidationError),
    /// The link produced no usable summary, so there is nothing to analyze.
    #[error("Could not fetch content from the provided URL.")]
    UnreadableLink,
    #[error("Provider error: {0}")]
    Provider(#[from] PortError),
    #[error("Provider returned malformed output: {0}")]
    MalformedOutput(String),
}

impl FlowError {
    /// True for errors the caller caused and can fix by changing the input.
    pub fn is_input_error(&self) -> bool {
        matches!(self, FlowError::InvalidInput(_) | FlowError::UnreadableLink)
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Entry point for every generative flow.
#[derive(Clone)]
pub struct FlowService {
    model: Arc<dyn GenerativeModelService>,
    speech: Arc<dyn TextToSpeechService>,
}

impl FlowService {
    pub fn new(
        model: Arc<dyn GenerativeModelService>,
        speech: Arc<dyn TextToSpeechService>,
    ) -> Self {
        Self { model, speech }
    }

    async fn run<T: StructuredOutput>(
        &self,
        prompt_name: &'static str,
        prompt: String,
        media: Option<MediaAttachment>,
    ) -> FlowResult<T> {
        let raw = self
            .generate_json(prompt_name, prompt, media, T::json_schema())
            .await?;

        schema::decode::<T>(raw).map_err(|reason| {
            warn!(prompt_name, %reason, "Model output failed validation");
            FlowError::MalformedOutput(reason)
        })
    }

    async fn generate_json(
        &self,
        prompt_name: &'static str,
        prompt: String,
        media: Option<MediaAttachment>,
        output_schema: serde_json::Value,
    ) -> FlowResult<serde_json::Value> {
        if let Some(attachment) = &media {
            let mime_type = attachment.data_uri.mime_type();
            if !self.model.accepts_media(mime_type) {
                return Err(ValidationError::MediaNotAccepted(mime_type.to_string()).into());
            }
        }
        debug!(prompt_name, has_media = media.is_some(), "Invoking generative model");
        let raw = self
            .model
            .generate(GenerationRequest {
                prompt_name,
                prompt,
                media,
                output_schema,
            })
            .await?;
        Ok(raw)
    }

    //=====================================================================================
    // Fraud Analysis
    //=====================================================================================

    pub async fn analyze(&self, request: &AnalysisRequest) -> FlowResult<AnalysisResult> {
        let language = request.language;
        match &request.input {
            ContentInput::Text(text) => self.analyze_text(text, language).await,
            ContentInput::Link(url) => self.analyze_link(url, language).await,
            ContentInput::File(media) => self.analyze_file(media, language).await,
            ContentInput::Video(media) => self.analyze_video(media, language).await,
        }
    }

    pub async fn analyze_text(
        &self,
        news_content: &str,
        language: Option<Language>,
    ) -> FlowResult<AnalysisResult> {
        let news_content = validation::require_text("Text content", news_content)?;
        let mut prompt = prompts::render(
            prompts::ANALYZE_NEWS_PROMPT,
            &[("news_content", news_content)],
        );
        if let Some(language) = language {
            prompt.push_str(&prompts::explanation_language_line(language.name()));
        }
        self.run("analyzeNewsForFraud", prompt, None).await
    }

    /// Summarizes the page first, then analyzes the summary. The two calls are sequential.
    ///
    /// A summary that decodes but is blank means the page could not be read, which is
    /// reported as [`FlowError::UnreadableLink`]. Any other bad output stays malformed.
    pub async fn analyze_link(
        &self,
        url: &str,
        language: Option<Language>,
    ) -> FlowResult<AnalysisResult> {
        let prompt = link_summary_prompt(url, Language::default())?;
        let raw = self
            .generate_json(LINK_SUMMARY_PROMPT_NAME, prompt, None, SummaryResult::json_schema())
            .await?;
        let summary: SummaryResult = serde_json::from_value(raw).map_err(|e| {
            warn!(reason = %e, "Link summary could not be decoded");
            FlowError::MalformedOutput(e.to_string())
        })?;
        if summary.summary.trim().is_empty() {
            warn!("Link summary is empty, skipping analysis");
            return Err(FlowError::UnreadableLink);
        }
        self.analyze_text(&summary.summary, language).await
    }

    pub async fn analyze_file(
        &self,
        media: &MediaInput,
        language: Option<Language>,
    ) -> FlowResult<AnalysisResult> {
        let attachment = attach(validation::parse_file_media(&media.data_uri)?, media);
        let mut prompt = prompts::ANALYZE_FILE_PROMPT.to_string();
        if let Some(language) = language {
            prompt.push_str(&prompts::explanation_language_line(language.name()));
        }
        self.run("analyzeFileForFraud", prompt, Some(attachment)).await
    }

    pub async fn analyze_video(
        &self,
        media: &MediaInput,
        language: Option<Language>,
    ) -> FlowResult<AnalysisResult> {
        let attachment = attach(validation::parse_video_media(&media.data_uri)?, media);
        let mut prompt = prompts::ANALYZE_VIDEO_PROMPT.to_string();
        if let Some(language) = language {
            prompt.push_str(&prompts::explanation_language_line(language.name()));
        }
        self.run("analyzeVideoForFraud", prompt, Some(attachment)).await
    }

    //=====================================================================================
    // Summaries
    //=====================================================================================

    pub async fn summarize(&self, request: &AnalysisRequest) -> FlowResult<SummaryResult> {
        let language = request.language;
        match &request.input {
            ContentInput::Text(text) => self.summarize_text(text, language).await,
            ContentInput::Link(url) => self.summarize_link(url, language).await,
            ContentInput::File(media) => self.summarize_file(media, language).await,
            ContentInput::Video(media) => self.summarize_video(media, language).await,
        }
    }

    pub async fn summarize_text(
        &self,
        text: &str,
        language: Option<Language>,
    ) -> FlowResult<SummaryResult> {
        let text = validation::require_text("Text", text)?;
        let language = language.unwrap_or_default();
        let prompt = prompts::render(
            prompts::SUMMARIZE_TEXT_PROMPT,
            &[("language", language.name()), ("text", text)],
        );
        self.run("summarizeText", prompt, None).await
    }

    pub async fn summarize_link(
        &self,
        url: &str,
        language: Option<Language>,
    ) -> FlowResult<SummaryResult> {
        let prompt = link_summary_prompt(url, language.unwrap_or_default())?;
        self.run(LINK_SUMMARY_PROMPT_NAME, prompt, None).await
    }

    pub async fn summarize_file(
        &self,
        media: &MediaInput,
        language: Option<Language>,
    ) -> FlowResult<SummaryResult> {
        let attachment = attach(validation::parse_file_media(&media.data_uri)?, media);
        let language = language.unwrap_or_default();
        let prompt = prompts::render(
            prompts::SUMMARIZE_FILE_PROMPT,
            &[("language", language.name())],
        );
        self.run("summarizeFileContent", prompt, Some(attachment)).await
    }

    pub async fn summarize_video(
        &self,
        media: &MediaInput,
        language: Option<Language>,
    ) -> FlowResult<SummaryResult> {
        let attachment = attach(validation::parse_video_media(&media.data_uri)?, media);
        let language = language.unwrap_or_default();
        let prompt = prompts::render(
            prompts::SUMMARIZE_VIDEO_PROMPT,
            &[("language", language.name())],
        );
        self.run("summarizeVideoContent", prompt, Some(attachment)).await
    }

    //=====================================================================================
    // Chat, News, Speech
    //=====================================================================================

    pub async fn chat(&self, language: Language, query: &str) -> FlowResult<ChatReply> {
        let query = validation::require_text("Message", query)?;
        let prompt = prompts::render(
            prompts::CHAT_PROMPT,
            &[("language", language.name()), ("query", query)],
        );
        self.run("multilingualChatbot", prompt, None).await
    }

    /// Produces a brand new feed on every call; nothing is cached between refreshes.
    pub async fn generate_news(&self) -> FlowResult<NewsFeed> {
        self.run("generateNewsArticles", prompts::news_prompt(NEWS_FEED_SIZE), None)
            .await
    }

    pub async fn speak(&self, text: &str) -> FlowResult<SpeechAudio> {
        let text = validation::require_text("Text", text)?;
        let audio = self.speech.generate_audio(text).await?;
        if audio.is_empty() {
            return Err(FlowError::MalformedOutput(
                "speech engine returned no audio".to_string(),
            ));
        }
        Ok(SpeechAudio {
            media: DataUri::from_bytes("audio/mpeg", &audio).into_string(),
        })
    }
}

fn attach(data_uri: DataUri, media: &MediaInput) -> MediaAttachment {
    MediaAttachment {
        data_uri,
        file_name: media.file_name.clone(),
    }
}

const LINK_SUMMARY_PROMPT_NAME: &str = "summarizeLinkContent";

fn link_summary_prompt(url: &str, language: Language) -> FlowResult<String> {
    let url = validation::parse_link(url)?;
    Ok(prompts::render(
        prompts::SUMMARIZE_LINK_PROMPT,
        &[("language", language.name()), ("url", url.as_str())],
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{InputKind, Verdict};
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every request it receives.
    #[derive(Default)]
    pub(crate) struct ScriptedModel {
        responses: Mutex<VecDeque<PortResult<Value>>>,
        pub(crate) requests: Mutex<Vec<GenerationRequest>>,
        /// MIME prefixes the model refuses to read.
        pub(crate) rejected_media: Vec<&'static str>,
    }

    impl ScriptedModel {
        pub(crate) fn with(responses: Vec<PortResult<Value>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                rejected_media: Vec::new(),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerativeModelService for ScriptedModel {
        async fn generate(&self, request: GenerationRequest) -> PortResult<Value> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PortError::Unexpected("no scripted response".into())))
        }

        fn accepts_media(&self, mime_type: &str) -> bool {
            !self.rejected_media.iter().any(|prefix| mime_type.starts_with(prefix))
        }
    }

    pub(crate) struct FixedSpeech(pub Vec<u8>);

    #[async_trait]
    impl TextToSpeechService for FixedSpeech {
        async fn generate_audio(&self, _text: &str) -> PortResult<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    fn service(model: Arc<ScriptedModel>) -> FlowService {
        FlowService::new(model, Arc::new(FixedSpeech(b"ID3".to_vec())))
    }

    fn fraudulent() -> Value {
        json!({
            "verdict": "Fraudulent",
            "fraudPercentage": 92,
            "explanation": "Sensational claim with no credible sourcing."
        })
    }

    fn text_request(text: &str) -> AnalysisRequest {
        AnalysisRequest {
            input: ContentInput::Text(text.to_string()),
            language: None,
        }
    }

    #[tokio::test]
    async fn analyze_text_passes_provider_output_through() {
        let model = ScriptedModel::with(vec![Ok(fraudulent())]);
        let flows = service(model.clone());

        let result = flows
            .analyze(&text_request("Obama secretly a robot"))
            .await
            .unwrap();

        assert_eq!(
            result,
            AnalysisResult {
                verdict: Verdict::Fraudulent,
                fraud_percentage: 92.0,
                explanation: "Sensational claim with no credible sourcing.".to_string(),
            }
        );
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("News Content: Obama secretly a robot"));
        assert_eq!(requests[0].output_schema, AnalysisResult::json_schema());
    }

    #[tokio::test]
    async fn blank_inputs_never_reach_the_provider() {
        let model = ScriptedModel::with(vec![]);
        let flows = service(model.clone());

        for input in [
            ContentInput::Text("   ".into()),
            ContentInput::Link("".into()),
            ContentInput::Link("  \t".into()),
            ContentInput::File(MediaInput {
                data_uri: "".into(),
                file_name: None,
            }),
            ContentInput::Video(MediaInput {
                data_uri: "data:image/png;base64,AAAA".into(),
                file_name: None,
            }),
        ] {
            let kind = input.kind();
            let err = flows
                .analyze(&AnalysisRequest { input, language: None })
                .await
                .unwrap_err();
            assert!(err.is_input_error(), "{:?} should be an input error", kind);
        }
        assert!(flows.chat(Language::Hindi, " ").await.unwrap_err().is_input_error());
        assert!(flows.speak("").await.unwrap_err().is_input_error());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn empty_url_is_rejected_before_any_call() {
        let model = ScriptedModel::with(vec![Ok(fraudulent())]);
        let flows = service(model.clone());
        let err = flows.analyze_link("", None).await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(ValidationError::Empty("URL"))));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn analyze_link_summarizes_then_analyzes_the_summary() {
        let model = ScriptedModel::with(vec![
            Ok(json!({ "summary": "The article claims a miracle cure." })),
            Ok(fraudulent()),
        ]);
        let flows = service(model.clone());

        let result = flows
            .analyze_link("https://example.com/cure", None)
            .await
            .unwrap();
        assert_eq!(result.verdict, Verdict::Fraudulent);

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].prompt_name, "summarizeLinkContent");
        assert!(requests[0].prompt.contains("URL: https://example.com/cure"));
        assert!(requests[0].prompt.contains("Language: English"));
        assert_eq!(requests[1].prompt_name, "analyzeNewsForFraud");
        assert!(requests[1].prompt.contains("The article claims a miracle cure."));
    }

    #[tokio::test]
    async fn analyze_link_stops_when_summary_fails() {
        let model = ScriptedModel::with(vec![Ok(json!({ "summary": "" }))]);
        let flows = service(model.clone());
        let err = flows
            .analyze_link("https://example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::UnreadableLink));
        assert!(err.is_input_error());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn analyze_link_treats_undecodable_summary_as_malformed() {
        let model = ScriptedModel::with(vec![Ok(json!({ "unexpected": 1 }))]);
        let flows = service(model.clone());
        let err = flows
            .analyze_link("https://example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::MalformedOutput(_)));
        assert!(!err.is_input_error());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn out_of_range_percentage_is_rejected() {
        let model = ScriptedModel::with(vec![Ok(json!({
            "verdict": "Fraudulent",
            "fraudPercentage": 140,
            "explanation": "x"
        }))]);
        let err = service(model).analyze_text("claim", None).await.unwrap_err();
        assert!(matches!(err, FlowError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced_once_without_retry() {
        let model = ScriptedModel::with(vec![
            Err(PortError::Unexpected("connection reset".into())),
            Ok(fraudulent()),
        ]);
        let flows = service(model.clone());
        let err = flows.analyze_text("claim", None).await.unwrap_err();
        assert!(matches!(err, FlowError::Provider(_)));
        assert!(!err.is_input_error());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn media_flows_attach_the_data_uri() {
        let model = ScriptedModel::with(vec![
            Ok(fraudulent()),
            Ok(json!({ "summary": "A clip of a rally." })),
        ]);
        let flows = service(model.clone());
        let video = MediaInput {
            data_uri: "data:video/mp4;base64,AAAA".into(),
            file_name: Some("rally.mp4".into()),
        };

        flows.analyze_video(&video, None).await.unwrap();
        let summary = flows
            .summarize_video(&video, Some(Language::Tamil))
            .await
            .unwrap();
        assert_eq!(summary.summary, "A clip of a rally.");

        let requests = model.requests.lock().unwrap();
        for request in requests.iter() {
            let attachment = request.media.as_ref().unwrap();
            assert_eq!(attachment.data_uri.mime_type(), "video/mp4");
            assert_eq!(attachment.file_name.as_deref(), Some("rally.mp4"));
        }
        assert!(requests[1].prompt.contains("in Tamil"));
    }

    #[tokio::test]
    async fn media_the_model_cannot_read_is_rejected_before_the_call() {
        let model = Arc::new(ScriptedModel {
            rejected_media: vec!["video/"],
            ..ScriptedModel::default()
        });
        let flows = service(model.clone());
        let video = MediaInput {
            data_uri: "data:video/mp4;base64,AAAA".into(),
            file_name: Some("rally.mp4".into()),
        };

        let err = flows.summarize_video(&video, None).await.unwrap_err();
        match &err {
            FlowError::InvalidInput(ValidationError::MediaNotAccepted(mime)) => {
                assert_eq!(mime, "video/mp4")
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.is_input_error());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn summarize_dispatches_on_input_kind_and_language() {
        let model = ScriptedModel::with(vec![Ok(json!({ "summary": "सारांश" }))]);
        let flows = service(model.clone());
        let request = AnalysisRequest {
            input: ContentInput::Text("Long article body".into()),
            language: Some(Language::Hindi),
        };
        assert_eq!(request.input.kind(), InputKind::Text);
        let result = flows.summarize(&request).await.unwrap();
        assert_eq!(result.summary, "सारांश");
        assert!(model.requests.lock().unwrap()[0].prompt.contains("in Hindi"));
    }

    #[tokio::test]
    async fn chat_uses_requested_language() {
        let model = ScriptedModel::with(vec![Ok(json!({ "response": "নমস্কার" }))]);
        let flows = service(model.clone());
        let reply = flows.chat(Language::Bengali, "hello").await.unwrap();
        assert_eq!(reply.response, "নমস্কার");
        let prompt = &model.requests.lock().unwrap()[0].prompt;
        assert!(prompt.contains("following language: Bengali"));
        assert!(prompt.contains("User Query: hello"));
    }

    #[tokio::test]
    async fn each_news_refresh_replaces_the_previous_feed() {
        let feed = |prefix: &str| {
            let articles: Vec<Value> = (1..=6)
                .map(|i| {
                    json!({
                        "id": format!("{prefix}-{i}"),
                        "title": format!("{prefix} headline {i}"),
                        "category": "Health",
                        "imageUrl": format!("https://picsum.photos/seed/{i}/600/400"),
                        "imageHint": "health news",
                        "description": "…",
                        "author": "Staff",
                        "date": "June 28, 2024"
                    })
                })
                .collect();
            json!({ "articles": articles })
        };
        let model = ScriptedModel::with(vec![Ok(feed("first")), Ok(feed("second"))]);
        let flows = service(model.clone());

        let first = flows.generate_news().await.unwrap();
        let second = flows.generate_news().await.unwrap();

        assert_eq!(first.articles.len(), 6);
        assert_eq!(second.articles.len(), 6);
        assert!(second.articles.iter().all(|a| a.id.starts_with("second-")));
        assert!(second
            .articles
            .iter()
            .all(|a| !first.articles.iter().any(|b| b.id == a.id)));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn speak_wraps_audio_as_a_data_uri() {
        let flows = service(ScriptedModel::with(vec![]));
        let audio = flows.speak("Namaste").await.unwrap();
        assert_eq!(audio.media, "data:audio/mpeg;base64,SUQz");
    }
}
