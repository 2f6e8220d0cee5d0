//! services/api/src/adapters/generative_llm.rs
//!
//! This module contains the adapter for the structured-output LLM behind every flow.
//! It implements the `GenerativeModelService` port from the `core` crate against any
//! OpenAI-compatible chat completions endpoint, asking for JSON that follows the
//! schema carried by the request.

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use satyashodh_core::ports::{GenerationRequest, GenerativeModelService, PortError, PortResult};
use serde_json::{json, Value};
use tracing::{debug, error};

const SYSTEM_INSTRUCTIONS: &str = "You are SatyaShodh, an assistant that helps people recognise \
misinformation. Always answer with a single JSON object that matches the requested schema.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeModelService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerativeAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    media_types: Vec<String>,
}

impl OpenAiGenerativeAdapter {
    /// Creates a new `OpenAiGenerativeAdapter`.
    ///
    /// `media_types` lists the MIME types the configured endpoint reads inline. An entry
    /// ending in `/` (such as `image/`) covers the whole family.
    pub fn new(client: Client<OpenAIConfig>, model: String, media_types: Vec<String>) -> Self {
        Self {
            client,
            model,
            media_types,
        }
    }
}

pub(crate) fn media_type_listed(media_types: &[String], mime_type: &str) -> bool {
    media_types.iter().any(|listed| {
        if listed.ends_with('/') {
            mime_type.starts_with(listed.as_str())
        } else {
            mime_type == listed
        }
    })
}

/// Builds the chat completion body: the prompt, any inline media, and the schema.
pub(crate) fn build_request_body(model: &str, request: &GenerationRequest) -> Value {
    let mut content = vec![json!({ "type": "text", "text": request.prompt })];
    if let Some(media) = &request.media {
        let data_uri = &media.data_uri;
        if data_uri.mime_type().starts_with("image/") {
            content.push(json!({
                "type": "image_url",
                "image_url": { "url": data_uri.as_str() }
            }));
        } else {
            let filename = media
                .file_name
                .clone()
                .unwrap_or_else(|| default_file_name(data_uri.mime_type()));
            content.push(json!({
                "type": "file",
                "file": { "filename": filename, "file_data": data_uri.as_str() }
            }));
        }
    }

    json!({
        "model": model,
        "n": 1,
        "messages": [
            { "role": "system", "content": SYSTEM_INSTRUCTIONS },
            { "role": "user", "content": content }
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": request.prompt_name,
                "schema": request.output_schema,
                "strict": true
            }
        }
    })
}

// Providers sniff the format from the extension, so a bare name is not enough.
fn default_file_name(mime_type: &str) -> String {
    let extension = mime_type
        .split_once('/')
        .map(|(_, subtype)| subtype.split(['+', '.']).next().unwrap_or(subtype))
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or("bin");
    format!("upload.{}", extension)
}

/// Pulls the JSON document out of the first choice of a chat completion response.
pub(crate) fn extract_structured_output(response: &Value) -> PortResult<Value> {
    let message = response
        .pointer("/choices/0/message")
        .ok_or_else(|| {
            PortError::Unexpected("LLM returned no choices in its response.".to_string())
        })?;

    if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
        return Err(PortError::Unexpected(format!("LLM refused the request: {}", refusal)));
    }

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            PortError::Unexpected("LLM response contained no text content.".to_string())
        })?;

    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| PortError::Unexpected(format!("LLM response was not valid JSON: {}", e)))
}

// Some compatible endpoints wrap JSON in a markdown fence even in schema mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

//=========================================================================================
// `GenerativeModelService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeModelService for OpenAiGenerativeAdapter {
    async fn generate(&self, request: GenerationRequest) -> PortResult<Value> {
        debug!(prompt_name = request.prompt_name, model = %self.model, "Sending structured prompt");
        let body = build_request_body(&self.model, &request);

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response: Value = self
            .client
            .chat()
            .create_byot(body)
            .await
            .map_err(|e: OpenAIError| {
                error!(prompt_name = request.prompt_name, "LLM call failed: {}", e);
                PortError::Unexpected(e.to_string())
            })?;

        extract_structured_output(&response)
    }

    fn accepts_media(&self, mime_type: &str) -> bool {
        media_type_listed(&self.media_types, mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satyashodh_core::{ports::MediaAttachment, validation::DataUri};

    fn attachment(mime_type: &str, bytes: &[u8], file_name: Option<&str>) -> MediaAttachment {
        MediaAttachment {
            data_uri: DataUri::from_bytes(mime_type, bytes),
            file_name: file_name.map(str::to_string),
        }
    }

    fn request(media: Option<MediaAttachment>) -> GenerationRequest {
        GenerationRequest {
            prompt_name: "analyzeFileForFraud",
            prompt: "Analyze this.".to_string(),
            media,
            output_schema: json!({ "type": "object" }),
        }
    }

    #[test]
    fn body_carries_schema_and_prompt() {
        let body = build_request_body("gpt-4o-mini", &request(None));
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"]["json_schema"]["name"], "analyzeFileForFraud");
        assert_eq!(body["response_format"]["json_schema"]["schema"], json!({ "type": "object" }));
        assert_eq!(body["messages"][1]["content"][0]["text"], "Analyze this.");
        assert_eq!(body["messages"][1]["content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn images_and_documents_use_different_parts() {
        let image = attachment("image/png", b"png", Some("chart.png"));
        let body = build_request_body("m", &request(Some(image.clone())));
        assert_eq!(body["messages"][1]["content"][1]["type"], "image_url");
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            image.data_uri.as_str()
        );

        let pdf = attachment("application/pdf", b"%PDF", Some("claims.pdf"));
        let body = build_request_body("m", &request(Some(pdf.clone())));
        let part = &body["messages"][1]["content"][1];
        assert_eq!(part["type"], "file");
        assert_eq!(part["file"]["filename"], "claims.pdf");
        assert_eq!(part["file"]["file_data"], pdf.data_uri.as_str());
    }

    #[test]
    fn video_goes_out_as_a_named_file_part() {
        let clip = attachment("video/mp4", b"\x00\x00\x00\x18ftypmp42", Some("rally.mp4"));
        let body = build_request_body("m", &request(Some(clip.clone())));
        let part = &body["messages"][1]["content"][1];
        assert_eq!(part["type"], "file");
        assert_eq!(part["file"]["filename"], "rally.mp4");
        assert_eq!(part["file"]["file_data"], clip.data_uri.as_str());

        // A pasted data URI has no name; one is derived from the MIME type.
        let unnamed = attachment("video/webm", b"webm", None);
        let body = build_request_body("m", &request(Some(unnamed)));
        assert_eq!(body["messages"][1]["content"][1]["file"]["filename"], "upload.webm");
    }

    #[test]
    fn default_names_carry_an_extension() {
        assert_eq!(default_file_name("application/pdf"), "upload.pdf");
        assert_eq!(default_file_name("image/svg+xml"), "upload.svg");
        assert_eq!(default_file_name("weird"), "upload.bin");
    }

    #[test]
    fn media_allow_list_matches_families_and_exact_types() {
        let listed = vec!["image/".to_string(), "application/pdf".to_string()];
        assert!(media_type_listed(&listed, "image/png"));
        assert!(media_type_listed(&listed, "application/pdf"));
        assert!(!media_type_listed(&listed, "video/mp4"));
        assert!(!media_type_listed(&listed, "application/pdfx"));

        let adapter = OpenAiGenerativeAdapter::new(
            Client::with_config(OpenAIConfig::new()),
            "gemini-2.0-flash".to_string(),
            vec!["video/".to_string()],
        );
        assert!(adapter.accepts_media("video/mp4"));
        assert!(!adapter.accepts_media("image/png"));
    }

    #[test]
    fn extracts_json_from_first_choice() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"summary\":\"ok\"}" } }]
        });
        assert_eq!(extract_structured_output(&response).unwrap(), json!({ "summary": "ok" }));
    }

    #[test]
    fn tolerates_fenced_json() {
        let response = json!({
            "choices": [{ "message": { "content": "```json\n{\"summary\":\"ok\"}\n```" } }]
        });
        assert_eq!(extract_structured_output(&response).unwrap(), json!({ "summary": "ok" }));
    }

    #[test]
    fn refusals_and_garbage_are_errors() {
        let refused = json!({
            "choices": [{ "message": { "content": null, "refusal": "I can't help with that." } }]
        });
        assert!(extract_structured_output(&refused).is_err());

        let prose = json!({ "choices": [{ "message": { "content": "Sure! Here you go." } }] });
        assert!(extract_structured_output(&prose).is_err());

        assert!(extract_structured_output(&json!({ "choices": [] })).is_err());
    }
}
