//! crates/satyashodh_core/src/validation.rs
//!
//! Input checks that run before any call leaves the process.

use base64::Engine;
use url::Url;

use crate::domain::Language;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty.")]
    Empty(&'static str),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("Unsupported media type '{0}' for {1} input.")]
    UnsupportedMedia(String, &'static str),
    #[error("Unsupported language '{0}'.")]
    UnsupportedLanguage(String),
    #[error("Unsupported input kind '{0}'.")]
    UnsupportedKind(String),
    #[error("The configured AI model cannot read '{0}' files.")]
    MediaNotAccepted(String),
}

/// Returns the trimmed text, or an error naming the field if nothing is left.
pub fn require_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed)
}

/// Parses an absolute `http`/`https` URL with a host.
pub fn parse_link(value: &str) -> Result<Url, ValidationError> {
    let value = require_text("URL", value)?;
    let url = Url::parse(value).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl("URL has no host".to_string()));
    }
    Ok(url)
}

/// Resolves an optional language name, falling back to English.
pub fn parse_language(value: Option<&str>) -> Result<Language, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Language::default()),
        Some(name) => Language::from_name(name)
            .ok_or_else(|| ValidationError::UnsupportedLanguage(name.to_string())),
    }
}

//=========================================================================================
// Data URIs
//=========================================================================================

/// A MIME-tagged, base64-encoded binary payload: `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    uri: String,
}

impl DataUri {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = require_text("Data URI", value)?;
        let rest = value
            .strip_prefix("data:")
            .ok_or_else(|| ValidationError::InvalidDataUri("missing 'data:' prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ValidationError::InvalidDataUri("missing ',' separator".to_string()))?;
        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            ValidationError::InvalidDataUri("payload must be base64 encoded".to_string())
        })?;

        // Parameters such as `;charset=utf-8` may follow the MIME type.
        let mime_type = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !is_mime_type(&mime_type) {
            return Err(ValidationError::InvalidDataUri(format!(
                "'{}' is not a MIME type",
                media_type
            )));
        }
        if payload.is_empty() {
            return Err(ValidationError::InvalidDataUri("payload is empty".to_string()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ValidationError::InvalidDataUri(e.to_string()))?;

        Ok(Self {
            mime_type,
            uri: value.to_string(),
        })
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            uri: format!("data:{};base64,{}", mime_type, encoded),
            mime_type,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    pub fn into_string(self) -> String {
        self.uri
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

fn is_mime_type(value: &str) -> bool {
    match value.split_once('/') {
        Some((kind, sub)) => !kind.is_empty() && !sub.is_empty() && !sub.contains('/'),
        None => false,
    }
}

/// A document or image upload: anything that is not a video.
pub fn parse_file_media(value: &str) -> Result<DataUri, ValidationError> {
    let uri = DataUri::parse(value)?;
    if uri.is_video() {
        return Err(ValidationError::UnsupportedMedia(
            uri.mime_type().to_string(),
            "file",
        ));
    }
    Ok(uri)
}

pub fn parse_video_media(value: &str) -> Result<DataUri, ValidationError> {
    let uri = DataUri::parse(value)?;
    if !uri.is_video() {
        return Err(ValidationError::UnsupportedMedia(
            uri.mime_type().to_string(),
            "video",
        ));
    }
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_text_is_rejected() {
        assert_eq!(
            require_text("Text content", "  \n\t "),
            Err(ValidationError::Empty("Text content"))
        );
        assert_eq!(require_text("Text content", "  hi "), Ok("hi"));
    }

    #[test]
    fn links_need_http_scheme_and_host() {
        assert!(parse_link("https://example.com/story").is_ok());
        assert!(parse_link("http://news.example.org").is_ok());
        assert_eq!(parse_link(""), Err(ValidationError::Empty("URL")));
        assert!(matches!(parse_link("not a url"), Err(ValidationError::InvalidUrl(_))));
        assert!(matches!(parse_link("ftp://example.com"), Err(ValidationError::InvalidUrl(_))));
        assert!(matches!(
            parse_link("mailto:someone@example.com"),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn data_uri_parses_browser_output() {
        let uri = DataUri::parse("data:application/pdf;base64,JVBERi0xLjQ=").unwrap();
        assert_eq!(uri.mime_type(), "application/pdf");
        assert!(!uri.is_video());

        let with_params = DataUri::parse("data:text/plain;charset=utf-8;base64,aGVsbG8=").unwrap();
        assert_eq!(with_params.mime_type(), "text/plain");
    }

    #[test]
    fn data_uri_rejects_malformed_input() {
        for bad in [
            "aGVsbG8=",
            "data:text/plain,hello",
            "data:;base64,aGVsbG8=",
            "data:text/plain;base64,",
            "data:text/plain;base64,@@not-base64@@",
        ] {
            assert!(
                matches!(DataUri::parse(bad), Err(ValidationError::InvalidDataUri(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn media_kind_is_checked_against_input_kind() {
        let video = "data:video/mp4;base64,AAAA";
        let image = "data:image/png;base64,iVBORw==";
        assert!(parse_video_media(video).is_ok());
        assert!(matches!(
            parse_video_media(image),
            Err(ValidationError::UnsupportedMedia(_, "video"))
        ));
        assert!(parse_file_media(image).is_ok());
        assert!(matches!(
            parse_file_media(video),
            Err(ValidationError::UnsupportedMedia(_, "file"))
        ));
    }

    #[test]
    fn from_bytes_round_trips_through_parse() {
        let uri = DataUri::from_bytes("audio/mpeg", b"ID3");
        assert_eq!(uri.as_str(), "data:audio/mpeg;base64,SUQz");
        assert_eq!(DataUri::parse(uri.as_str()).unwrap(), uri);
    }

    #[test]
    fn language_defaults_to_english_and_rejects_unknown_names() {
        assert_eq!(parse_language(None), Ok(Language::English));
        assert_eq!(parse_language(Some("  ")), Ok(Language::English));
        assert_eq!(parse_language(Some("hindi")), Ok(Language::Hindi));
        assert_eq!(parse_language(Some("Malayalam")), Ok(Language::Malayalam));
        assert!(matches!(
            parse_language(Some("Klingon")),
            Err(ValidationError::UnsupportedLanguage(_))
        ));
    }
}
