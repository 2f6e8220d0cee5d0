//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which speech model the TTS adapter should request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsModel {
    Standard,
    HighDefinition,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    /// Base URL of an OpenAI-compatible endpoint; the public OpenAI API when unset.
    pub generative_api_base: Option<String>,
    pub generative_model: String,
    /// MIME types the model reads inline. Entries ending in `/` match a whole family.
    pub generative_media_types: Vec<String>,
    pub tts_model: TtsModel,
    pub tts_voice: String,
    /// The single browser origin allowed to call the API with credentials.
    pub allowed_origin: HeaderValue,
    pub session_ttl_days: i64,
    pub max_body_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generative Provider (API key optional here, checked by the server binary) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let generative_api_base = lookup("GENERATIVE_API_BASE").filter(|b| !b.trim().is_empty());
        let generative_model = var_or("GENERATIVE_MODEL", "gpt-4o-mini");
        let generative_media_types: Vec<String> =
            var_or("GENERATIVE_MEDIA_TYPES", "image/,application/pdf")
                .split(',')
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        if let Some(bad) = generative_media_types.iter().find(|t| !t.contains('/')) {
            return Err(ConfigError::InvalidValue(
                "GENERATIVE_MEDIA_TYPES".to_string(),
                format!("'{}' is not a MIME type or family like 'video/'", bad),
            ));
        }

        // --- Speech Settings ---
        let tts_model = match var_or("TTS_MODEL", "tts-1-hd").to_lowercase().as_str() {
            "tts-1" => TtsModel::Standard,
            "tts-1-hd" => TtsModel::HighDefinition,
            other => {
                return Err(ConfigError::InvalidValue(
                    "TTS_MODEL".to_string(),
                    format!("'{}' is not one of tts-1, tts-1-hd", other),
                ))
            }
        };
        let tts_voice = var_or("TTS_VOICE", "alloy");

        // --- Web Settings ---
        let allowed_origin_str = var_or("ALLOWED_ORIGIN", "http://localhost:3000");
        let allowed_origin = HeaderValue::from_str(allowed_origin_str.trim()).map_err(|e| {
            ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string())
        })?;
        let session_ttl_days = parse_number::<i64>(&lookup, "SESSION_TTL_DAYS", 30)?;
        if session_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                "must be positive".to_string(),
            ));
        }
        let max_body_bytes = parse_number::<usize>(&lookup, "MAX_BODY_BYTES", 25 * 1024 * 1024)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            generative_api_base,
            generative_model,
            generative_media_types,
            tts_model,
            tts_voice,
            allowed_origin,
            session_ttl_days,
            max_body_bytes,
        })
    }
}

fn parse_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/satyashodh")]).unwrap();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.generative_model, "gpt-4o-mini");
        assert_eq!(config.tts_model, TtsModel::HighDefinition);
        assert_eq!(config.tts_voice, "alloy");
        assert_eq!(config.allowed_origin, "http://localhost:3000");
        assert_eq!(config.session_ttl_days, 30);
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);
        assert!(config.openai_api_key.is_none());
        assert!(config.generative_api_base.is_none());
        assert_eq!(config.generative_media_types, ["image/", "application/pdf"]);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(var)) if var == "DATABASE_URL"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let base = ("DATABASE_URL", "postgres://localhost/db");
        for (key, value) in [
            ("BIND_ADDRESS", "nowhere"),
            ("RUST_LOG", "chatty"),
            ("TTS_MODEL", "tts-9"),
            ("SESSION_TTL_DAYS", "0"),
            ("MAX_BODY_BYTES", "lots"),
            ("ALLOWED_ORIGIN", "http://bad\norigin"),
            ("GENERATIVE_MEDIA_TYPES", "image/,video"),
        ] {
            match load(&[base, (key, value)]) {
                Err(ConfigError::InvalidValue(var, _)) => assert_eq!(var, key),
                other => panic!("{key}={value} gave {other:?}"),
            }
        }
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("OPENAI_API_KEY", "  "),
            ("GENERATIVE_API_BASE", "https://generativelanguage.googleapis.com/v1beta/openai"),
            ("GENERATIVE_MODEL", "gemini-2.0-flash"),
        ])
        .unwrap();
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.generative_model, "gemini-2.0-flash");
        assert!(config.generative_api_base.is_some());
    }

    #[test]
    fn media_types_are_trimmed_and_lowercased() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("GENERATIVE_MEDIA_TYPES", " Image/ , video/ ,,application/pdf"),
        ])
        .unwrap();
        assert_eq!(
            config.generative_media_types,
            ["image/", "video/", "application/pdf"]
        );
    }
}
