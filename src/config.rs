//! Runtime configuration
//!
//! Loaded from `.env` and the process environment. The Gemini credential is
//! mandatory: without it the application refuses to start.

use crate::error::CoachError;
use crate::Result;
use std::env;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_MIN_SUGGESTION_CHARS: usize = 3;
const DEFAULT_QUIZ_QUESTIONS: usize = 3;
const DEFAULT_CHAT_HISTORY_WINDOW: usize = 20;

/// Placeholder shipped in `.env.example`; treated the same as a missing key
const PLACEHOLDER_KEY: &str = "your_gemini_api_key_here";

#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Upper bound on any single advisory call, on opening a chat stream and
    /// on each wait for the next chat delta
    pub request_timeout: Duration,
    pub suggestion_debounce: Duration,
    pub min_suggestion_chars: usize,
    pub quiz_question_count: usize,
    /// Completed chat exchanges (user + assistant turns) replayed to the service
    pub chat_history_window: usize,
}

impl CoachConfig {
    /// Build a config with defaults around an explicit credential
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() || api_key == PLACEHOLDER_KEY {
            return Err(CoachError::Config(
                "GEMINI_API_KEY is not set. Add it to your environment or .env file".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            suggestion_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_suggestion_chars: DEFAULT_MIN_SUGGESTION_CHARS,
            quiz_question_count: DEFAULT_QUIZ_QUESTIONS,
            chat_history_window: DEFAULT_CHAT_HISTORY_WINDOW,
        })
    }

    /// Load configuration from `.env` and environment variables
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let mut config = Self::new(api_key)?;

        if let Ok(model) = env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }

        if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(ms) = parse_var::<u64>("ADVISORY_TIMEOUT_MS")? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("SUGGESTION_DEBOUNCE_MS")? {
            config.suggestion_debounce = Duration::from_millis(ms);
        }
        if let Some(count) = parse_var::<usize>("QUIZ_QUESTION_COUNT")? {
            if count == 0 {
                return Err(CoachError::Config(
                    "QUIZ_QUESTION_COUNT must be at least 1".to_string(),
                ));
            }
            config.quiz_question_count = count;
        }
        if let Some(window) = parse_var::<usize>("CHAT_HISTORY_WINDOW")? {
            config.chat_history_window = window;
        }

        info!(
            model = %config.model,
            timeout_ms = config.request_timeout.as_millis() as u64,
            "Coach configuration loaded"
        );

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            debug!(%name, %raw, "Overriding default from environment");
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| CoachError::Config(format!("{} has an invalid value: {}", name, raw)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_prevents_startup() {
        let err = CoachConfig::new("   ").unwrap_err();
        assert!(matches!(err, CoachError::Config(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_placeholder_key_rejected() {
        assert!(CoachConfig::new(PLACEHOLDER_KEY).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = CoachConfig::new("test-key").unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.suggestion_debounce, Duration::from_millis(500));
        assert_eq!(config.min_suggestion_chars, 3);
        assert_eq!(config.quiz_question_count, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
