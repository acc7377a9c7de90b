//! Language detection and translation capability.
//!
//! The relay only ever talks to a `LanguageProvider`; which remote service
//! sits behind it is a deployment choice.

mod chat;

pub use chat::ChatCompletionsProvider;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider is not configured: {0}")]
    Unconfigured(String),

    #[error("request to provider failed: {0}")]
    Request(String),

    #[error("provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Transport failures, rate limiting and 5xx responses are worth another
    /// attempt; other 4xx responses and malformed replies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Request(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Unconfigured(_) | ProviderError::InvalidResponse(_) => false,
        }
    }
}

/// One language candidate returned by detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    pub code: String,
    /// Confidence in `[0, 1]`
    pub score: f32,
}

#[async_trait]
pub trait LanguageProvider: Send + Sync {
    /// Detect the language(s) of `text`. May return no candidates.
    async fn detect_language(&self, text: &str) -> Result<Vec<DetectedLanguage>, ProviderError>;

    /// Translate `text` from `source` to `target` (both concrete codes).
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, ProviderError>;
}
