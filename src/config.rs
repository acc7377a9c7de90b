use crate::error::RelayError;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_TRANSLATION_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TRANSLATION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TRANSLATION_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_HOOK_DEADLINE_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    // Listeners
    pub port: u16,
    pub hook_port: u16,
    pub hook_secret: String,
    /// Longest a post may wait on translation before it goes out as typed
    pub hook_deadline: Duration,

    // Storage (in-memory when unset)
    pub database_url: Option<String>,

    // Host platform
    pub platform_url: Option<String>,
    pub platform_token: Option<String>,

    // Detection/translation capability
    pub provider: ProviderSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            hook_port: std::env::var("HOOK_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8081),
            hook_secret: std::env::var("HOOK_SECRET").context("HOOK_SECRET not set")?,
            hook_deadline: Duration::from_secs(
                std::env::var("HOOK_DEADLINE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_HOOK_DEADLINE_SECS),
            ),

            database_url: non_empty_var("DATABASE_URL"),

            platform_url: non_empty_var("PLATFORM_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            platform_token: non_empty_var("PLATFORM_TOKEN"),

            provider: ProviderSettings::from_env(),
        })
    }
}

/// Settings for the remote detection/translation capability.
///
/// These may be missing at startup; requests are refused with 501 until a
/// valid snapshot is swapped in.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_var("TRANSLATION_API_KEY"),
            api_url: std::env::var("TRANSLATION_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATION_API_URL.to_string()),
            model: std::env::var("TRANSLATION_MODEL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATION_MODEL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("TRANSLATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TRANSLATION_TIMEOUT_SECS),
            ),
        }
    }

    /// Check that credentials and endpoint are usable.
    pub fn validate(&self) -> Result<(), RelayError> {
        match self.api_key.as_deref() {
            None | Some("") => {
                return Err(RelayError::Unconfigured(
                    "TRANSLATION_API_KEY is not set".to_string(),
                ))
            }
            Some(_) => {}
        }

        if !(self.api_url.starts_with("https://") || self.api_url.starts_with("http://")) {
            return Err(RelayError::Unconfigured(format!(
                "TRANSLATION_API_URL is not an http(s) URL: '{}'",
                self.api_url
            )));
        }

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Live provider settings shared by every request.
///
/// Readers take an `Arc` snapshot without locking; a reload swaps the whole
/// snapshot at once, so a request never sees a half-updated configuration.
#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<ArcSwap<ProviderSettings>>,
}

impl ConfigHandle {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    pub fn snapshot(&self) -> Arc<ProviderSettings> {
        self.current.load_full()
    }

    pub fn replace(&self, settings: ProviderSettings) {
        self.current.store(Arc::new(settings));
    }

    /// Re-read provider settings from `.env` and the process environment.
    pub fn reload_from_env(&self) {
        let _ = dotenvy::dotenv_override();
        let settings = ProviderSettings::from_env();
        info!(
            "Provider configuration reloaded (configured: {}, model: {})",
            settings.is_configured(),
            settings.model
        );
        self.replace(settings);
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
