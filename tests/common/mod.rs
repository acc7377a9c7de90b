//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use translate_relay::api::{self, AppState, CALLER_IDENTITY_HEADER};
use translate_relay::config::{ConfigHandle, ProviderSettings};
use translate_relay::db::MemoryStore;
use translate_relay::hook::MessageHook;
use translate_relay::platform::{EventBus, MemoryPosts, PlatformEvent};
use translate_relay::preferences::{PreferenceStore, UserTranslationPreference};
use translate_relay::provider::{DetectedLanguage, LanguageProvider, ProviderError};
use translate_relay::relay::Dispatcher;

pub const USER: &str = "abcdefghijklmnopqrstuvwxyz";
pub const OTHER_USER: &str = "zyxwvutsrqponmlkjihgfedcba";

/// Provider stub with a fixed detection answer and a translation table.
/// Text missing from the table is echoed back unchanged.
#[derive(Default)]
pub struct ScriptedProvider {
    detected: Vec<(&'static str, f32)>,
    translations: Vec<(&'static str, &'static str, &'static str)>,
    fail_translation: bool,
    detect_calls: AtomicUsize,
    translate_calls: AtomicUsize,
    last_pair: std::sync::Mutex<Option<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detecting(mut self, code: &'static str) -> Self {
        self.detected.push((code, 0.9));
        self
    }

    /// `text` translated into `target` becomes `result`.
    pub fn translating(
        mut self,
        text: &'static str,
        target: &'static str,
        result: &'static str,
    ) -> Self {
        self.translations.push((text, target, result));
        self
    }

    pub fn failing_translation(mut self) -> Self {
        self.fail_translation = true;
        self
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn last_pair(&self) -> Option<(String, String)> {
        self.last_pair.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageProvider for ScriptedProvider {
    async fn detect_language(&self, _text: &str) -> Result<Vec<DetectedLanguage>, ProviderError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .detected
            .iter()
            .map(|(code, score)| DetectedLanguage {
                code: code.to_string(),
                score: *score,
            })
            .collect())
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_pair.lock().unwrap() = Some((source.to_string(), target.to_string()));

        if self.fail_translation {
            return Err(ProviderError::Api {
                status: 400,
                body: "unsupported language pair".to_string(),
            });
        }

        Ok(self
            .translations
            .iter()
            .find(|(t, tgt, _)| *t == text && *tgt == target)
            .map(|(_, _, result)| result.to_string())
            .unwrap_or_else(|| text.to_string()))
    }
}

pub fn configured() -> ProviderSettings {
    ProviderSettings {
        api_key: Some("test-api-key".to_string()),
        api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        model: "gpt-4o-mini".to_string(),
        timeout: Duration::from_secs(1),
    }
}

pub fn unconfigured() -> ProviderSettings {
    ProviderSettings {
        api_key: None,
        ..configured()
    }
}

pub fn preference(enabled: bool, source: &str, target: &str) -> UserTranslationPreference {
    UserTranslationPreference {
        user_id: USER.to_string(),
        enabled,
        source_language: source.to_string(),
        target_language: target.to_string(),
    }
}

/// Everything a test needs, wired in-process.
pub struct Harness {
    pub provider: Arc<ScriptedProvider>,
    pub kv: Arc<MemoryStore>,
    pub posts: Arc<MemoryPosts>,
    pub bus: EventBus,
    pub config: ConfigHandle,
    pub preferences: PreferenceStore,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub fn new(provider: ScriptedProvider) -> Self {
        Self::with_settings(provider, configured())
    }

    pub fn with_settings(provider: ScriptedProvider, settings: ProviderSettings) -> Self {
        let provider = Arc::new(provider);
        let kv = Arc::new(MemoryStore::new());
        let bus = EventBus::default();
        let preferences = PreferenceStore::new(kv.clone(), Arc::new(bus.clone()));
        Self {
            dispatcher: Dispatcher::new(provider.clone()),
            provider,
            kv,
            posts: Arc::new(MemoryPosts::new()),
            bus,
            config: ConfigHandle::new(settings),
            preferences,
        }
    }

    pub fn events(&self) -> Receiver<PlatformEvent> {
        self.bus.subscribe()
    }

    pub fn hook(&self) -> MessageHook {
        MessageHook::new(
            self.preferences.clone(),
            self.dispatcher.clone(),
            self.config.clone(),
        )
    }

    pub fn api(&self) -> Router {
        api::router(AppState {
            preferences: self.preferences.clone(),
            dispatcher: self.dispatcher.clone(),
            posts: self.posts.clone(),
            config: self.config.clone(),
        })
    }
}

pub fn get(uri: &str, caller: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_IDENTITY_HEADER, caller);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, caller: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(caller) = caller {
        builder = builder.header(CALLER_IDENTITY_HEADER, caller);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
