//! The host messaging platform as seen by the relay.
//!
//! The relay needs two things from the platform: reading a post by ID and
//! pushing an event to a user's sessions. Both sit behind traits so the
//! service can run against the real platform over HTTP or fully in-process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{debug, warn};

/// Event name sent when a user's translation preference changes.
pub const INFO_CHANGE_EVENT: &str = "info_change";

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Request(String),

    #[error("platform API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid platform response: {0}")]
    InvalidResponse(String),

    #[error("event channel closed")]
    ChannelClosed,
}

/// A chat message. Fields the relay does not use are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    pub fn new(id: &str, user_id: &str, message: &str, update_at: i64) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            message: message.to_string(),
            create_at: update_at,
            update_at,
            extra: serde_json::Map::new(),
        }
    }
}

/// Who receives an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Broadcast {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformEvent {
    pub event: String,
    pub data: serde_json::Value,
    pub broadcast: Broadcast,
}

#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch a post. `Ok(None)` means the platform has no such post.
    async fn get_post(&self, post_id: &str) -> Result<Option<Post>, PlatformError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: PlatformEvent) -> Result<(), PlatformError>;
}

/// HTTP client for the host platform's REST API.
#[derive(Clone)]
pub struct PlatformClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PlatformClient {
    pub fn new(client: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Platform IDs are alphanumeric; anything else cannot name a post.
fn is_valid_post_id(post_id: &str) -> bool {
    !post_id.is_empty() && post_id.chars().all(|c| c.is_ascii_alphanumeric())
}

#[async_trait]
impl PostSource for PlatformClient {
    async fn get_post(&self, post_id: &str) -> Result<Option<Post>, PlatformError> {
        if !is_valid_post_id(post_id) {
            debug!("Rejecting malformed post id {:?}", post_id);
            return Ok(None);
        }

        let url = format!("{}/api/v4/posts/{}", self.base_url, post_id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let post = response
            .json::<Post>()
            .await
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Ok(Some(post))
    }
}

#[async_trait]
impl EventPublisher for PlatformClient {
    async fn publish(&self, event: PlatformEvent) -> Result<(), PlatformError> {
        let url = format!("{}/api/v4/relay/events", self.base_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(&event)
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// In-process post table.
#[derive(Debug, Default)]
pub struct MemoryPosts {
    posts: RwLock<HashMap<String, Post>>,
}

impl MemoryPosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post: Post) {
        match self.posts.write() {
            Ok(mut posts) => {
                posts.insert(post.id.clone(), post);
            }
            Err(_) => warn!("Post table lock poisoned, dropped post {}", post.id),
        }
    }
}

#[async_trait]
impl PostSource for MemoryPosts {
    async fn get_post(&self, post_id: &str) -> Result<Option<Post>, PlatformError> {
        let posts = self
            .posts
            .read()
            .map_err(|_| PlatformError::Request("post table lock poisoned".to_string()))?;
        Ok(posts.get(post_id).cloned())
    }
}

/// In-process event bus built on `tokio::sync::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<PlatformEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_BUS_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: PlatformEvent) -> Result<(), PlatformError> {
        // No subscribers is not an error: nobody is listening for that user
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!("Event delivered to {} subscriber(s)", delivered);
        Ok(())
    }
}

/// Post lookup and event delivery for one process.
///
/// With a platform URL both go over HTTP. Without one, posts come from an
/// empty in-process table and events go to an in-process bus.
pub fn connect(
    client: reqwest::Client,
    platform_url: Option<&str>,
    token: Option<String>,
) -> (Arc<dyn PostSource>, Arc<dyn EventPublisher>) {
    match platform_url {
        Some(url) => {
            let platform = Arc::new(PlatformClient::new(client, url, token));
            (platform.clone(), platform)
        }
        None => {
            warn!("PLATFORM_URL not set, running without a host platform");
            (Arc::new(MemoryPosts::new()), Arc::new(EventBus::default()))
        }
    }
}
