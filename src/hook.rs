//! Pre-publish interception of new messages.
//!
//! The platform hands every new post to the hook before storing it. The hook
//! never rejects a post: any lookup, detection or translation failure leaves
//! the message exactly as typed.

use crate::config::{ConfigHandle, DEFAULT_HOOK_DEADLINE_SECS};
use crate::error::{ApiError, RelayError};
use crate::platform::Post;
use crate::preferences::PreferenceStore;
use crate::relay::Dispatcher;
use crate::security::{secret_matches, HOOK_SECRET_HEADER};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

pub const MESSAGE_WILL_BE_POSTED_PATH: &str = "/hooks/message_will_be_posted";

#[derive(Clone)]
pub struct MessageHook {
    preferences: PreferenceStore,
    dispatcher: Dispatcher,
    config: ConfigHandle,
    deadline: Duration,
}

impl MessageHook {
    pub fn new(preferences: PreferenceStore, dispatcher: Dispatcher, config: ConfigHandle) -> Self {
        Self {
            preferences,
            dispatcher,
            config,
            deadline: Duration::from_secs(DEFAULT_HOOK_DEADLINE_SECS),
        }
    }

    /// Bound on the whole lookup, detection and translation for one post.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the post to publish and a rejection reason, which is always
    /// empty.
    pub async fn message_will_be_posted(&self, mut post: Post) -> (Post, String) {
        let outcome = tokio::time::timeout(self.deadline, self.translated_message(&post)).await;
        match outcome {
            Ok(Some(annotated)) => post.message = annotated,
            Ok(None) => {}
            Err(_) => warn!(
                "Post {} left untranslated: no result within {:?}",
                post.id, self.deadline
            ),
        }
        (post, String::new())
    }

    async fn translated_message(&self, post: &Post) -> Option<String> {
        if post.message.trim().is_empty() {
            return None;
        }

        let preference = match self.preferences.get(&post.user_id).await {
            Ok(preference) => preference,
            Err(RelayError::NoRecordFound(_)) => return None,
            Err(e) => {
                warn!("Ignoring preference for {}: {}", post.user_id, e);
                return None;
            }
        };

        if !preference.enabled {
            return None;
        }

        if !self.config.snapshot().is_configured() {
            debug!("Provider not configured, posting {} as typed", post.id);
            return None;
        }

        let source = match self
            .dispatcher
            .resolve(&post.message, &preference.source_language)
            .await
        {
            Ok(source) => source,
            Err(e) => {
                warn!("Post {} left untranslated: {}", post.id, e);
                return None;
            }
        };

        if source == preference.target_language {
            return None;
        }

        match self
            .dispatcher
            .annotate(&post.message, &source, &preference.target_language)
            .await
        {
            Ok(annotated) => annotated,
            Err(e) => {
                warn!("Post {} left untranslated: {}", post.id, e);
                None
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HookRequest {
    pub post: Post,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HookResponse {
    pub post: Post,
    pub rejection_reason: String,
}

#[derive(Clone)]
pub struct HookState {
    pub hook: Arc<MessageHook>,
    pub secret: Arc<str>,
}

/// Router for the private listener the platform calls.
pub fn router(state: HookState) -> Router {
    Router::new()
        .route(MESSAGE_WILL_BE_POSTED_PATH, post(message_will_be_posted))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn message_will_be_posted(
    State(state): State<HookState>,
    headers: HeaderMap,
    Json(request): Json<HookRequest>,
) -> Response {
    let presented = headers
        .get(HOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if !secret_matches(presented, &state.secret) {
        warn!("Rejected hook call with a missing or wrong secret");
        return ApiError::new("not_authorized", "Invalid hook secret", StatusCode::UNAUTHORIZED)
            .into_response();
    }

    let (post, rejection_reason) = state.hook.message_will_be_posted(request.post).await;
    Json(HookResponse {
        post,
        rejection_reason,
    })
    .into_response()
}
