//! Client-facing HTTP API.
//!
//! - `GET  /api/get_info` – the caller's preference, or an empty body
//! - `POST /api/set_info` – replace the caller's preference
//! - `GET  /api/go`       – translate an existing post on demand
//!
//! Every request is refused with 501 while the provider is not configured.

use crate::config::ConfigHandle;
use crate::error::{ApiError, RelayError};
use crate::i18n::Language;
use crate::platform::PostSource;
use crate::preferences::{PreferenceStore, UserTranslationPreference};
use crate::relay::{Dispatcher, Translation};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Header through which the platform passes the authenticated user ID.
pub const CALLER_IDENTITY_HEADER: &str = "caller-identity";

#[derive(Clone)]
pub struct AppState {
    pub preferences: PreferenceStore,
    pub dispatcher: Dispatcher,
    pub posts: Arc<dyn PostSource>,
    pub config: ConfigHandle,
}

/// A post translated on request. Not stored anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslatedMessageRecord {
    pub id: String,
    pub post_id: String,
    #[serde(rename = "source_lang")]
    pub source_language: String,
    pub source_text: String,
    #[serde(rename = "target_lang")]
    pub target_language: String,
    pub translated_text: String,
    pub update_at: i64,
}

/// Cache-key style identifier for a translated revision of a post.
pub fn record_id(post_id: &str, source: &str, target: &str, update_at: i64) -> String {
    format!("{}:{}:{}:{}", post_id, source, target, update_at)
}

#[derive(Debug, Default, Deserialize)]
pub struct TranslateParams {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/get_info", get(get_info))
        .route("/api/set_info", post(set_info))
        .route("/api/go", get(translate_post))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_configuration,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Stop every request, routed or not, while the provider is unusable.
async fn require_configuration(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = state.config.snapshot().validate() {
        warn!("Refusing {} {}: {}", request.method(), request.uri().path(), e);
        return e.into_response();
    }
    next.run(request).await
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

fn caller_identity(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CALLER_IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, RelayError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RelayError::InvalidParameter(format!("{} is required", name)))
}

async fn get_info(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // Anonymous callers and users without a record get an empty body
    let Some(user_id) = caller_identity(&headers) else {
        return StatusCode::OK.into_response();
    };

    match state.preferences.get(user_id).await {
        Ok(preference) => Json(preference).into_response(),
        Err(RelayError::NoRecordFound(_)) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!("get_info for {}: {}", user_id, e);
            StatusCode::OK.into_response()
        }
    }
}

async fn set_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UserTranslationPreference>, JsonRejection>,
) -> Result<Json<UserTranslationPreference>, RelayError> {
    let user_id = caller_identity(&headers).ok_or(RelayError::Unauthorized)?;

    let Json(preference) =
        body.map_err(|e| RelayError::InvalidParameter(format!("info: {}", e.body_text())))?;

    if preference.user_id != user_id {
        return Err(RelayError::InvalidParameter("user mismatch".to_string()));
    }

    state.preferences.set(&preference).await?;
    Ok(Json(preference))
}

/// On-demand translation of one post between caller-chosen languages.
async fn translate_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<TranslateParams>, QueryRejection>,
) -> Result<Json<TranslatedMessageRecord>, RelayError> {
    let user_id = caller_identity(&headers).ok_or(RelayError::Unauthorized)?;

    let Query(params) = params.map_err(|e| RelayError::InvalidParameter(e.body_text()))?;
    let post_id = required(&params.post_id, "post_id")?;
    let source = required(&params.source, "source")?;
    let target = Language::from_code(required(&params.target, "target")?)
        .map_err(|e| RelayError::InvalidParameter(format!("target: {}", e)))?
        .code();
    if !Language::is_auto(source) {
        Language::from_code(source)
            .map_err(|e| RelayError::InvalidParameter(format!("source: {}", e)))?;
    }

    // Read once: text and update_at below describe the same revision
    let post = match state.posts.get_post(post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => return Err(RelayError::PostNotFound(post_id.to_string())),
        Err(e) => {
            warn!("Failed to fetch post {}: {}", post_id, e);
            return Err(RelayError::PostNotFound(post_id.to_string()));
        }
    };

    let source = state.dispatcher.resolve(&post.message, source).await?;
    let translated_text = match state
        .dispatcher
        .translate(&post.message, &source, target)
        .await?
    {
        Translation::Translated(text) => text,
        Translation::Skipped(_) => post.message.clone(),
    };

    info!(
        "Translated post {} for {} ({} → {})",
        post.id, user_id, source, target
    );

    Ok(Json(TranslatedMessageRecord {
        id: record_id(&post.id, &source, target, post.update_at),
        post_id: post.id,
        source_language: source,
        source_text: post.message,
        target_language: target.to_string(),
        translated_text,
        update_at: post.update_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_is_delimited() {
        assert_eq!(record_id("abc", "es", "en", 1700), "abc:es:en:1700");
        // Without a delimiter these two would collide
        assert_ne!(record_id("p1", "en", "fr", 1), record_id("p1e", "n", "fr", 1));
    }

    #[test]
    fn test_record_wire_names() {
        let record = TranslatedMessageRecord {
            id: "p:es:en:1".to_string(),
            post_id: "p".to_string(),
            source_language: "es".to_string(),
            source_text: "Hola".to_string(),
            target_language: "en".to_string(),
            translated_text: "Hello".to_string(),
            update_at: 1,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source_lang"], "es");
        assert_eq!(json["target_lang"], "en");
        assert_eq!(json["translated_text"], "Hello");
    }

    #[test]
    fn test_caller_identity() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_identity(&headers), None);

        headers.insert(CALLER_IDENTITY_HEADER, "  ".parse().unwrap());
        assert_eq!(caller_identity(&headers), None);

        headers.insert(CALLER_IDENTITY_HEADER, "u1".parse().unwrap());
        assert_eq!(caller_identity(&headers), Some("u1"));
    }

    #[test]
    fn test_required_params() {
        assert_eq!(required(&Some("x".to_string()), "post_id").unwrap(), "x");
        assert!(matches!(
            required(&None, "post_id"),
            Err(RelayError::InvalidParameter(_))
        ));
        assert!(required(&Some(" ".to_string()), "source").is_err());
    }
}
