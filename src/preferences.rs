//! Per-user translation preferences.
//!
//! A preference is stored as JSON under the user's ID. Every successful
//! write is announced to that user with an `info_change` event.

use crate::db::KvStore;
use crate::error::{RelayError, ValidationError};
use crate::i18n::{Language, LanguageRegistry, AUTO_LANGUAGE};
use crate::platform::{Broadcast, EventPublisher, PlatformEvent, INFO_CHANGE_EVENT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Length of a platform user ID.
pub const USER_ID_LEN: usize = 26;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserTranslationPreference {
    pub user_id: String,
    #[serde(rename = "activated", alias = "enabled")]
    pub enabled: bool,
    pub source_language: String,
    pub target_language: String,
}

impl UserTranslationPreference {
    /// The record created on first activation: auto-detect into English.
    pub fn new_default(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            enabled: true,
            source_language: AUTO_LANGUAGE.to_string(),
            target_language: Language::ENGLISH.code().to_string(),
        }
    }

    /// Check every invariant, reporting the first field that fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.chars().count() != USER_ID_LEN {
            return Err(ValidationError::UserId);
        }

        if self.source_language.is_empty() {
            return Err(ValidationError::EmptySource);
        }

        if self.target_language.is_empty() {
            return Err(ValidationError::EmptyTarget);
        }

        if Language::is_auto(&self.target_language) {
            return Err(ValidationError::AutoTarget);
        }

        let registry = LanguageRegistry::get();
        if !Language::is_auto(&self.source_language)
            && !registry.is_supported(&self.source_language)
        {
            return Err(ValidationError::UnsupportedSource);
        }

        if !registry.is_supported(&self.target_language) {
            return Err(ValidationError::UnsupportedTarget);
        }

        if self.source_language == self.target_language {
            return Err(ValidationError::SameLanguage);
        }

        Ok(())
    }

    /// Human-readable on/off state, used in log lines.
    pub fn activated_label(&self) -> &'static str {
        if self.enabled {
            "on"
        } else {
            "off"
        }
    }

    fn change_event(&self) -> PlatformEvent {
        PlatformEvent {
            event: INFO_CHANGE_EVENT.to_string(),
            data: serde_json::json!({
                "user_id": self.user_id,
                "activated": self.enabled,
                "source_language": self.source_language,
                "target_language": self.target_language,
            }),
            broadcast: Broadcast {
                user_id: self.user_id.clone(),
            },
        }
    }
}

/// Durable preference storage plus change notification.
#[derive(Clone)]
pub struct PreferenceStore {
    kv: Arc<dyn KvStore>,
    events: Arc<dyn EventPublisher>,
}

impl PreferenceStore {
    pub fn new(kv: Arc<dyn KvStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self { kv, events }
    }

    /// Read a user's preference.
    ///
    /// Fails with `NoRecordFound` when nothing is stored (or the store cannot
    /// be read) and `Corrupt` when the stored bytes are not a preference.
    pub async fn get(&self, user_id: &str) -> Result<UserTranslationPreference, RelayError> {
        let bytes = match self.kv.get(user_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Err(RelayError::NoRecordFound(user_id.to_string())),
            Err(e) => {
                warn!("Failed to read preference for {}: {}", user_id, e);
                return Err(RelayError::NoRecordFound(user_id.to_string()));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| RelayError::Corrupt {
            user_id: user_id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate, persist, then announce a preference.
    ///
    /// Nothing is written or announced when validation or the write fails.
    pub async fn set(&self, preference: &UserTranslationPreference) -> Result<(), RelayError> {
        preference.validate()?;

        let bytes = serde_json::to_vec(preference)
            .map_err(|e| RelayError::Persist(format!("unable to marshal json: {}", e)))?;

        self.kv
            .set(&preference.user_id, &bytes)
            .await
            .map_err(|e| RelayError::Persist(e.to_string()))?;

        info!(
            "Preference saved for {} (translation {}, {} → {})",
            preference.user_id,
            preference.activated_label(),
            preference.source_language,
            preference.target_language
        );

        // The write stands even if the user's sessions cannot be told about it
        if let Err(e) = self.events.publish(preference.change_event()).await {
            warn!(
                "Failed to announce preference change for {}: {}",
                preference.user_id, e
            );
        }

        Ok(())
    }

    /// Return the user's preference, creating the default one on first use.
    pub async fn activate(&self, user_id: &str) -> Result<UserTranslationPreference, RelayError> {
        match self.get(user_id).await {
            Ok(existing) => Ok(existing),
            Err(RelayError::NoRecordFound(_)) => {
                let preference = UserTranslationPreference::new_default(user_id);
                self.set(&preference).await?;
                Ok(preference)
            }
            Err(e) => Err(e),
        }
    }
}
