use crate::error::RelayError;
use crate::i18n::{LanguageRegistry, TranslationMetrics};
use crate::provider::LanguageProvider;
use crate::relay::resolve_source_language;
use std::sync::Arc;
use tracing::debug;

/// Why a dispatch left the message alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source and target are the same language; the provider was not called
    SameLanguage,
    /// The provider echoed the input back unchanged
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Skipped(SkipReason),
    Translated(String),
}

/// Render the annotated message clients expect:
///
/// ```text
/// {original}
///
/// (Translated: {source name} → {target name})
/// {translated}
/// ```
///
/// Codes missing from the catalog are shown as-is.
pub fn format_annotated(original: &str, source: &str, target: &str, translated: &str) -> String {
    let registry = LanguageRegistry::get();
    format!(
        "{}\n\n(Translated: {} → {})\n{}",
        original,
        registry.display_name(source),
        registry.display_name(target),
        translated
    )
}

/// Runs language resolution and translation against one provider.
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn LanguageProvider>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn LanguageProvider>) -> Self {
        Self { provider }
    }

    /// See [`resolve_source_language`].
    pub async fn resolve(&self, text: &str, source: &str) -> Result<String, RelayError> {
        resolve_source_language(self.provider.as_ref(), text, source).await
    }

    /// Translate `text` between two resolved languages.
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, RelayError> {
        let metrics = TranslationMetrics::global();

        if source == target {
            metrics.record_skip();
            return Ok(Translation::Skipped(SkipReason::SameLanguage));
        }

        metrics.record_translation();
        let translated = self
            .provider
            .translate(text, source, target)
            .await
            .map_err(|e| {
                metrics.record_translation_failure();
                RelayError::TranslationFailed(e.to_string())
            })?;

        if translated == text {
            debug!("Provider returned the input unchanged ({} → {})", source, target);
            metrics.record_skip();
            return Ok(Translation::Skipped(SkipReason::Unchanged));
        }

        Ok(Translation::Translated(translated))
    }

    /// Translate and annotate. `Ok(None)` means the message should be left
    /// as typed.
    pub async fn annotate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Option<String>, RelayError> {
        match self.translate(text, source, target).await? {
            Translation::Skipped(_) => Ok(None),
            Translation::Translated(translated) => {
                Ok(Some(format_annotated(text, source, target, &translated)))
            }
        }
    }
}
