use crate::error::RelayError;
use crate::i18n::{Language, TranslationMetrics};
use crate::provider::LanguageProvider;
use tracing::debug;

/// Effective source language for `text`.
///
/// A concrete `source` is returned as-is without touching the provider.
/// For `auto` the provider is asked once and its most confident candidate
/// wins.
pub async fn resolve_source_language(
    provider: &dyn LanguageProvider,
    text: &str,
    source: &str,
) -> Result<String, RelayError> {
    if !Language::is_auto(source) {
        return Ok(source.to_string());
    }

    let metrics = TranslationMetrics::global();
    metrics.record_detection();

    let candidates = provider.detect_language(text).await.map_err(|e| {
        metrics.record_detection_failure();
        RelayError::DetectionFailed(e.to_string())
    })?;

    let best = candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| {
            metrics.record_detection_failure();
            RelayError::DetectionFailed("no language candidates returned".to_string())
        })?;

    debug!("Detected {} (score {:.2})", best.code, best.score);
    Ok(best.code)
}
