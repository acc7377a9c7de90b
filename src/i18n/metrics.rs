//! Translation metrics and observability module.
//!
//! Counts remote detection/translation calls, their failures, and the
//! dispatches that were skipped without changing a message.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Translation counters. One process-wide instance lives behind `global()`.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Calls made to the detection capability
    detections: AtomicUsize,

    /// Detection calls that failed or returned no candidate
    detection_failures: AtomicUsize,

    /// Calls made to the translation capability
    translations: AtomicUsize,

    /// Translation calls that failed
    translation_failures: AtomicUsize,

    /// Dispatches that ended as a no-op (same language or echoed text)
    skipped: AtomicUsize,
}

static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    /// Get the global translation metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(TranslationMetrics::default)
    }

    pub fn record_detection(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection_failure(&self) {
        self.detection_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translation(&self) {
        self.translations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translation_failure(&self) {
        self.translation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detections(&self) -> usize {
        self.detections.load(Ordering::Relaxed)
    }

    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let detections = self.detections();
        let detection_failures = self.detection_failures.load(Ordering::Relaxed);
        let translations = self.translations();
        let translation_failures = self.translation_failures.load(Ordering::Relaxed);

        MetricsReport {
            detections,
            detection_failures,
            detection_success_rate: success_rate(detections, detection_failures),
            translations,
            translation_failures,
            translation_success_rate: success_rate(translations, translation_failures),
            skipped: self.skipped(),
        }
    }
}

fn success_rate(calls: usize, failures: usize) -> f64 {
    if calls == 0 {
        return 0.0;
    }
    (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
}

/// Snapshot of the translation counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub detections: usize,
    pub detection_failures: usize,

    /// Detection success rate as a percentage (0-100)
    pub detection_success_rate: f64,

    pub translations: usize,
    pub translation_failures: usize,

    /// Translation success rate as a percentage (0-100)
    pub translation_success_rate: f64,

    pub skipped: usize,
}
