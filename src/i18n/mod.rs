//! Language catalog and translation metrics.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for every language code the relay accepts
//! - `language`: Validated `Language` type plus the `auto` sentinel
//! - `metrics`: Process-wide counters for detection and translation calls
//!
//! # Example
//!
//! ```rust,ignore
//! use translate_relay::i18n::{Language, LanguageRegistry};
//!
//! let french = Language::from_code("fr")?;
//! assert_eq!(french.name(), "French");
//!
//! // Unknown codes fall back to the raw code when displayed
//! assert_eq!(LanguageRegistry::get().display_name("xx"), "xx");
//! ```

mod language;
mod metrics;
mod registry;

pub use language::{CatalogError, Language, AUTO_LANGUAGE};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
