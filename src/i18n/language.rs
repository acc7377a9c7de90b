//! Language type: validated language representation.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use thiserror::Error;

/// Sentinel source language meaning "detect at runtime".
pub const AUTO_LANGUAGE: &str = "auto";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown language code: '{0}'")]
    Unknown(String),

    #[error("\"auto\" is not a concrete language")]
    Auto,
}

/// A language that has been validated against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is in the catalog
    /// * `Err(CatalogError::Auto)` for the `auto` sentinel
    /// * `Err(CatalogError::Unknown)` otherwise
    pub fn from_code(code: &str) -> Result<Language, CatalogError> {
        if Self::is_auto(code) {
            return Err(CatalogError::Auto);
        }

        match LanguageRegistry::get().get_by_code(code) {
            Some(config) => Ok(Language { code: config.code }),
            None => Err(CatalogError::Unknown(code.to_string())),
        }
    }

    /// Whether `code` is the `auto` detection sentinel.
    pub fn is_auto(code: &str) -> bool {
        code == AUTO_LANGUAGE
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a `Language` built through `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English name of the language (e.g., "French").
    pub fn name(&self) -> &'static str {
        self.config().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_constant() {
        assert_eq!(Language::ENGLISH.code(), "en");
        assert_eq!(Language::ENGLISH.name(), "English");
    }

    #[test]
    fn test_from_code_french() {
        let language = Language::from_code("fr").expect("Should succeed");
        assert_eq!(language.code(), "fr");
        assert_eq!(language.name(), "French");
    }

    #[test]
    fn test_from_code_invalid() {
        let result = Language::from_code("klingon");
        assert_eq!(result, Err(CatalogError::Unknown("klingon".to_string())));
        assert!(result.unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn test_from_code_empty() {
        assert!(Language::from_code("").is_err());
    }

    #[test]
    fn test_from_code_auto_is_rejected() {
        assert_eq!(Language::from_code("auto"), Err(CatalogError::Auto));
    }

    #[test]
    fn test_is_auto() {
        assert!(Language::is_auto("auto"));
        assert!(!Language::is_auto("Auto"));
        assert!(!Language::is_auto("en"));
    }

    #[test]
    fn test_language_equality() {
        let lang = Language::from_code("en").unwrap();
        assert_eq!(lang, Language::ENGLISH);
        assert_ne!(lang, Language::from_code("es").unwrap());
    }
}
