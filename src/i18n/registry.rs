//! Language registry: Single source of truth for all supported languages.
//!
//! The registry is built once on first access (`OnceLock`) and is immutable
//! afterwards. Codes follow the provider's conventions: ISO 639-1 codes plus a
//! few regional variants such as `zh-TW` or `fr-CA`.

use std::sync::OnceLock;

/// A supported language: its code and English display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Language code (e.g., "en", "fr", "zh-TW")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "French")
    pub name: &'static str,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// Matching is exact: `"EN"` and `"en "` are not the same code as `"en"`.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Check if a language code is in the catalog.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// Human-readable name for a code, or the code itself when it is not in
    /// the catalog.
    pub fn display_name<'a>(&self, code: &'a str) -> &'a str {
        match self.get_by_code(code) {
            Some(config) => config.name,
            None => code,
        }
    }

    /// Get all languages, in catalog order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }
}

macro_rules! languages {
    ($($code:literal => $name:literal),* $(,)?) => {
        vec![$(LanguageConfig { code: $code, name: $name }),*]
    };
}

/// Languages offered by the translation provider.
fn default_languages() -> Vec<LanguageConfig> {
    languages![
        "af" => "Afrikaans",
        "sq" => "Albanian",
        "am" => "Amharic",
        "ar" => "Arabic",
        "hy" => "Armenian",
        "az" => "Azerbaijani",
        "bn" => "Bengali",
        "bs" => "Bosnian",
        "bg" => "Bulgarian",
        "ca" => "Catalan",
        "zh" => "Chinese (Simplified)",
        "zh-TW" => "Chinese (Traditional)",
        "hr" => "Croatian",
        "cs" => "Czech",
        "da" => "Danish",
        "fa-AF" => "Dari",
        "nl" => "Dutch",
        "en" => "English",
        "et" => "Estonian",
        "fa" => "Farsi (Persian)",
        "tl" => "Filipino, Tagalog",
        "fi" => "Finnish",
        "fr" => "French",
        "fr-CA" => "French (Canada)",
        "ka" => "Georgian",
        "de" => "German",
        "el" => "Greek",
        "gu" => "Gujarati",
        "ht" => "Haitian Creole",
        "ha" => "Hausa",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "hu" => "Hungarian",
        "is" => "Icelandic",
        "id" => "Indonesian",
        "ga" => "Irish",
        "it" => "Italian",
        "ja" => "Japanese",
        "kn" => "Kannada",
        "kk" => "Kazakh",
        "ko" => "Korean",
        "lv" => "Latvian",
        "lt" => "Lithuanian",
        "mk" => "Macedonian",
        "ms" => "Malay",
        "ml" => "Malayalam",
        "mt" => "Maltese",
        "mr" => "Marathi",
        "mn" => "Mongolian",
        "no" => "Norwegian (Bokmål)",
        "ps" => "Pashto",
        "pl" => "Polish",
        "pt" => "Portuguese (Brazil)",
        "pt-PT" => "Portuguese (Portugal)",
        "pa" => "Punjabi",
        "ro" => "Romanian",
        "ru" => "Russian",
        "sr" => "Serbian",
        "si" => "Sinhala",
        "sk" => "Slovak",
        "sl" => "Slovenian",
        "so" => "Somali",
        "es" => "Spanish",
        "es-MX" => "Spanish (Mexico)",
        "sw" => "Swahili",
        "sv" => "Swedish",
        "ta" => "Tamil",
        "te" => "Telugu",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "ur" => "Urdu",
        "uz" => "Uzbek",
        "vi" => "Vietnamese",
        "cy" => "Welsh",
    ]
}
