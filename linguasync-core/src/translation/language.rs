/// A target language offered to the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Display name, also used as the translation cache key
    pub name: &'static str,
    /// Code understood by translation providers
    pub code: &'static str,
}

/// Code used when a language name is not in [`SUPPORTED_LANGUAGES`]
pub const DEFAULT_LANGUAGE_CODE: &str = "tr";

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { name: "Turkish", code: "tr" },
    Language { name: "English", code: "en" },
    Language { name: "Spanish", code: "es" },
    Language { name: "French", code: "fr" },
    Language { name: "German", code: "de" },
    Language { name: "Italian", code: "it" },
    Language { name: "Portuguese", code: "pt" },
    Language { name: "Russian", code: "ru" },
    Language { name: "Japanese", code: "ja" },
    Language { name: "Korean", code: "ko" },
    Language { name: "Chinese", code: "zh" },
    Language { name: "Arabic", code: "ar" },
    Language { name: "Hindi", code: "hi" },
];

/// Map a language display name to its provider code, falling back to Turkish.
///
/// Names are compared ASCII case-insensitively.
#[must_use]
pub fn language_code(name: &str) -> &'static str {
    let name = name.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|language| language.name.eq_ignore_ascii_case(name))
        .map_or(DEFAULT_LANGUAGE_CODE, |language| language.code)
}
