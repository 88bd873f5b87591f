//! Supported prompt and speech languages.

use std::fmt;
use std::str::FromStr;

/// A language the studio can translate into and synthesize speech for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Telugu,
    Hindi,
    Tamil,
    Kannada,
    Spanish,
    French,
    German,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Language; 8] = [
        Language::English,
        Language::Telugu,
        Language::Hindi,
        Language::Tamil,
        Language::Kannada,
        Language::Spanish,
        Language::French,
        Language::German,
    ];

    /// ISO 639-1 code used by the translation and speech services.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Telugu => "te",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Kannada => "kn",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
        }
    }

    /// Human-readable name, as shown to users.
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Telugu => "Telugu",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Kannada => "Kannada",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
        }
    }

    /// Look a language up by its code.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    /// Look a language up by name or code, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.name().eq_ignore_ascii_case(value))
            .or_else(|| Self::from_code(value))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| {
            let names: Vec<&str> = Language::ALL.iter().map(|l| l.name()).collect();
            format!(
                "Unknown language '{}'. Supported languages: {}",
                s,
                names.join(", ")
            )
        })
    }
}
