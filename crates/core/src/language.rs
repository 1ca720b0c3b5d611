//! Shopper languages
//!
//! The assistant works internally in Indian English (`en-IN`) and talks to
//! shoppers in any of the Indian languages supported by the speech and
//! translation provider. Codes are BCP-47 style (`hi-IN`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages a shopper can write or speak in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Bengali,
    Gujarati,
    Kannada,
    Malayalam,
    Marathi,
    Odia,
    Punjabi,
    Tamil,
    Telugu,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Hindi,
        Language::Bengali,
        Language::Gujarati,
        Language::Kannada,
        Language::Malayalam,
        Language::Marathi,
        Language::Odia,
        Language::Punjabi,
        Language::Tamil,
        Language::Telugu,
    ];

    /// BCP-47 code as used on the wire (`en-IN`, `hi-IN`, ...)
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en-IN",
            Self::Hindi => "hi-IN",
            Self::Bengali => "bn-IN",
            Self::Gujarati => "gu-IN",
            Self::Kannada => "kn-IN",
            Self::Malayalam => "ml-IN",
            Self::Marathi => "mr-IN",
            Self::Odia => "od-IN",
            Self::Punjabi => "pa-IN",
            Self::Tamil => "ta-IN",
            Self::Telugu => "te-IN",
        }
    }

    /// Human-readable name, used in prompts
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Bengali => "Bengali",
            Self::Gujarati => "Gujarati",
            Self::Kannada => "Kannada",
            Self::Malayalam => "Malayalam",
            Self::Marathi => "Marathi",
            Self::Odia => "Odia",
            Self::Punjabi => "Punjabi",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
        }
    }

    pub fn is_english(&self) -> bool {
        matches!(self, Self::English)
    }

    /// Lenient parse of a language hint.
    ///
    /// Accepts full codes (`ta-IN`), bare ISO 639-1 codes (`ta`), other
    /// English regions (`en-US`) and names (`tamil`). Returns `None` for
    /// empty input, `auto` and anything unsupported.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_lowercase().replace('_', "-");
        if normalized.is_empty() || normalized == "auto" {
            return None;
        }

        let primary = normalized.split('-').next().unwrap_or("");
        match primary {
            "en" | "english" => Some(Self::English),
            "hi" | "hindi" => Some(Self::Hindi),
            "bn" | "bengali" | "bangla" => Some(Self::Bengali),
            "gu" | "gujarati" => Some(Self::Gujarati),
            "kn" | "kannada" => Some(Self::Kannada),
            "ml" | "malayalam" => Some(Self::Malayalam),
            "mr" | "marathi" => Some(Self::Marathi),
            "od" | "or" | "odia" | "oriya" => Some(Self::Odia),
            "pa" | "punjabi" => Some(Self::Punjabi),
            "ta" | "tamil" => Some(Self::Tamil),
            "te" | "telugu" => Some(Self::Telugu),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("unsupported language code: {}", s)))
    }
}

impl Serialize for Language {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Language::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported language code: {}", code)))
    }
}
