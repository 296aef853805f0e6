// Language tag and detection.

use serde::{Deserialize, Serialize};

/// Lyric language. `Unknown` is tokenized like English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Chinese,
    English,
    #[default]
    Unknown,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::Chinese => "chinese",
            Language::English => "english",
            Language::Unknown => "unknown",
        }
    }

    /// Parse a configured language. "auto" and unrecognized names give None,
    /// meaning "detect from the text".
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chinese" | "zh" => Some(Language::Chinese),
            "english" | "en" => Some(Language::English),
            _ => None,
        }
    }
}

/// True for CJK Unified Ideographs (U+4E00..=U+9FFF).
pub fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Chinese when more than 30% of the non-whitespace characters are CJK
/// ideographs, Unknown when there are no such characters at all, English
/// otherwise.
pub fn detect_language(text: &str) -> Language {
    let mut total = 0usize;
    let mut cjk = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_cjk_ideograph(c) {
            cjk += 1;
        }
    }
    if total == 0 {
        return Language::Unknown;
    }
    if cjk as f64 / total as f64 > 0.3 {
        Language::Chinese
    } else {
        Language::English
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_chinese() {
        assert_eq!(detect_language("小酒窝长睫毛"), Language::Chinese);
        assert_eq!(detect_language("我爱你 baby"), Language::Chinese);
    }

    #[test]
    fn test_detect_english_and_unknown() {
        assert_eq!(detect_language("Twinkle twinkle little star"), Language::English);
        assert_eq!(detect_language("   \n\t "), Language::Unknown);
        assert_eq!(detect_language(""), Language::Unknown);
    }

    #[test]
    fn test_mostly_latin_with_one_hanzi_is_english() {
        assert_eq!(detect_language("hello world 爱"), Language::English);
    }

    #[test]
    fn test_parse_configured_language() {
        assert_eq!(Language::parse("Chinese"), Some(Language::Chinese));
        assert_eq!(Language::parse("en"), Some(Language::English));
        assert_eq!(Language::parse("auto"), None);
    }
}
