// Lyric cleaning.
//
// NFKC folds fullwidth Latin and punctuation into their ASCII forms, so a
// fullwidth comma comes out as ',' and the Chinese tokenizer has to strip
// ASCII punctuation as well as CJK punctuation.

use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize, collapse whitespace runs inside each line to one space,
/// trim each line, drop blank lines. Line breaks survive so the structure
/// pass still sees the original lines.
pub fn clean_lyrics(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    normalized
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Non-empty trimmed lines.
pub fn split_into_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_keeps_line_breaks() {
        let cleaned = clean_lyrics("  hello   world \n\n  second\tline  ");
        assert_eq!(cleaned, "hello world\nsecond line");
    }

    #[test]
    fn test_clean_folds_fullwidth() {
        assert_eq!(clean_lyrics("ＡＢＣ，你好"), "ABC,你好");
    }

    #[test]
    fn test_crlf_lines() {
        assert_eq!(split_into_lines("a\r\nb\r\n\r\n c "), vec!["a", "b", "c"]);
    }
}
