// Lyric unit tokenizers.
//
// Chinese: every remaining character after removing whitespace and
// punctuation is one unit. English: lowercase words with non-word characters
// stripped, each split into estimated syllables. The syllable heuristic
// breaks after a vowel run when a consonant follows (never on the final
// letter), and glues whatever is left at the end onto the last syllable. It
// is a rough approximation and makes no attempt at real phonology.

use crate::language::Language;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

fn is_cjk_punctuation(c: char) -> bool {
    matches!(
        c,
        '，' | '。'
            | '！'
            | '？'
            | '、'
            | '；'
            | '：'
            | '“'
            | '”'
            | '‘'
            | '’'
            | '（'
            | '）'
            | '《'
            | '》'
            | '【'
            | '】'
            | '…'
            | '—'
            | '·'
            | '～'
            | '「'
            | '」'
    )
}

/// One unit per character, whitespace and punctuation removed.
pub fn tokenize_chinese(text: &str) -> Vec<String> {
    text.chars()
        .filter(|&c| !c.is_whitespace() && !c.is_ascii_punctuation() && !is_cjk_punctuation(c))
        .map(String::from)
        .collect()
}

/// Lowercased words of `text` with everything but alphanumerics and '_'
/// removed. Words that end up empty are dropped.
pub fn english_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|&c| c.is_alphanumeric() || c == '_')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Syllable units of every word in `text`, flattened.
pub fn tokenize_english(text: &str) -> Vec<String> {
    english_words(text)
        .iter()
        .flat_map(|word| estimate_syllables(word))
        .collect()
}

/// Tokenize with the rules for `language`. Unknown uses the English rules.
pub fn tokenize_lyrics(text: &str, language: Language) -> Vec<String> {
    match language {
        Language::Chinese => tokenize_chinese(text),
        Language::English | Language::Unknown => tokenize_english(text),
    }
}

/// Heuristic syllable split of one word. Never returns an empty list for a
/// non-empty word, and the syllables concatenate back to the lowercased word.
pub fn estimate_syllables(word: &str) -> Vec<String> {
    let word = word.to_lowercase();
    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= 3 {
        return vec![word];
    }

    let mut syllables: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_vowel = false;
    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let is_vowel = VOWELS.contains(&c);
        if prev_vowel && !is_vowel && i < chars.len() - 1 && current.chars().count() > 1 {
            current.pop();
            syllables.push(std::mem::take(&mut current));
            current.push(c);
        }
        prev_vowel = is_vowel;
    }

    if !current.is_empty() {
        match syllables.last_mut() {
            Some(last) => last.push_str(&current),
            None => syllables.push(current),
        }
    }
    syllables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chinese_strips_punctuation() {
        assert_eq!(
            tokenize_chinese("小酒窝，长睫毛。"),
            vec!["小", "酒", "窝", "长", "睫", "毛"]
        );
        // NFKC turns the fullwidth comma into ASCII.
        assert_eq!(tokenize_chinese("你, 好!"), vec!["你", "好"]);
    }

    #[test]
    fn test_short_words_stay_whole() {
        assert_eq!(estimate_syllables("the"), vec!["the"]);
        assert_eq!(estimate_syllables("Sky"), vec!["sky"]);
    }

    #[test]
    fn test_syllable_split_and_remainder() {
        assert_eq!(estimate_syllables("beautiful"), vec!["beau", "tiful"]);
        assert_eq!(estimate_syllables("wonderful"), vec!["wo", "nderful"]);
        // A single break leaves everything in one syllable once the
        // remainder is merged back.
        assert_eq!(estimate_syllables("twinkle"), vec!["twinkle"]);
        assert_eq!(estimate_syllables("star"), vec!["star"]);
    }

    #[test]
    fn test_syllables_reassemble_word() {
        for word in ["wonderful", "little", "remember", "strength", "rhythm"] {
            let joined: String = estimate_syllables(word).concat();
            assert_eq!(joined, word);
        }
    }

    #[test]
    fn test_english_strips_non_word_chars() {
        assert_eq!(english_words("Don't STOP -- me_now!"), vec!["dont", "stop", "me_now"]);
        assert_eq!(tokenize_english("Hey, you"), vec!["hey", "you"]);
    }

    #[test]
    fn test_unknown_uses_english_rules() {
        assert_eq!(tokenize_lyrics("123 go", Language::Unknown), vec!["123", "go"]);
    }
}
