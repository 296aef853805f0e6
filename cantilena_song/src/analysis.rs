// Lyric analysis result.
//
// `LyricAnalysis` is built once by a `LyricAnalyzer` and never mutated. Its
// `word_list` is the authoritative unit list: the melody must carry exactly
// one `WordNotes` per entry, in the same order.

use cantilena_text::{Language, LineAnalysis, SyllableInfo};
use cantilena_theory::{EmotionalTone, Key, MusicStyle, TimeSignature};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricAnalysis {
    pub original_text: String,
    pub language: Language,
    pub lines: Vec<LineAnalysis>,
    pub total_syllables: usize,
    pub total_words: usize,
    /// BPM.
    pub suggested_tempo: u32,
    /// Key name such as "C", "Am" or "F#m".
    pub suggested_key: String,
    pub suggested_time_signature: String,
    pub suggested_style: MusicStyle,
    pub emotional_tone: EmotionalTone,
    pub mood_description: String,
    pub word_list: Vec<String>,
}

impl LyricAnalysis {
    /// Syllables of every line, in global index order.
    pub fn all_syllables(&self) -> impl Iterator<Item = &SyllableInfo> {
        self.lines.iter().flat_map(|line| line.syllables.iter())
    }

    /// The suggested key, C major when it does not parse.
    pub fn key(&self) -> Key {
        Key::parse(&self.suggested_key).unwrap_or_else(Key::c_major)
    }

    pub fn time_signature(&self) -> TimeSignature {
        TimeSignature::parse_or_default(&self.suggested_time_signature)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use cantilena_text::analyze_structure;

    /// Analysis of `lyrics` with fixed musical choices.
    pub fn analysis_for(lyrics: &str, language: Language) -> LyricAnalysis {
        let lines = analyze_structure(lyrics, language);
        let word_list: Vec<String> = lines
            .iter()
            .flat_map(|l| l.syllables.iter().map(|s| s.text.clone()))
            .collect();
        LyricAnalysis {
            original_text: lyrics.to_string(),
            language,
            total_syllables: lines.iter().map(|l| l.syllable_count).sum(),
            total_words: word_list.len(),
            lines,
            suggested_tempo: 120,
            suggested_key: "Am".to_string(),
            suggested_time_signature: "4/4".to_string(),
            suggested_style: MusicStyle::Pop,
            emotional_tone: EmotionalTone::Melancholic,
            mood_description: String::new(),
            word_list,
        }
    }
}
