// Line and syllable structure of a lyric.
//
// `analyze_structure` walks the cleaned lyric line by line and emits one
// `SyllableInfo` per lyric unit. Indices are global across lines, so the
// flattened syllable list lines up index-for-index with the word list the
// melody is built against.
//
// Stress is positional within a line: the first unit gets 3, the last unit
// and even positions get 2, odd positions get 1. A line is marked as chorus
// when its exact text appears on more than one line.

use crate::language::Language;
use crate::normalize::split_into_lines;
use crate::tokenize::{english_words, estimate_syllables, tokenize_chinese};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One lyric unit with its position and rhythm hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllableInfo {
    pub text: String,
    /// Global 0-based position in the lyric's unit list.
    pub index: usize,
    pub syllable_count: usize,
    /// 1 (weak) to 3 (strong).
    pub stress_level: u8,
    pub duration_weight: f64,
    pub is_word_end: bool,
    pub is_line_end: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAnalysis {
    pub text: String,
    pub line_index: usize,
    pub syllables: Vec<SyllableInfo>,
    pub syllable_count: usize,
    pub suggested_measures: usize,
    pub is_chorus: bool,
}

fn stress_for_position(position: usize, total: usize) -> u8 {
    if position == 0 {
        3
    } else if position + 1 == total || position % 2 == 0 {
        2
    } else {
        1
    }
}

/// Units of one line paired with their word-end flag.
fn line_units(line: &str, language: Language) -> Vec<(String, bool)> {
    match language {
        Language::Chinese => tokenize_chinese(line)
            .into_iter()
            .map(|unit| (unit, true))
            .collect(),
        Language::English | Language::Unknown => english_words(line)
            .iter()
            .flat_map(|word| {
                let syllables = estimate_syllables(word);
                let last = syllables.len().saturating_sub(1);
                syllables
                    .into_iter()
                    .enumerate()
                    .map(move |(i, syllable)| (syllable, i == last))
            })
            .collect(),
    }
}

/// Split `lyrics` into lines and annotate every unit.
pub fn analyze_structure(lyrics: &str, language: Language) -> Vec<LineAnalysis> {
    let lines = split_into_lines(lyrics);
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for line in &lines {
        *occurrences.entry(*line).or_default() += 1;
    }

    let mut next_index = 0;
    let mut result = Vec::with_capacity(lines.len());
    for (line_index, line) in lines.iter().enumerate() {
        let units = line_units(line, language);
        let total = units.len();
        let syllables: Vec<SyllableInfo> = units
            .into_iter()
            .enumerate()
            .map(|(position, (text, is_word_end))| {
                let syllable_count = match language {
                    Language::Chinese => 1,
                    _ => estimate_syllables(&text).len().max(1),
                };
                SyllableInfo {
                    text,
                    index: next_index + position,
                    syllable_count,
                    stress_level: stress_for_position(position, total),
                    duration_weight: 1.0,
                    is_word_end,
                    is_line_end: position + 1 == total,
                }
            })
            .collect();
        next_index += total;

        tracing::debug!(line_index, units = total, "analyzed lyric line");
        result.push(LineAnalysis {
            text: line.to_string(),
            line_index,
            syllable_count: syllables.iter().map(|s| s.syllable_count).sum(),
            suggested_measures: (total / 4).max(1),
            is_chorus: occurrences.get(line).copied().unwrap_or(0) > 1,
            syllables,
        });
    }
    result
}
