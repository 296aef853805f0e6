// Melody data model and the upstream alignment check.
//
// A `Melody` holds one `WordNotes` per lyric unit, in lyric order. A word may
// carry several notes (melisma), never zero. `validate_melody` is the gate
// the workflow runs before anything is serialized for the synthesizer; it
// checks the unit count against the analysis and the per-word shape that
// serialization depends on (a non-empty, whitespace-free word and positive
// finite durations).

use cantilena_theory::Pitch;
use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

pub const DEFAULT_VELOCITY: u8 = 80;

/// One sounding (or silent) note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: Pitch,
    /// Seconds.
    pub duration: f64,
    pub word_index: usize,
    pub velocity: u8,
    /// Continues the previous note's syllable.
    pub is_slur: bool,
}

impl NoteEvent {
    pub fn new(pitch: Pitch, duration: f64, word_index: usize) -> Self {
        Self {
            pitch,
            duration,
            word_index,
            velocity: DEFAULT_VELOCITY,
            is_slur: false,
        }
    }
}

/// The notes sung on one lyric unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordNotes {
    pub word: String,
    pub word_index: usize,
    pub notes: Vec<NoteEvent>,
}

impl WordNotes {
    /// Dual-name pitches joined by spaces, e.g. "C#/Db4 E4".
    pub fn notes_string(&self) -> String {
        self.notes
            .iter()
            .map(|n| n.pitch.synth_name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Durations with six decimals joined by spaces, e.g. "0.400000 0.200000".
    pub fn durations_string(&self) -> String {
        self.notes
            .iter()
            .map(|n| format!("{:.6}", n.duration))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn total_duration(&self) -> f64 {
        self.notes.iter().map(|n| n.duration).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melody {
    pub word_notes: Vec<WordNotes>,
    /// BPM.
    pub tempo: u32,
    pub key_signature: String,
    pub time_signature: String,
}

impl Melody {
    pub fn total_duration(&self) -> f64 {
        self.word_notes.iter().map(WordNotes::total_duration).sum()
    }

    pub fn note_count(&self) -> usize {
        self.word_notes.iter().map(|w| w.notes.len()).sum()
    }

    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.word_notes.iter().flat_map(|w| w.notes.iter())
    }
}

/// Check that `melody` has one well-formed `WordNotes` per expected unit.
pub fn validate_melody(melody: &Melody, expected_word_count: usize) -> Result<(), AlignmentError> {
    if melody.word_notes.len() != expected_word_count {
        return Err(AlignmentError::WordCountMismatch {
            expected: expected_word_count,
            actual: melody.word_notes.len(),
        });
    }
    for (index, word_notes) in melody.word_notes.iter().enumerate() {
        let word = &word_notes.word;
        if word.is_empty() || word.chars().any(char::is_whitespace) {
            return Err(AlignmentError::InvalidWord {
                index,
                word: word.clone(),
            });
        }
        if word_notes.notes.is_empty() {
            return Err(AlignmentError::EmptyNotes {
                index,
                word: word.clone(),
            });
        }
        for (note, event) in word_notes.notes.iter().enumerate() {
            if !(event.duration.is_finite() && event.duration > 0.0) {
                return Err(AlignmentError::InvalidDuration {
                    index,
                    note,
                    duration: event.duration.to_string(),
                });
            }
        }
    }
    Ok(())
}
