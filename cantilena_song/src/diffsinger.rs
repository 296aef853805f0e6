// Synthesizer input: serialization and the downstream alignment check.
//
// The singing synthesizer takes three parallel strings. `text` holds the
// lyric units, `notes` holds one group of pitches per unit and
// `notes_duration` one group of durations per unit. Groups are separated by
// " | ", items inside a group by spaces:
//
//   text:           小酒窝
//   notes:          C4 | D4 | E4 F4
//   notes_duration: 0.500000 | 0.500000 | 0.250000 0.250000
//
// When every unit is a single character the units are concatenated and
// counted per character (`TextUnit::Character`); otherwise they are joined
// by spaces and counted per token (`TextUnit::Token`). `validate` must pass
// before a payload reaches any synthesizer.

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;
use crate::melody::Melody;

/// How `text` is split into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextUnit {
    #[default]
    Character,
    Token,
}

impl TextUnit {
    pub fn count(self, text: &str) -> usize {
        match self {
            TextUnit::Character => text.chars().filter(|c| !c.is_whitespace()).count(),
            TextUnit::Token => text.split_whitespace().count(),
        }
    }
}

/// The four fields sent to a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthPayload {
    pub text: String,
    pub notes: String,
    pub notes_duration: String,
    pub input_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSingerInput {
    pub text: String,
    pub notes: String,
    pub notes_duration: String,
    pub input_type: String,
    pub text_unit: TextUnit,
}

const GROUP_SEPARATOR: &str = " | ";

/// Groups of a " | "-separated string, trimmed. An empty string has none.
/// A bare '|' without the surrounding spaces does not separate groups.
fn groups(field: &str) -> Vec<&str> {
    if field.trim().is_empty() {
        return Vec::new();
    }
    field.split(GROUP_SEPARATOR).map(str::trim).collect()
}

impl DiffSingerInput {
    /// Serialize `melody`, one group per `WordNotes` in order.
    pub fn serialize(melody: &Melody) -> Self {
        let words = &melody.word_notes;
        let text_unit = if words.iter().all(|w| w.word.chars().count() == 1) {
            TextUnit::Character
        } else {
            TextUnit::Token
        };
        let text = match text_unit {
            TextUnit::Character => words.iter().map(|w| w.word.as_str()).collect::<String>(),
            TextUnit::Token => words
                .iter()
                .map(|w| w.word.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        };
        let notes = words
            .iter()
            .map(|w| w.notes_string())
            .collect::<Vec<_>>()
            .join(GROUP_SEPARATOR);
        let notes_duration = words
            .iter()
            .map(|w| w.durations_string())
            .collect::<Vec<_>>()
            .join(GROUP_SEPARATOR);
        Self {
            text,
            notes,
            notes_duration,
            input_type: "word".to_string(),
            text_unit,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.text_unit.count(&self.text)
    }

    /// Check group counts against the text and token counts per group.
    pub fn validate(&self) -> Result<(), AlignmentError> {
        let units = self.unit_count();
        let note_groups = groups(&self.notes);
        let duration_groups = groups(&self.notes_duration);

        if note_groups.len() != units {
            return Err(AlignmentError::GroupCountMismatch {
                field: "notes",
                groups: note_groups.len(),
                units,
            });
        }
        if duration_groups.len() != units {
            return Err(AlignmentError::GroupCountMismatch {
                field: "notes_duration",
                groups: duration_groups.len(),
                units,
            });
        }
        for (group, (notes, durations)) in note_groups.iter().zip(&duration_groups).enumerate() {
            let notes = notes.split_whitespace().count();
            let durations = durations.split_whitespace().count();
            if notes != durations {
                return Err(AlignmentError::GroupTokenMismatch {
                    group,
                    notes,
                    durations,
                });
            }
        }
        Ok(())
    }

    pub fn to_payload(&self) -> SynthPayload {
        SynthPayload {
            text: self.text.clone(),
            notes: self.notes.clone(),
            notes_duration: self.notes_duration.clone(),
            input_type: self.input_type.clone(),
        }
    }
}
