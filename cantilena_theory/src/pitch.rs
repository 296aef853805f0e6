// Pitch representation and note-name spelling.
//
// A pitch is either a rest or a pitch class plus octave (scientific pitch
// notation, C4 = MIDI 60). Two spellings of the same pitch circulate in the
// system:
// - standard: a single sharp-spelled name, "F#5". Used for MIDI export and
//   everywhere a human reads the melody.
// - synthesizer dual-name: both enharmonic names joined by a slash, "F#/Gb5".
//   The singing synthesizer's note vocabulary only knows this form for the
//   five black keys.
//
// Conversion between the two must be exact: standard -> dual -> standard
// returns the original string for every sharp name, and white keys and rests
// are fixed points of both directions. `Pitch` stores the typed value and
// renders either spelling; the free functions operate on strings for callers
// that only hold note text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest octave accepted when parsing note names.
pub const MAX_OCTAVE: u8 = 9;

/// Black-key spellings and their synthesizer dual-name form. Both the sharp
/// and the flat spelling map to the same dual name.
const ENHARMONIC_NAMES: [(&str, &str); 10] = [
    ("C#", "C#/Db"),
    ("Db", "C#/Db"),
    ("D#", "D#/Eb"),
    ("Eb", "D#/Eb"),
    ("F#", "F#/Gb"),
    ("Gb", "F#/Gb"),
    ("G#", "G#/Ab"),
    ("Ab", "G#/Ab"),
    ("A#", "A#/Bb"),
    ("Bb", "A#/Bb"),
];

/// Dual names back to the standard (sharp) spelling.
const DUAL_TO_STANDARD: [(&str, &str); 5] = [
    ("C#/Db", "C#"),
    ("D#/Eb", "D#"),
    ("F#/Gb", "F#"),
    ("G#/Ab", "G#"),
    ("A#/Bb", "A#"),
];

/// The twelve pitch classes, spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Pitch class for a semitone index (taken mod 12, 0 = C).
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 12) as usize]
    }

    /// Semitone index, 0 = C.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// True for the five classes that need a dual name in synthesizer format.
    pub fn is_black_key(self) -> bool {
        matches!(
            self,
            PitchClass::Cs | PitchClass::Ds | PitchClass::Fs | PitchClass::Gs | PitchClass::As
        )
    }

    /// Sharp spelling, e.g. "F#".
    pub fn standard_name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Synthesizer spelling: dual name for black keys, plain letter otherwise.
    pub fn synth_name(self) -> &'static str {
        match self {
            PitchClass::Cs => "C#/Db",
            PitchClass::Ds => "D#/Eb",
            PitchClass::Fs => "F#/Gb",
            PitchClass::Gs => "G#/Ab",
            PitchClass::As => "A#/Bb",
            other => other.standard_name(),
        }
    }

    /// Parse a letter with an optional single accidental ("C", "f#", "Bb").
    /// Spellings such as "Cb" or "E#" resolve to their enharmonic class.
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let base: u8 = match chars.next()?.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let index = match chars.as_str() {
            "" => base,
            "#" => base + 1,
            "b" => base + 11,
            _ => return None,
        };
        Some(Self::from_index(index))
    }
}

/// Errors from parsing a note name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PitchParseError {
    #[error("note name '{0}' has no octave")]
    MissingOctave(String),
    #[error("note name '{0}' has an octave outside 0-{MAX_OCTAVE}")]
    InvalidOctave(String),
    #[error("unknown note name '{0}'")]
    UnknownName(String),
}

/// A pitched note or a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Pitch {
    Rest,
    Note { class: PitchClass, octave: u8 },
}

impl Pitch {
    pub fn note(class: PitchClass, octave: u8) -> Self {
        Pitch::Note { class, octave }
    }

    /// Pitch for a MIDI note number. MIDI 0-11 sit in octave -1, which this
    /// type does not represent, so they return None.
    pub fn from_midi(midi: u8) -> Option<Self> {
        if !(12..=127).contains(&midi) {
            return None;
        }
        Some(Pitch::Note {
            class: PitchClass::from_index(midi % 12),
            octave: midi / 12 - 1,
        })
    }

    /// MIDI note number, or None for rests and pitches above MIDI 127.
    pub fn midi(self) -> Option<u8> {
        match self {
            Pitch::Rest => None,
            Pitch::Note { class, octave } => {
                let n = (octave as u16 + 1) * 12 + class.index() as u16;
                u8::try_from(n).ok().filter(|&n| n <= 127)
            }
        }
    }

    pub fn is_rest(self) -> bool {
        matches!(self, Pitch::Rest)
    }

    pub fn octave(self) -> Option<u8> {
        match self {
            Pitch::Rest => None,
            Pitch::Note { octave, .. } => Some(octave),
        }
    }

    /// Same pitch class with the octave clamped into `[low, high]`.
    pub fn with_octave_clamped(self, low: u8, high: u8) -> Self {
        match self {
            Pitch::Rest => Pitch::Rest,
            Pitch::Note { class, octave } => Pitch::Note {
                class,
                octave: octave.clamp(low, high),
            },
        }
    }

    /// Standard spelling, "F#5" or "rest".
    pub fn standard_name(self) -> String {
        self.to_string()
    }

    /// Synthesizer spelling, "F#/Gb5" or "rest".
    pub fn synth_name(self) -> String {
        match self {
            Pitch::Rest => "rest".to_string(),
            Pitch::Note { class, octave } => format!("{}{}", class.synth_name(), octave),
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pitch::Rest => f.write_str("rest"),
            Pitch::Note { class, octave } => write!(f, "{}{}", class.standard_name(), octave),
        }
    }
}

impl FromStr for Pitch {
    type Err = PitchParseError;

    /// Accepts "rest" (any case), standard names ("F#5", "Gb5", "c4") and
    /// dual names ("F#/Gb5"). A dual name whose halves disagree is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("rest") {
            return Ok(Pitch::Rest);
        }
        let (name, octave) = split_octave(s);
        if octave.is_empty() {
            return Err(PitchParseError::MissingOctave(s.to_string()));
        }
        let octave: u8 = octave
            .parse()
            .ok()
            .filter(|&o| o <= MAX_OCTAVE)
            .ok_or_else(|| PitchParseError::InvalidOctave(s.to_string()))?;

        let class = match name.split_once('/') {
            Some((first, second)) => match (PitchClass::parse(first), PitchClass::parse(second)) {
                (Some(a), Some(b)) if a == b => a,
                _ => return Err(PitchParseError::UnknownName(s.to_string())),
            },
            None => PitchClass::parse(name)
                .ok_or_else(|| PitchParseError::UnknownName(s.to_string()))?,
        };
        Ok(Pitch::Note { class, octave })
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> String {
        pitch.to_string()
    }
}

impl TryFrom<String> for Pitch {
    type Error = PitchParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Split "F#/Gb5" into ("F#/Gb", "5"): the trailing ASCII digits are the octave.
fn split_octave(name: &str) -> (&str, &str) {
    let idx = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    name.split_at(idx)
}

/// Convert a standard note name to synthesizer format.
///
/// "F#5" -> "F#/Gb5", "Gb5" -> "F#/Gb5". White keys, rests, names already in
/// dual form and anything unrecognized pass through unchanged.
pub fn standard_to_enharmonic(name: &str) -> String {
    if name.eq_ignore_ascii_case("rest") {
        return name.to_string();
    }
    let (class, octave) = split_octave(name);
    ENHARMONIC_NAMES
        .iter()
        .find(|(single, _)| *single == class)
        .map(|(_, dual)| format!("{dual}{octave}"))
        .unwrap_or_else(|| name.to_string())
}

/// Convert a synthesizer dual name back to the standard spelling.
///
/// "F#/Gb5" -> "F#5". Names without a slash and rests pass through unchanged.
/// An unknown dual name keeps its first half and the octave of the second.
pub fn enharmonic_to_standard(name: &str) -> String {
    if name.eq_ignore_ascii_case("rest") || !name.contains('/') {
        return name.to_string();
    }
    if let Some((dual, standard)) = DUAL_TO_STANDARD
        .iter()
        .find(|(dual, _)| name.starts_with(dual))
    {
        return format!("{standard}{}", &name[dual.len()..]);
    }
    match name.split_once('/') {
        Some((first, second)) => {
            let (_, octave) = split_octave(second);
            format!("{first}{octave}")
        }
        None => name.to_string(),
    }
}
