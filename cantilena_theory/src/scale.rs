// Scales, keys and time signatures.
//
// Scales are interval tables from a root pitch class. `scale_notes` realizes a
// scale at one octave; callers that need a wider pitch pool concatenate
// several octaves. `Key` is the parsed form of a suggested key string ("C",
// "Am", "F#m", "Bb", "A minor") and knows its key-signature sharps count for
// the MIDI key-signature meta event. Unparseable keys are the caller's
// business: every call site falls back to C major.

use crate::pitch::{Pitch, PitchClass};
use serde::{Deserialize, Serialize};

/// Scale families used by the melody generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Major,
    Minor,
    PentatonicMajor,
    PentatonicMinor,
}

impl ScaleKind {
    /// Semitone offsets from the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::PentatonicMajor => &[0, 2, 4, 7, 9],
            ScaleKind::PentatonicMinor => &[0, 3, 5, 7, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::Minor => "minor",
            ScaleKind::PentatonicMajor => "pentatonic_major",
            ScaleKind::PentatonicMinor => "pentatonic_minor",
        }
    }
}

/// Notes of `kind` built on `root`, starting in `octave`. Intervals that pass
/// B roll over into the next octave, so the result is strictly ascending.
pub fn scale_notes(root: PitchClass, kind: ScaleKind, octave: u8) -> Vec<Pitch> {
    let base = (octave as u16 + 1) * 12 + root.index() as u16;
    kind.intervals()
        .iter()
        .filter_map(|&step| {
            let midi = base + step as u16;
            u8::try_from(midi).ok().and_then(Pitch::from_midi)
        })
        .collect()
}

/// Shift `midi` by whole octaves until it lies in `[low, high]`. The range
/// must span at least an octave for every pitch class to fit; if it does not,
/// the result is clamped to the nearer bound.
pub fn clamp_to_range(midi: u8, low: u8, high: u8) -> u8 {
    let mut note = midi;
    while note < low && note <= 127 - 12 {
        note += 12;
    }
    while note > high && note >= 12 {
        note -= 12;
    }
    note.clamp(low, high.max(low))
}

/// Major-key sharps (positive) or flats (negative), indexed by tonic pitch
/// class. Black-key tonics use the conventional flat keys except F#.
const MAJOR_KEY_SHARPS: [i8; 12] = [0, -5, 2, -3, 4, -1, 6, 1, -4, 3, -2, 5];

/// A tonic plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub tonic: PitchClass,
    pub minor: bool,
}

impl Key {
    pub fn c_major() -> Self {
        Key {
            tonic: PitchClass::C,
            minor: false,
        }
    }

    /// Parse a key name. Accepts "C", "Am", "F#m", "Bb", "C#/Db", "A minor",
    /// "C major", "Ebmin". Returns None for anything else.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let lower = name.to_ascii_lowercase();
        let (tonic_part, minor) = if let Some(rest) = lower.strip_suffix("minor") {
            (&name[..rest.len()], true)
        } else if let Some(rest) = lower.strip_suffix("major") {
            (&name[..rest.len()], false)
        } else if let Some(rest) = lower.strip_suffix("min") {
            (&name[..rest.len()], true)
        } else if let Some(rest) = lower.strip_suffix("maj") {
            (&name[..rest.len()], false)
        } else if name.len() > 1 && name.ends_with('m') {
            (&name[..name.len() - 1], true)
        } else {
            (name, false)
        };
        let tonic_part = tonic_part.trim();
        // "C#/Db" names one class; the first half is enough.
        let tonic_part = tonic_part.split('/').next().unwrap_or(tonic_part);
        let tonic = PitchClass::parse(tonic_part)?;
        Some(Key { tonic, minor })
    }

    /// Sharps (positive) or flats (negative) in the key signature.
    pub fn sharps(self) -> i8 {
        let idx = if self.minor {
            (self.tonic.index() + 3) % 12
        } else {
            self.tonic.index()
        };
        MAJOR_KEY_SHARPS[idx as usize]
    }

    /// Conventional name, "F#m" or "Bb"-style keys rendered with sharps.
    pub fn name(self) -> String {
        let suffix = if self.minor { "m" } else { "" };
        format!("{}{}", self.tonic.standard_name(), suffix)
    }
}

/// A simple meter such as 4/4 or 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl TimeSignature {
    /// Parse "N/D" where D is a power of two. Anything else is None.
    pub fn parse(text: &str) -> Option<Self> {
        let (num, den) = text.trim().split_once('/')?;
        let numerator: u8 = num.trim().parse().ok()?;
        let denominator: u8 = den.trim().parse().ok()?;
        if numerator == 0 || denominator == 0 || !denominator.is_power_of_two() {
            return None;
        }
        Some(TimeSignature {
            numerator,
            denominator,
        })
    }

    /// Parse, falling back to 4/4.
    pub fn parse_or_default(text: &str) -> Self {
        Self::parse(text).unwrap_or_default()
    }

    /// log2 of the denominator, the form MIDI time-signature events use.
    pub fn denominator_power(self) -> u8 {
        self.denominator.trailing_zeros() as u8
    }
}
