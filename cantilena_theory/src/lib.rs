// Cantilena music theory helpers.
//
// Pure functions and small value types shared by the lyric analyzer, the
// melody generator, the MIDI writer and the synthesizer serializer. Nothing
// in this crate performs I/O or holds state.
//
// Architecture:
// - pitch.rs: Pitch classes, pitches with octave, MIDI numbers, and the two
//   textual spellings (standard "F#5" and synthesizer dual-name "F#/Gb5")
// - scale.rs: Scale interval tables, keys and key signatures, time signatures,
//   vocal range clamping
// - mood.rs: Emotional tone and style tags with their mood -> scale and
//   mood -> tempo tables
// - chord.rs: Chord-name parsing and closed-position voicing for backing tracks
// - contour.rs: Melodic contour shapes (relative pool-step sequences)

pub mod chord;
pub mod contour;
pub mod mood;
pub mod pitch;
pub mod scale;

pub use chord::{Chord, ChordQuality};
pub use contour::{ContourShape, melodic_contour};
pub use mood::{EmotionalTone, MusicStyle};
pub use pitch::{
    Pitch, PitchClass, PitchParseError, enharmonic_to_standard, standard_to_enharmonic,
};
pub use scale::{Key, ScaleKind, TimeSignature, clamp_to_range, scale_notes};
