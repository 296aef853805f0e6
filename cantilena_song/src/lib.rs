// Cantilena lyric-to-song workflow.
//
// Takes lyrics and produces a singable melody aligned one-to-one with the
// lyric units, the synthesizer's text/notes/durations input, a MIDI score
// (optionally with a drum, bass and chord backing), a synthesized vocal and
// a final mix.
//
// Architecture:
// - config.rs: `ComposerConfig`, JSON-loaded with defaults and env overrides
// - error.rs: `AlignmentError`, `SynthesisError`, `ComposeError`
// - analysis.rs: `LyricAnalysis`, the immutable analysis result
// - analyzer.rs: `LyricAnalyzer` trait and the suggestion-backed analyzer
// - melody.rs: `Melody` / `WordNotes` / `NoteEvent` and `validate_melody`
// - generator.rs: `MelodyGenerator` trait and the contour-based generator
// - diffsinger.rs: Synthesizer input serialization and validation
// - midi.rs: SMF writer (midly)
// - accompaniment.rs: Chord progression planning and backing parts
// - synthesis.rs: `SynthesisAdapter` trait, in-process and external adapters
// - mixing.rs: `Mixer` trait and the SoundFont-rendering `AudioMixer`
// - song.rs: `Song` aggregate and `SongStage`
// - workflow.rs: `Composer`, which runs the stages in order
//
// The one invariant everything hangs on: a melody has exactly one
// `WordNotes` per lyric unit, and the synthesizer input has exactly one
// note group per unit. Both are checked before any payload leaves the
// process.

pub mod accompaniment;
pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod diffsinger;
pub mod error;
pub mod generator;
pub mod melody;
pub mod midi;
pub mod mixing;
pub mod song;
pub mod synthesis;
pub mod workflow;

pub use analysis::LyricAnalysis;
pub use analyzer::{AnalysisSuggestion, LyricAnalyzer, SuggestedLyricAnalyzer};
pub use config::ComposerConfig;
pub use diffsinger::{DiffSingerInput, SynthPayload, TextUnit};
pub use error::{AlignmentError, ComposeError, SynthesisError};
pub use generator::{ContourMelodyGenerator, MelodyGenerator};
pub use melody::{Melody, NoteEvent, WordNotes, validate_melody};
pub use mixing::{AudioMixer, MixLevels, Mixer};
pub use song::{Song, SongStage, StageFailure};
pub use synthesis::{
    ExternalProcessSynthesizer, InProcessSynthesizer, SingingEngine, SynthesisAdapter, Waveform,
};
pub use workflow::{ComposeOptions, Composer, OutputPaths, safe_title};
