// Error types for the composition workflow.
//
// `AlignmentError` covers both alignment checks: the upstream melody
// validation and the downstream synthesizer-payload validation. Every
// variant names the counts or the index involved, since these are the
// messages a user sees when a song cannot be sung.
//
// `ComposeError` is what the workflow returns for fatal failures. Stages
// that may degrade (MIDI export, synthesis, mixing, metadata) log and
// record their errors on the `Song` instead of returning them.

use cantilena_audio::MixError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("word count mismatch: expected {expected}, got {actual}")]
    WordCountMismatch { expected: usize, actual: usize },

    #[error("no notes assigned to word '{word}' at index {index}")]
    EmptyNotes { index: usize, word: String },

    #[error("word at index {index} is not a single lyric unit: {word:?}")]
    InvalidWord { index: usize, word: String },

    #[error("note {note} of word at index {index} has invalid duration {duration}")]
    InvalidDuration {
        index: usize,
        note: usize,
        duration: String,
    },

    #[error("{field} has {groups} groups but text has {units} units")]
    GroupCountMismatch {
        field: &'static str,
        groups: usize,
        units: usize,
    },

    #[error("group {group}: note count ({notes}) != duration count ({durations})")]
    GroupTokenMismatch {
        group: usize,
        notes: usize,
        durations: usize,
    },
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("{what} not found at {}", .path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("synthesizer process failed with {code}: {stderr}")]
    ProcessFailed { code: String, stderr: String },

    #[error("synthesizer finished but produced no output at {}", .path.display())]
    MissingOutput { path: PathBuf },

    #[error("synthesis engine error: {0}")]
    Engine(String),

    #[error("invalid synthesizer input: {0}")]
    InvalidInput(#[from] AlignmentError),

    #[error("audio error: {0}")]
    Audio(#[from] MixError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("lyric analysis failed: {0}")]
    Analysis(String),

    #[error("melody generation failed: {0}")]
    Melody(String),

    #[error("alignment check failed: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("mixing failed: {0}")]
    Mix(#[from] MixError),

    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MIDI error: {0}")]
    Midi(String),
}
