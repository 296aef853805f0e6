use std::path::PathBuf;
use thiserror::Error;

use crate::render::RenderAttempt;

#[derive(Debug, Error)]
pub enum MixError {
    #[error("soundfont not found (looked at: {})", join_paths(.searched))]
    SoundfontNotFound { searched: Vec<PathBuf> },

    #[error("every render backend failed: {}", join_attempts(.attempts))]
    RenderFailed { attempts: Vec<RenderAttempt> },

    #[error("audio shape {shape:?} does not match {len} samples")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no candidates".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_attempts(attempts: &[RenderAttempt]) -> String {
    if attempts.is_empty() {
        return "no backends configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
