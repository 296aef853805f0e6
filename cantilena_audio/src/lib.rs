// Cantilena audio post-processing.
//
// Two independently produced signals meet here: the backing track rendered
// from a MIDI file through a SoundFont, and the synthesized vocal. They
// arrive with different shapes, sample formats, sample rates and lengths.
// This crate brings both to mono f64 in [-1, 1], resamples the backing to the
// vocal's rate, matches lengths, applies per-track volume and peak-normalizes
// the sum.
//
// Architecture:
// - error.rs: `MixError`
// - buffer.rs: `RawAudio` / `SampleData` (arbitrary shape and format) and
//   `normalize_to_mono_float`
// - mix.rs: Length matching, peak normalization, two-track mixing
// - resample.rs: Sinc resampling via rubato with a linear fallback
// - wav.rs: WAV read/write via hound
// - render.rs: `RenderBackend` trait, the in-process and command-line
//   backends, and `render_backing_track` (first success wins)
// - soundfont.rs: Soundfont discovery over candidate paths
//
// Everything is synchronous and single-threaded.

pub mod buffer;
pub mod error;
pub mod mix;
pub mod render;
pub mod resample;
pub mod soundfont;
pub mod wav;

pub use buffer::{RawAudio, SampleData, normalize_to_mono_float};
pub use error::MixError;
pub use mix::{LengthMode, match_lengths, mix, mix_with_mode, normalize_peak, peak};
pub use render::{
    BackendKind, FluidSynthCli, RenderAttempt, RenderBackend, RenderedAudio, RustySynthBackend,
    TimidityCli, backends_for, render_backing_track,
};
pub use resample::{resample, resample_linear};
pub use soundfont::{default_soundfont_candidates, discover_soundfont, expand_home};
pub use wav::{read_wav, write_wav};
