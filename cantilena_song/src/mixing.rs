// Final mix: rendered backing track plus synthesized vocal.
//
// Steps, each logged:
// 1. Render the MIDI file through the SoundFont (first backend that works).
// 2. Load the vocal WAV.
// 3. Bring the backing to mono and resample it to the vocal's rate.
// 4. Match lengths, apply volumes, peak-normalize, write the result.
//
// The SoundFont path is injected at construction; discovery happens in the
// caller. Mixing without one fails with `MixError::SoundfontNotFound`.

use cantilena_audio::{
    MixError, RawAudio, RenderBackend, backends_for, mix_with_mode, normalize_to_mono_float,
    read_wav, render_backing_track, resample, write_wav,
};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::MixConfig;

/// Per-track volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixLevels {
    pub melody_volume: f64,
    pub vocal_volume: f64,
}

impl MixLevels {
    pub fn from_config(config: &MixConfig) -> Self {
        Self {
            melody_volume: config.melody_volume,
            vocal_volume: config.vocal_volume,
        }
    }
}

pub trait Mixer {
    /// Mix the backing rendered from `midi` with `vocal` into `output`.
    fn create_final_mix(
        &self,
        midi: &Path,
        vocal: &Path,
        output: &Path,
        levels: MixLevels,
    ) -> Result<PathBuf, MixError>;
}

pub struct AudioMixer {
    config: MixConfig,
    soundfont: Option<PathBuf>,
    backends: Vec<Box<dyn RenderBackend>>,
}

impl AudioMixer {
    pub fn new(config: MixConfig, soundfont: Option<PathBuf>) -> Self {
        let backends = backends_for(&config.backends);
        Self {
            config,
            soundfont,
            backends,
        }
    }

    /// Replace the render backends.
    pub fn with_backends(mut self, backends: Vec<Box<dyn RenderBackend>>) -> Self {
        self.backends = backends;
        self
    }

    pub fn soundfont(&self) -> Option<&Path> {
        self.soundfont.as_deref()
    }
}

impl Mixer for AudioMixer {
    fn create_final_mix(
        &self,
        midi: &Path,
        vocal: &Path,
        output: &Path,
        levels: MixLevels,
    ) -> Result<PathBuf, MixError> {
        let soundfont = self
            .soundfont
            .as_deref()
            .ok_or_else(|| MixError::SoundfontNotFound {
                searched: Vec::new(),
            })?;

        info!(midi = %midi.display(), "Rendering MIDI to audio");
        let rendered = render_backing_track(
            &self.backends,
            midi,
            soundfont,
            self.config.render_sample_rate,
        )?;

        info!(vocal = %vocal.display(), "Loading vocals");
        let (vocal_audio, vocal_rate) = read_wav(vocal)?;

        let mut backing = normalize_to_mono_float(&rendered.audio)?;
        if rendered.sample_rate != vocal_rate {
            info!(
                from = rendered.sample_rate,
                to = vocal_rate,
                "Resampling backing track"
            );
            backing = resample(&backing, rendered.sample_rate, vocal_rate);
        }

        info!(
            melody_volume = levels.melody_volume,
            vocal_volume = levels.vocal_volume,
            "Mixing tracks"
        );
        let mixed = mix_with_mode(
            &RawAudio::mono_f64(backing),
            &vocal_audio,
            levels.melody_volume,
            levels.vocal_volume,
            self.config.normalize,
            self.config.target_db,
            self.config.length_mode,
        )?;
        write_wav(output, &mixed, vocal_rate)?;
        Ok(output.to_path_buf())
    }
}
