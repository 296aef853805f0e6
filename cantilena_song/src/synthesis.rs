// Vocal synthesis adapters.
//
// A `SynthesisAdapter` turns a validated `DiffSingerInput` into a WAV file.
// Two implementations:
// - `InProcessSynthesizer`: wraps any `SingingEngine` that returns raw audio;
//   the audio is brought to mono float, peak-limited and written as WAV.
// - `ExternalProcessSynthesizer`: runs the synthesizer's inference script
//   in its own project directory, hands it the payload as a JSON file and
//   copies the fixed output file to the destination.
//
// Both validate the input before doing anything else; an invalid payload
// never reaches an engine or a process.
//
// The external script always writes to the same location inside its project,
// so one installation serves one workflow at a time.

use cantilena_audio::{RawAudio, normalize_to_mono_float, peak, write_wav};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info};

use crate::config::ExternalSynthConfig;
use crate::diffsinger::{DiffSingerInput, SynthPayload};
use crate::error::SynthesisError;

pub trait SynthesisAdapter {
    fn name(&self) -> &str;

    /// Synthesize `input` into a WAV file at `output` and return its path.
    fn synthesize(&self, input: &DiffSingerInput, output: &Path)
    -> Result<PathBuf, SynthesisError>;
}

/// Audio returned by an in-process engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub audio: RawAudio,
    pub sample_rate: u32,
}

/// A singing model that can be called directly.
pub trait SingingEngine {
    fn infer(&self, payload: &SynthPayload) -> Result<Waveform, String>;
}

pub struct InProcessSynthesizer<E> {
    engine: E,
}

impl<E: SingingEngine> InProcessSynthesizer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

impl<E: SingingEngine> SynthesisAdapter for InProcessSynthesizer<E> {
    fn name(&self) -> &str {
        "in-process"
    }

    fn synthesize(
        &self,
        input: &DiffSingerInput,
        output: &Path,
    ) -> Result<PathBuf, SynthesisError> {
        input.validate()?;
        let waveform = self
            .engine
            .infer(&input.to_payload())
            .map_err(SynthesisError::Engine)?;
        let mut samples = normalize_to_mono_float(&waveform.audio)?;
        let p = peak(&samples);
        if p > 1.0 {
            samples.iter_mut().for_each(|s| *s /= p);
        }
        write_wav(output, &samples, waveform.sample_rate)?;
        info!(path = %output.display(), samples = samples.len(), "Vocal synthesized");
        Ok(output.to_path_buf())
    }
}

pub struct ExternalProcessSynthesizer {
    config: ExternalSynthConfig,
}

impl ExternalProcessSynthesizer {
    pub fn new(config: ExternalSynthConfig) -> Self {
        Self { config }
    }

    fn project_root(&self) -> Result<PathBuf, SynthesisError> {
        let root = std::path::absolute(&self.config.project_root)?;
        if !root.is_dir() {
            return Err(SynthesisError::NotFound {
                what: "synthesizer project root",
                path: root,
            });
        }
        Ok(root)
    }
}

impl SynthesisAdapter for ExternalProcessSynthesizer {
    fn name(&self) -> &str {
        "external"
    }

    fn synthesize(
        &self,
        input: &DiffSingerInput,
        output: &Path,
    ) -> Result<PathBuf, SynthesisError> {
        input.validate()?;
        let root = self.project_root()?;
        let script = root.join(&self.config.script_path);
        if !script.is_file() {
            return Err(SynthesisError::NotFound {
                what: "synthesizer script",
                path: script,
            });
        }

        let mut payload_file = tempfile::Builder::new()
            .prefix("cantilena-")
            .suffix(".json")
            .tempfile()?;
        serde_json::to_writer(&mut payload_file, &input.to_payload())?;
        payload_file.flush()?;

        let mut command = Command::new(&self.config.python_path);
        command
            .arg(&script)
            .arg("--config")
            .arg(&self.config.config_path)
            .arg("--exp_name")
            .arg(&self.config.exp_name)
            .arg("--input_file")
            .arg(payload_file.path())
            .current_dir(&root)
            .env("PYTHONPATH", &root);
        if std::env::var_os("CUDA_VISIBLE_DEVICES").is_none() {
            command.env("CUDA_VISIBLE_DEVICES", "0");
        }
        info!(root = %root.display(), script = %script.display(), "Running synthesizer");

        let result = command.output()?;
        let stdout = String::from_utf8_lossy(&result.stdout);
        let tail: String = {
            let chars: Vec<char> = stdout.chars().collect();
            chars[chars.len().saturating_sub(500)..].iter().collect()
        };
        debug!(stdout = %tail, "synthesizer output");
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            error!(status = %result.status, %stderr, "Synthesizer process failed");
            return Err(SynthesisError::ProcessFailed {
                code: result.status.to_string(),
                stderr,
            });
        }

        let produced = root.join(&self.config.output_relpath);
        if !produced.is_file() {
            return Err(SynthesisError::MissingOutput { path: produced });
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&produced, output)?;
        info!(path = %output.display(), "Vocal synthesized");
        Ok(output.to_path_buf())
    }
}
