// Backing-track rendering from MIDI through a SoundFont.
//
// Three backends, tried in a fixed order until one succeeds:
// 1. `RustySynthBackend`: in-process SoundFont synthesis, no external tools.
// 2. `FluidSynthCli`: the `fluidsynth` program, fast-render to a WAV file.
// 3. `TimidityCli`: the `timidity` program with the SoundFont injected via
//    a config directive.
//
// The command-line backends write into a private temporary directory that
// is removed when rendering finishes. Each failure is kept as a
// `RenderAttempt` so the final error explains every backend's reason.

use crate::buffer::{RawAudio, SampleData};
use crate::error::MixError;
use crate::wav::read_wav;
use rustysynth::{MidiFile, MidiFileSequencer, SoundFont, Synthesizer, SynthesizerSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing::{info, warn};

/// Audio produced by a backend, in whatever shape it came out.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAudio {
    pub audio: RawAudio,
    pub sample_rate: u32,
}

/// One backend's failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAttempt {
    pub backend: String,
    pub reason: String,
}

impl fmt::Display for RenderAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

pub trait RenderBackend {
    fn name(&self) -> &str;

    fn render(
        &self,
        midi: &Path,
        soundfont: &Path,
        sample_rate: u32,
    ) -> Result<RenderedAudio, String>;
}

/// Backend selector used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    RustySynth,
    FluidSynth,
    Timidity,
}

impl BackendKind {
    pub const DEFAULT_ORDER: [BackendKind; 3] = [
        BackendKind::RustySynth,
        BackendKind::FluidSynth,
        BackendKind::Timidity,
    ];

    pub fn backend(self) -> Box<dyn RenderBackend> {
        match self {
            BackendKind::RustySynth => Box::new(RustySynthBackend),
            BackendKind::FluidSynth => Box::new(FluidSynthCli::default()),
            BackendKind::Timidity => Box::new(TimidityCli::default()),
        }
    }
}

/// Instantiate backends in the given order.
pub fn backends_for(kinds: &[BackendKind]) -> Vec<Box<dyn RenderBackend>> {
    kinds.iter().map(|kind| kind.backend()).collect()
}

/// In-process SoundFont synthesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustySynthBackend;

impl RenderBackend for RustySynthBackend {
    fn name(&self) -> &str {
        "rustysynth"
    }

    fn render(
        &self,
        midi: &Path,
        soundfont: &Path,
        sample_rate: u32,
    ) -> Result<RenderedAudio, String> {
        let mut sf2 = File::open(soundfont).map_err(|e| format!("open soundfont: {e}"))?;
        let sound_font =
            Arc::new(SoundFont::new(&mut sf2).map_err(|e| format!("load soundfont: {e:?}"))?);
        let mut mid = File::open(midi).map_err(|e| format!("open MIDI: {e}"))?;
        let midi_file = Arc::new(MidiFile::new(&mut mid).map_err(|e| format!("load MIDI: {e:?}"))?);

        let settings = SynthesizerSettings::new(sample_rate as i32);
        let synthesizer = Synthesizer::new(&sound_font, &settings)
            .map_err(|e| format!("create synthesizer: {e:?}"))?;
        let mut sequencer = MidiFileSequencer::new(synthesizer);
        sequencer.play(&midi_file, false);

        // One extra second so the last notes can release.
        let frames = (sample_rate as f64 * (midi_file.get_length() + 1.0)) as usize;
        let mut left = vec![0f32; frames];
        let mut right = vec![0f32; frames];
        sequencer.render(&mut left[..], &mut right[..]);

        left.extend_from_slice(&right);
        Ok(RenderedAudio {
            audio: RawAudio {
                data: SampleData::F32(left),
                shape: vec![2, frames],
            },
            sample_rate,
        })
    }
}

/// Run `command`, then load `wav` from its output directory.
fn run_and_load(mut command: Command, program: &str, wav: &Path) -> Result<RenderedAudio, String> {
    let output = command.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => format!("{program} is not installed"),
        _ => format!("failed to run {program}: {e}"),
    })?;
    if !output.status.success() {
        return Err(format!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    if !wav.exists() {
        return Err(format!("{program} produced no output file"));
    }
    let (audio, sample_rate) = read_wav(wav).map_err(|e| e.to_string())?;
    Ok(RenderedAudio { audio, sample_rate })
}

/// The `fluidsynth` command-line renderer.
#[derive(Debug, Clone)]
pub struct FluidSynthCli {
    pub program: String,
}

impl Default for FluidSynthCli {
    fn default() -> Self {
        Self {
            program: "fluidsynth".to_string(),
        }
    }
}

impl RenderBackend for FluidSynthCli {
    fn name(&self) -> &str {
        "fluidsynth"
    }

    fn render(
        &self,
        midi: &Path,
        soundfont: &Path,
        sample_rate: u32,
    ) -> Result<RenderedAudio, String> {
        let dir = tempfile::tempdir().map_err(|e| format!("temp dir: {e}"))?;
        let wav = dir.path().join("backing.wav");
        let mut command = Command::new(&self.program);
        command
            .args(["-ni", "-g", "1.0", "-r"])
            .arg(sample_rate.to_string())
            .args(["-o", "audio.file.type=wav", "-F"])
            .arg(&wav)
            .arg(soundfont)
            .arg(midi);
        run_and_load(command, &self.program, &wav)
    }
}

/// The `timidity` command-line renderer.
#[derive(Debug, Clone)]
pub struct TimidityCli {
    pub program: String,
}

impl Default for TimidityCli {
    fn default() -> Self {
        Self {
            program: "timidity".to_string(),
        }
    }
}

impl RenderBackend for TimidityCli {
    fn name(&self) -> &str {
        "timidity"
    }

    fn render(
        &self,
        midi: &Path,
        soundfont: &Path,
        sample_rate: u32,
    ) -> Result<RenderedAudio, String> {
        let dir = tempfile::tempdir().map_err(|e| format!("temp dir: {e}"))?;
        let wav = dir.path().join("backing.wav");
        let mut command = Command::new(&self.program);
        command
            .arg("-Ow")
            .arg("-s")
            .arg(sample_rate.to_string())
            .arg("-x")
            .arg(format!("soundfont {}", soundfont.display()))
            .arg("-o")
            .arg(&wav)
            .arg(midi);
        run_and_load(command, &self.program, &wav)
    }
}

/// Render `midi` with the first backend that succeeds.
pub fn render_backing_track(
    backends: &[Box<dyn RenderBackend>],
    midi: &Path,
    soundfont: &Path,
    sample_rate: u32,
) -> Result<RenderedAudio, MixError> {
    if !soundfont.is_file() {
        return Err(MixError::SoundfontNotFound {
            searched: vec![soundfont.to_path_buf()],
        });
    }
    info!(soundfont = %soundfont.display(), midi = %midi.display(), "Rendering backing track");

    let mut attempts = Vec::new();
    for backend in backends {
        match backend.render(midi, soundfont, sample_rate) {
            Ok(rendered) => {
                info!(
                    backend = backend.name(),
                    sample_rate = rendered.sample_rate,
                    samples = rendered.audio.data.len(),
                    "Backing track rendered"
                );
                return Ok(rendered);
            }
            Err(reason) => {
                warn!(backend = backend.name(), %reason, "Render backend failed");
                attempts.push(RenderAttempt {
                    backend: backend.name().to_string(),
                    reason,
                });
            }
        }
    }
    Err(MixError::RenderFailed { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing(&'static str);

    impl RenderBackend for Failing {
        fn name(&self) -> &str {
            self.0
        }
        fn render(&self, _: &Path, _: &Path, _: u32) -> Result<RenderedAudio, String> {
            Err(format!("{} broke", self.0))
        }
    }

    struct Silent;

    impl RenderBackend for Silent {
        fn name(&self) -> &str {
            "silent"
        }
        fn render(&self, _: &Path, _: &Path, sample_rate: u32) -> Result<RenderedAudio, String> {
            Ok(RenderedAudio {
                audio: RawAudio::mono_f64(vec![0.0; 10]),
                sample_rate,
            })
        }
    }

    fn fake_soundfont() -> tempfile::NamedTempFile {
        tempfile::Builder::new().suffix(".sf2").tempfile().unwrap()
    }

    #[test]
    fn test_first_success_wins() {
        let sf = fake_soundfont();
        let backends: Vec<Box<dyn RenderBackend>> =
            vec![Box::new(Failing("a")), Box::new(Silent), Box::new(Failing("c"))];
        let rendered =
            render_backing_track(&backends, Path::new("x.mid"), sf.path(), 22_050).unwrap();
        assert_eq!(rendered.sample_rate, 22_050);
    }

    #[test]
    fn test_all_failures_collected_in_order() {
        let sf = fake_soundfont();
        let backends: Vec<Box<dyn RenderBackend>> =
            vec![Box::new(Failing("a")), Box::new(Failing("b"))];
        match render_backing_track(&backends, Path::new("x.mid"), sf.path(), 44_100) {
            Err(MixError::RenderFailed { attempts }) => {
                let names: Vec<&str> = attempts.iter().map(|a| a.backend.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
                assert_eq!(attempts[1].reason, "b broke");
            }
            other => panic!("expected RenderFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_soundfont_is_distinct() {
        let backends: Vec<Box<dyn RenderBackend>> = vec![Box::new(Silent)];
        let err = render_backing_track(
            &backends,
            Path::new("x.mid"),
            Path::new("/nope/none.sf2"),
            44_100,
        )
        .unwrap_err();
        assert!(matches!(err, MixError::SoundfontNotFound { .. }));
    }

    #[test]
    fn test_missing_program_reports_not_installed() {
        let sf = fake_soundfont();
        let backend = FluidSynthCli {
            program: "cantilena-no-such-renderer".to_string(),
        };
        let reason = backend
            .render(Path::new("x.mid"), sf.path(), 44_100)
            .unwrap_err();
        assert!(reason.contains("not installed"), "{reason}");
    }

    #[test]
    fn test_rustysynth_rejects_bogus_soundfont() {
        let sf = fake_soundfont();
        assert!(RustySynthBackend.render(Path::new("x.mid"), sf.path(), 44_100).is_err());
    }

    #[test]
    fn test_default_order() {
        let names: Vec<String> = backends_for(&BackendKind::DEFAULT_ORDER)
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["rustysynth", "fluidsynth", "timidity"]);
    }
}
