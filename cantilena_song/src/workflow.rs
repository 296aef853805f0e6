// Workflow coordinator.
//
// `Composer` runs the whole lyric-to-song pipeline over boxed stage
// capabilities, so any stage can be swapped (tests use fakes for all of
// them). The run moves a `Song` through its stages:
//
//   Created -> Analyzed -> Melodized -> Validated -> SynthesisPrepared
//     -> SymbolicRendered -> VocalSynthesized -> Mixed -> MetadataSaved
//
// Everything up to SynthesisPrepared is fatal: an analysis or melody error,
// a failed alignment gate or an invalid synthesizer payload aborts the run.
// The later stages degrade: their failures are logged, recorded on the song
// and the corresponding output path stays empty. The final mix runs only
// when both the MIDI file and the vocal exist.
//
// Output files share one stem, `{safe_title}_{YYYYmmdd_HHMMSS}`, inside the
// configured output directory.

use cantilena_audio::{default_soundfont_candidates, discover_soundfont};
use cantilena_llm::{ChatCompletionsClient, NoSuggestions, TextSuggestionService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::accompaniment::plan_accompaniment;
use crate::analysis::LyricAnalysis;
use crate::analyzer::{LyricAnalyzer, SuggestedLyricAnalyzer};
use crate::config::ComposerConfig;
use crate::diffsinger::DiffSingerInput;
use crate::error::{AlignmentError, ComposeError};
use crate::generator::{ContourMelodyGenerator, MelodyGenerator};
use crate::melody::{Melody, validate_melody};
use crate::midi::write_melody_midi;
use crate::mixing::{AudioMixer, MixLevels, Mixer};
use crate::song::{Song, SongStage};
use crate::synthesis::{ExternalProcessSynthesizer, SynthesisAdapter};

const MAX_TITLE_CHARS: usize = 20;

/// Per-run switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeOptions {
    pub synthesize: bool,
    pub export_midi: bool,
    pub create_final_mix: bool,
    pub accompaniment: bool,
    pub levels: MixLevels,
}

impl ComposeOptions {
    pub fn from_config(config: &ComposerConfig) -> Self {
        Self {
            synthesize: true,
            export_midi: true,
            create_final_mix: true,
            accompaniment: config.accompaniment,
            levels: MixLevels::from_config(&config.mix),
        }
    }
}

/// Keep alphanumerics, replace everything else with '_', cut to 20 chars.
pub fn safe_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Output files of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub midi: PathBuf,
    pub vocal: PathBuf,
    pub final_mix: PathBuf,
    pub metadata: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path, title: &str, timestamp: &str) -> Self {
        let stem = format!("{}_{}", safe_title(title), timestamp);
        Self {
            midi: output_dir.join(format!("{stem}.mid")),
            vocal: output_dir.join(format!("{stem}.wav")),
            final_mix: output_dir.join(format!("{stem}_final.wav")),
            metadata: output_dir.join(format!("{stem}_metadata.json")),
        }
    }

    /// Paths stamped with the current local time.
    pub fn now(output_dir: &Path, title: &str) -> Self {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::new(output_dir, title, &timestamp)
    }
}

pub struct Composer {
    config: ComposerConfig,
    analyzer: Box<dyn LyricAnalyzer>,
    generator: Box<dyn MelodyGenerator>,
    synthesizer: Box<dyn SynthesisAdapter>,
    mixer: Box<dyn Mixer>,
    chords: Box<dyn TextSuggestionService>,
}

impl Composer {
    pub fn new(
        config: ComposerConfig,
        analyzer: Box<dyn LyricAnalyzer>,
        generator: Box<dyn MelodyGenerator>,
        synthesizer: Box<dyn SynthesisAdapter>,
        mixer: Box<dyn Mixer>,
        chords: Box<dyn TextSuggestionService>,
    ) -> Self {
        Self {
            config,
            analyzer,
            generator,
            synthesizer,
            mixer,
            chords,
        }
    }

    /// Production wiring: the configured suggestion service (or none), the
    /// external synthesizer and the SoundFont mixer. `soundfont` overrides
    /// the configured path; without either the usual locations are searched.
    pub fn from_config(config: ComposerConfig, soundfont: Option<PathBuf>) -> Self {
        let service = suggestion_service(&config);
        let soundfont = soundfont.or_else(|| config.mix.soundfont.clone()).or_else(|| {
            let home = std::env::var_os("HOME").map(PathBuf::from);
            discover_soundfont(&default_soundfont_candidates(home.as_deref()))
        });

        let analyzer = SuggestedLyricAnalyzer::new(
            Arc::clone(&service),
            config.language.forced(),
            config.melody.default_tempo,
        );
        let generator = ContourMelodyGenerator::new(Arc::clone(&service), config.melody.clone());
        let synthesizer = ExternalProcessSynthesizer::new(config.synthesis.external.clone());
        let mixer = AudioMixer::new(config.mix.clone(), soundfont);
        Self::new(
            config,
            Box::new(analyzer),
            Box::new(generator),
            Box::new(synthesizer),
            Box::new(mixer),
            Box::new(service),
        )
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    fn analyze(&self, lyrics: &str) -> Result<LyricAnalysis, ComposeError> {
        self.analyzer.analyze(lyrics).inspect_err(|e| {
            error!(error = %e, "Lyric analysis failed");
        })
    }

    fn generate(&self, analysis: &LyricAnalysis) -> Result<Melody, ComposeError> {
        self.generator.generate(analysis).inspect_err(|e| {
            error!(error = %e, "Melody generation failed");
        })
    }

    fn alignment_gate(analysis: &LyricAnalysis, melody: &Melody) -> Result<(), AlignmentError> {
        let expected = analysis.word_list.len();
        if melody.word_notes.len() != expected {
            return Err(AlignmentError::WordCountMismatch {
                expected,
                actual: melody.word_notes.len(),
            });
        }
        validate_melody(melody, expected)
    }

    fn synth_input(melody: &Melody) -> Result<DiffSingerInput, AlignmentError> {
        let input = DiffSingerInput::serialize(melody);
        input.validate()?;
        info!(units = input.unit_count(), "Prepared synthesizer input");
        Ok(input)
    }

    /// Run analysis, melody, the alignment gate and serialization only.
    pub fn prepare_synth_input(&self, lyrics: &str) -> Result<DiffSingerInput, ComposeError> {
        let analysis = self.analyze(lyrics)?;
        let melody = self.generate(&analysis)?;
        Self::alignment_gate(&analysis, &melody)?;
        Ok(Self::synth_input(&melody)?)
    }

    /// Run the full workflow.
    pub fn compose(
        &self,
        lyrics: &str,
        title: &str,
        options: &ComposeOptions,
    ) -> Result<Song, ComposeError> {
        info!(title, "Starting song composition");
        let paths = OutputPaths::now(&self.config.output_dir, title);
        let mut song = Song::new(title, lyrics);

        let analysis = self.analyze(lyrics)?;
        song.style = analysis.suggested_style;
        song.advance(SongStage::Analyzed);
        info!(
            words = analysis.total_words,
            mood = analysis.emotional_tone.name(),
            "Analysis ready"
        );

        let melody = self.generate(&analysis)?;
        song.advance(SongStage::Melodized);
        info!(seconds = melody.total_duration(), "Melody ready");

        if let Err(e) = Self::alignment_gate(&analysis, &melody) {
            error!(error = %e, "Workflow validation failed");
            return Err(e.into());
        }
        song.advance(SongStage::Validated);

        let input = Self::synth_input(&melody).inspect_err(|e| {
            error!(error = %e, "Synthesizer input validation failed");
        })?;
        song.advance(SongStage::SynthesisPrepared);

        if options.export_midi {
            let accompaniment = options.accompaniment.then(|| {
                plan_accompaniment(&melody, analysis.suggested_style, self.chords.as_ref())
            });
            match write_melody_midi(&melody, accompaniment.as_ref(), &paths.midi) {
                Ok(()) => {
                    song.midi_path = Some(paths.midi.clone());
                    song.advance(SongStage::SymbolicRendered);
                }
                Err(e) => song.record_failure(SongStage::SymbolicRendered, e.to_string()),
            }
        }

        if options.synthesize {
            info!(synthesizer = self.synthesizer.name(), "Synthesizing vocals");
            match self.synthesizer.synthesize(&input, &paths.vocal) {
                Ok(path) => {
                    song.vocal_audio_path = Some(path);
                    song.advance(SongStage::VocalSynthesized);
                }
                Err(e) => song.record_failure(SongStage::VocalSynthesized, e.to_string()),
            }
        }

        if options.create_final_mix {
            match (&song.midi_path, &song.vocal_audio_path) {
                (Some(midi), Some(vocal)) => {
                    match self
                        .mixer
                        .create_final_mix(midi, vocal, &paths.final_mix, options.levels)
                    {
                        Ok(path) => {
                            song.final_audio_path = Some(path);
                            song.advance(SongStage::Mixed);
                        }
                        Err(e) => song.record_failure(SongStage::Mixed, e.to_string()),
                    }
                }
                _ => info!("Skipping final mix: MIDI or vocal track missing"),
            }
        }

        song.analysis = Some(analysis);
        song.melody = Some(melody);
        song.diffsinger_input = Some(input);
        self.save_metadata(&mut song, &paths.metadata);

        info!(stage = %song.stage, failures = song.failures.len(), "Composition complete");
        Ok(song)
    }

    fn save_metadata(&self, song: &mut Song, path: &Path) {
        let previous = song.stage;
        song.metadata_path = Some(path.to_path_buf());
        song.advance(SongStage::MetadataSaved);
        let result = serde_json::to_string_pretty(&*song)
            .map_err(ComposeError::from)
            .and_then(|json| {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, json)?;
                Ok(())
            });
        match result {
            Ok(()) => info!(path = %path.display(), "Metadata saved"),
            Err(e) => {
                song.metadata_path = None;
                song.stage = previous;
                song.record_failure(SongStage::MetadataSaved, e.to_string());
            }
        }
    }

    /// Mix an existing MIDI file and vocal WAV.
    pub fn mix_existing(
        &self,
        midi: &Path,
        vocal: &Path,
        output: &Path,
        levels: MixLevels,
    ) -> Result<PathBuf, ComposeError> {
        for input in [midi, vocal] {
            if !input.is_file() {
                error!(path = %input.display(), "Mixing input not found");
                return Err(ComposeError::MissingInput(input.to_path_buf()));
            }
        }
        Ok(self.mixer.create_final_mix(midi, vocal, output, levels)?)
    }
}

/// The configured chat-completions client, or `NoSuggestions` when no key is
/// set or the client cannot be built.
fn suggestion_service(config: &ComposerConfig) -> Arc<dyn TextSuggestionService> {
    if !config.llm.is_configured() {
        warn!("No suggestion service configured; using rule-based fallbacks");
        return Arc::new(NoSuggestions::new("no API key configured"));
    }
    match ChatCompletionsClient::new(
        config.llm.api_url.clone(),
        config.llm.model.clone(),
        config.llm.api_key.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "Suggestion client unavailable; using rule-based fallbacks");
            Arc::new(NoSuggestions::new(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_title() {
        assert_eq!(safe_title("My Song!"), "My_Song_");
        assert_eq!(safe_title("小酒窝 长睫毛"), "小酒窝_长睫毛");
        assert_eq!(safe_title(&"x".repeat(40)).chars().count(), 20);
        assert_eq!(safe_title(""), "");
    }

    #[test]
    fn test_output_paths_share_stem() {
        let paths = OutputPaths::new(Path::new("out"), "Hi there", "20240101_120000");
        assert_eq!(paths.midi, PathBuf::from("out/Hi_there_20240101_120000.mid"));
        assert_eq!(paths.vocal, PathBuf::from("out/Hi_there_20240101_120000.wav"));
        assert_eq!(
            paths.final_mix,
            PathBuf::from("out/Hi_there_20240101_120000_final.wav")
        );
        assert_eq!(
            paths.metadata,
            PathBuf::from("out/Hi_there_20240101_120000_metadata.json")
        );
    }

    #[test]
    fn test_options_follow_config() {
        let config = ComposerConfig {
            accompaniment: true,
            ..ComposerConfig::default()
        };
        let options = ComposeOptions::from_config(&config);
        assert!(options.accompaniment && options.synthesize);
        assert_eq!(options.levels.vocal_volume, 1.0);
    }
}
