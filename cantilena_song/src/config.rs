// Composer configuration.
//
// All tunable workflow parameters live in `ComposerConfig`, loaded from JSON
// at startup. Every section carries `#[serde(default)]`, so a config file
// only needs the keys it changes and an empty object is a valid config.
//
// Layering, lowest to highest precedence:
// 1. Built-in defaults (`Default` impls below).
// 2. The JSON file given with `--config`.
// 3. Environment overrides (`apply_env_overrides`, fed by a lookup function
//    so tests never touch the process environment).
// 4. Command-line flags, applied by the binary.
//
// See also: `workflow.rs` which owns the config, `synthesis.rs` which reads
// the `external` section, `mixing.rs` which reads `mix`.

use cantilena_audio::{BackendKind, LengthMode};
use cantilena_text::Language;
use cantilena_theory::ContourShape;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ComposeError;

// ---------------------------------------------------------------------------
// Melody
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyConfig {
    /// Tempo (BPM) used when the lyric analysis fell back entirely.
    pub default_tempo: u32,
    pub contour: ContourShape,
    /// Seed for the rule-based fallback. None draws from the OS.
    pub seed: Option<u64>,
    /// Pitch substituted for missing or malformed suggested notes.
    pub fallback_pitch: String,
    /// Seconds substituted for missing, non-positive or over-long suggested
    /// durations.
    pub fallback_duration: f64,
    /// Longest suggested note accepted, in seconds.
    pub max_duration: f64,
    pub min_octave: u8,
    pub max_octave: u8,
}

impl Default for MelodyConfig {
    fn default() -> Self {
        Self {
            default_tempo: 100,
            contour: ContourShape::Wave,
            seed: None,
            fallback_pitch: "C4".to_string(),
            fallback_duration: 0.4,
            max_duration: 8.0,
            min_octave: 3,
            max_octave: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// Suggestion service
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Empty means no service: every suggestion falls back.
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.cerebras.ai/v1/chat/completions".to_string(),
            model: "zai-glm-4.6".to_string(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Where the external singing synthesizer lives. Relative paths inside the
/// project are resolved against `project_root`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSynthConfig {
    pub python_path: String,
    pub project_root: PathBuf,
    pub script_path: PathBuf,
    pub config_path: PathBuf,
    pub exp_name: String,
    /// Fixed output location the script writes to.
    pub output_relpath: PathBuf,
}

impl Default for ExternalSynthConfig {
    fn default() -> Self {
        Self {
            python_path: "python".to_string(),
            project_root: PathBuf::from("../DiffSinger-master"),
            script_path: PathBuf::from("inference/svs/ds_e2e.py"),
            config_path: PathBuf::from("usr/configs/midi/e2e/opencpop/ds100_adj_rel.yaml"),
            exp_name: "0228_opencpop_ds100_rel".to_string(),
            output_relpath: PathBuf::from("infer_out/example_out.wav"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// The synthesizer decides its own output rate; the mixer resamples.
    pub external: ExternalSynthConfig,
}

// ---------------------------------------------------------------------------
// Mixing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub melody_volume: f64,
    pub vocal_volume: f64,
    pub normalize: bool,
    /// Peak target in dBFS when normalizing.
    pub target_db: f64,
    pub render_sample_rate: u32,
    pub length_mode: LengthMode,
    /// None means search the usual install locations.
    pub soundfont: Option<PathBuf>,
    /// Render backends in preference order.
    pub backends: Vec<BackendKind>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            melody_volume: 0.9,
            vocal_volume: 1.0,
            normalize: true,
            target_db: -3.0,
            render_sample_rate: 44_100,
            length_mode: LengthMode::Pad,
            soundfont: None,
            backends: BackendKind::DEFAULT_ORDER.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Forced lyric language, or automatic detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageSetting {
    #[default]
    Auto,
    Chinese,
    English,
}

impl LanguageSetting {
    /// The forced language, or None for detection.
    pub fn forced(self) -> Option<Language> {
        match self {
            LanguageSetting::Auto => None,
            LanguageSetting::Chinese => Some(Language::Chinese),
            LanguageSetting::English => Some(Language::English),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub output_dir: PathBuf,
    pub language: LanguageSetting,
    /// Add drum, bass and chord tracks to the MIDI file.
    pub accompaniment: bool,
    pub melody: MelodyConfig,
    pub llm: LlmConfig,
    pub synthesis: SynthesisConfig,
    pub mix: MixConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            language: LanguageSetting::Auto,
            accompaniment: false,
            melody: MelodyConfig::default(),
            llm: LlmConfig::default(),
            synthesis: SynthesisConfig::default(),
            mix: MixConfig::default(),
        }
    }
}

impl ComposerConfig {
    pub fn from_json(json: &str) -> Result<Self, ComposeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ComposeError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Apply `LLM_*` and `DS_*` overrides. Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = get("LLM_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(url) = get("LLM_API_URL") {
            self.llm.api_url = url;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(python) = get("DS_PYTHON_PATH") {
            self.synthesis.external.python_path = python;
        }
        if let Some(root) = get("DS_PROJECT_ROOT") {
            self.synthesis.external.project_root = PathBuf::from(root);
        }
    }
}
