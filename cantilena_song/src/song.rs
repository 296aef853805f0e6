// The song aggregate.
//
// `Song` collects everything one workflow run produces. It owns its parts
// outright (analysis, melody, synthesizer input) and refers to output files
// by path. `stage` is the last stage reached; `failures` records the stages
// that were attempted and failed without aborting the run.

use cantilena_theory::MusicStyle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use crate::analysis::LyricAnalysis;
use crate::diffsinger::DiffSingerInput;
use crate::melody::Melody;

/// Workflow stages in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongStage {
    Created,
    Analyzed,
    Melodized,
    Validated,
    SynthesisPrepared,
    SymbolicRendered,
    VocalSynthesized,
    Mixed,
    MetadataSaved,
}

impl fmt::Display for SongStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SongStage::Created => "created",
            SongStage::Analyzed => "analyzed",
            SongStage::Melodized => "melodized",
            SongStage::Validated => "validated",
            SongStage::SynthesisPrepared => "synthesis prepared",
            SongStage::SymbolicRendered => "symbolic rendered",
            SongStage::VocalSynthesized => "vocal synthesized",
            SongStage::Mixed => "mixed",
            SongStage::MetadataSaved => "metadata saved",
        };
        f.write_str(name)
    }
}

/// A stage that failed without stopping the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: SongStage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub lyrics: String,
    pub style: MusicStyle,
    pub analysis: Option<LyricAnalysis>,
    pub melody: Option<Melody>,
    pub diffsinger_input: Option<DiffSingerInput>,
    pub midi_path: Option<PathBuf>,
    pub vocal_audio_path: Option<PathBuf>,
    pub final_audio_path: Option<PathBuf>,
    pub metadata_path: Option<PathBuf>,
    pub stage: SongStage,
    pub failures: Vec<StageFailure>,
}

impl Song {
    pub fn new(title: impl Into<String>, lyrics: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lyrics: lyrics.into(),
            style: MusicStyle::default(),
            analysis: None,
            melody: None,
            diffsinger_input: None,
            midi_path: None,
            vocal_audio_path: None,
            final_audio_path: None,
            metadata_path: None,
            stage: SongStage::Created,
            failures: Vec::new(),
        }
    }

    pub fn advance(&mut self, stage: SongStage) {
        self.stage = stage;
    }

    /// Log and keep a degraded-stage failure.
    pub fn record_failure(&mut self, stage: SongStage, message: impl Into<String>) {
        let message = message.into();
        warn!(%stage, %message, "Stage failed, continuing");
        self.failures.push(StageFailure { stage, message });
    }

    pub fn failed(&self, stage: SongStage) -> bool {
        self.failures.iter().any(|f| f.stage == stage)
    }

    /// Analysis, melody and synthesizer input are all present.
    pub fn is_complete(&self) -> bool {
        self.analysis.is_some() && self.melody.is_some() && self.diffsinger_input.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(SongStage::Created < SongStage::Validated);
        assert!(SongStage::Mixed < SongStage::MetadataSaved);
        assert_eq!(SongStage::SymbolicRendered.to_string(), "symbolic rendered");
    }

    #[test]
    fn test_failures_are_recorded() {
        let mut song = Song::new("t", "l");
        assert!(!song.is_complete());
        song.record_failure(SongStage::VocalSynthesized, "no synthesizer");
        assert!(song.failed(SongStage::VocalSynthesized));
        assert!(!song.failed(SongStage::Mixed));
        assert_eq!(song.stage, SongStage::Created);
    }

    #[test]
    fn test_serializes_non_ascii_literally() {
        let song = Song::new("酒窝", "小酒窝");
        let json = serde_json::to_string_pretty(&song).unwrap();
        assert!(json.contains("\"小酒窝\""));
        assert!(json.contains("\"stage\": \"created\""));
    }
}
