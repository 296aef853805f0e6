// Emotional tone and style tags.
//
// The lyric analyzer labels a song with one of eight tones and five styles.
// Two lookup tables hang off the tone: the scale family the fallback melody
// draws from, and a tempo used when no usable tempo was suggested.

use crate::scale::ScaleKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Joyful,
    Melancholic,
    Energetic,
    #[default]
    Peaceful,
    Romantic,
    Angry,
    Nostalgic,
    Hopeful,
}

impl EmotionalTone {
    pub const ALL: [EmotionalTone; 8] = [
        EmotionalTone::Joyful,
        EmotionalTone::Melancholic,
        EmotionalTone::Energetic,
        EmotionalTone::Peaceful,
        EmotionalTone::Romantic,
        EmotionalTone::Angry,
        EmotionalTone::Nostalgic,
        EmotionalTone::Hopeful,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EmotionalTone::Joyful => "joyful",
            EmotionalTone::Melancholic => "melancholic",
            EmotionalTone::Energetic => "energetic",
            EmotionalTone::Peaceful => "peaceful",
            EmotionalTone::Romantic => "romantic",
            EmotionalTone::Angry => "angry",
            EmotionalTone::Nostalgic => "nostalgic",
            EmotionalTone::Hopeful => "hopeful",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|tone| tone.name().eq_ignore_ascii_case(name))
    }

    /// Scale family the fallback melody uses for this tone.
    pub fn scale(self) -> ScaleKind {
        match self {
            EmotionalTone::Joyful
            | EmotionalTone::Energetic
            | EmotionalTone::Romantic
            | EmotionalTone::Hopeful => ScaleKind::Major,
            EmotionalTone::Melancholic | EmotionalTone::Angry | EmotionalTone::Nostalgic => {
                ScaleKind::Minor
            }
            EmotionalTone::Peaceful => ScaleKind::PentatonicMajor,
        }
    }

    /// Default tempo in BPM.
    pub fn tempo(self) -> u32 {
        match self {
            EmotionalTone::Joyful => 128,
            EmotionalTone::Melancholic => 66,
            EmotionalTone::Energetic => 140,
            EmotionalTone::Peaceful => 76,
            EmotionalTone::Romantic => 88,
            EmotionalTone::Angry => 100,
            EmotionalTone::Nostalgic => 84,
            EmotionalTone::Hopeful => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicStyle {
    #[default]
    Pop,
    Ballad,
    Rock,
    Folk,
    Classical,
}

impl MusicStyle {
    pub const ALL: [MusicStyle; 5] = [
        MusicStyle::Pop,
        MusicStyle::Ballad,
        MusicStyle::Rock,
        MusicStyle::Folk,
        MusicStyle::Classical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MusicStyle::Pop => "pop",
            MusicStyle::Ballad => "ballad",
            MusicStyle::Rock => "rock",
            MusicStyle::Folk => "folk",
            MusicStyle::Classical => "classical",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(name))
    }

    /// Styles whose backing chords are played as rhythmic stabs.
    pub fn is_rhythmic(self) -> bool {
        matches!(self, MusicStyle::Pop | MusicStyle::Rock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parse_is_case_insensitive() {
        assert_eq!(EmotionalTone::parse("Joyful"), Some(EmotionalTone::Joyful));
        assert_eq!(EmotionalTone::parse(" nostalgic "), Some(EmotionalTone::Nostalgic));
        assert_eq!(EmotionalTone::parse("wistful"), None);
    }

    #[test]
    fn test_tone_tables() {
        assert_eq!(EmotionalTone::Peaceful.scale(), ScaleKind::PentatonicMajor);
        assert_eq!(EmotionalTone::Melancholic.scale(), ScaleKind::Minor);
        assert_eq!(EmotionalTone::Hopeful.scale(), ScaleKind::Major);
        for tone in EmotionalTone::ALL {
            let tempo = tone.tempo();
            assert!((40..=240).contains(&tempo), "{tone:?} tempo {tempo} out of range");
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&EmotionalTone::Melancholic).unwrap();
        assert_eq!(json, "\"melancholic\"");
        let style: MusicStyle = serde_json::from_str("\"ballad\"").unwrap();
        assert_eq!(style, MusicStyle::Ballad);
    }

    #[test]
    fn test_rhythmic_styles() {
        assert!(MusicStyle::Pop.is_rhythmic());
        assert!(MusicStyle::Rock.is_rhythmic());
        assert!(!MusicStyle::Ballad.is_rhythmic());
    }
}
