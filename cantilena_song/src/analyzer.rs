// Lyric analysis stage.
//
// `SuggestedLyricAnalyzer` cleans the lyric, settles the language, asks the
// suggestion service for musical choices (tone, tempo, key, style) and
// builds the unit structure with the text tokenizer. The structure is always
// rule-based; only the musical choices come from the service, and each one
// falls back independently when it is missing or unusable.

use cantilena_llm::{CompletionRequest, Suggestion, TextSuggestionService, request_suggestion};
use cantilena_text::{Language, analyze_structure, clean_lyrics, detect_language};
use cantilena_theory::{EmotionalTone, Key, MusicStyle};
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::LyricAnalysis;
use crate::error::ComposeError;

const SYSTEM_PROMPT: &str = "You are a music composition expert. Analyze lyrics and provide \
                             musical suggestions in JSON format.";

/// Tempos outside this range are treated as missing.
const MIN_TEMPO: f64 = 40.0;
const MAX_TEMPO: f64 = 240.0;

pub trait LyricAnalyzer {
    fn analyze(&self, lyrics: &str) -> Result<LyricAnalysis, ComposeError>;
}

/// What the service may answer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSuggestion {
    pub emotional_tone: Option<String>,
    pub mood_description: Option<String>,
    pub suggested_tempo: Option<f64>,
    pub suggested_key: Option<String>,
    pub suggested_style: Option<String>,
    pub structure_notes: Option<String>,
}

pub struct SuggestedLyricAnalyzer<S> {
    service: S,
    forced_language: Option<Language>,
    default_tempo: u32,
}

impl<S: TextSuggestionService> SuggestedLyricAnalyzer<S> {
    pub fn new(service: S, forced_language: Option<Language>, default_tempo: u32) -> Self {
        Self {
            service,
            forced_language,
            default_tempo,
        }
    }

    fn prompt(lyrics: &str, language: Language) -> String {
        format!(
            r#"Analyze the following song lyrics and provide a detailed musical analysis.

Lyrics:
{lyrics}

Language: {language}

Please analyze and respond in the following JSON format:
{{
    "emotional_tone": "one of: joyful, melancholic, energetic, peaceful, romantic, angry, nostalgic, hopeful",
    "mood_description": "brief description of the overall mood",
    "suggested_tempo": <integer between 60-180>,
    "suggested_key": "musical key like C, G, Am, etc.",
    "suggested_style": "one of: pop, ballad, rock, folk, classical",
    "structure_notes": "observations about the lyric structure"
}}

Respond ONLY with the JSON object, no additional text."#,
            language = language.name()
        )
    }
}

/// Tempo to use: the suggestion when it is a sane BPM, else the tone's tempo.
fn resolve_tempo(suggested: Option<f64>, tone: EmotionalTone) -> u32 {
    suggested
        .filter(|t| t.is_finite())
        .map(|t| t.round())
        .filter(|t| (MIN_TEMPO..=MAX_TEMPO).contains(t))
        .map(|t| t as u32)
        .unwrap_or_else(|| tone.tempo())
}

impl<S: TextSuggestionService> LyricAnalyzer for SuggestedLyricAnalyzer<S> {
    fn analyze(&self, lyrics: &str) -> Result<LyricAnalysis, ComposeError> {
        info!("Starting lyric analysis");
        let lyrics = clean_lyrics(lyrics);
        let language = self
            .forced_language
            .unwrap_or_else(|| detect_language(&lyrics));
        info!(language = language.name(), "Lyric language");

        let request = CompletionRequest::new(Self::prompt(&lyrics, language))
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.5);
        let suggestion: Suggestion<AnalysisSuggestion> =
            request_suggestion(&self.service, &request);
        let fell_back = !suggestion.is_parsed();
        let suggested = suggestion.parsed().unwrap_or_default();

        let emotional_tone = suggested
            .emotional_tone
            .as_deref()
            .and_then(EmotionalTone::parse)
            .unwrap_or_default();
        let suggested_style = suggested
            .suggested_style
            .as_deref()
            .and_then(MusicStyle::parse)
            .unwrap_or_default();
        let suggested_key = match suggested.suggested_key.as_deref().map(str::trim) {
            Some(key) if Key::parse(key).is_some() => key.to_string(),
            Some(key) => {
                warn!(key, "Unrecognized key suggestion, using C");
                "C".to_string()
            }
            None => "C".to_string(),
        };
        let suggested_tempo = if fell_back {
            self.default_tempo
        } else {
            resolve_tempo(suggested.suggested_tempo, emotional_tone)
        };

        let lines = analyze_structure(&lyrics, language);
        let word_list: Vec<String> = lines
            .iter()
            .flat_map(|line| line.syllables.iter().map(|s| s.text.clone()))
            .collect();

        let analysis = LyricAnalysis {
            total_syllables: lines.iter().map(|l| l.syllable_count).sum(),
            total_words: word_list.len(),
            original_text: lyrics,
            language,
            lines,
            suggested_tempo,
            suggested_key,
            suggested_time_signature: "4/4".to_string(),
            suggested_style,
            emotional_tone,
            mood_description: suggested.mood_description.unwrap_or_default(),
            word_list,
        };
        info!(
            words = analysis.total_words,
            tempo = analysis.suggested_tempo,
            key = %analysis.suggested_key,
            tone = analysis.emotional_tone.name(),
            "Analysis complete"
        );
        Ok(analysis)
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::Scripted;
    use super::*;
    use cantilena_llm::NoSuggestions;

    #[test]
    fn test_full_suggestion_is_used() {
        let service = Scripted::new(
            r#"Sure! {"emotional_tone": "Romantic", "mood_description": "tender",
                "suggested_tempo": 92, "suggested_key": "F#m", "suggested_style": "ballad"}"#,
        );
        let analyzer = SuggestedLyricAnalyzer::new(service, None, 100);
        let analysis = analyzer.analyze("小酒窝长睫毛\n是你最美的记号").unwrap();

        assert_eq!(analysis.language, Language::Chinese);
        assert_eq!(analysis.total_words, 13);
        assert_eq!(analysis.word_list.len(), 13);
        assert_eq!(analysis.lines.len(), 2);
        assert_eq!(analysis.emotional_tone, EmotionalTone::Romantic);
        assert_eq!(analysis.suggested_style, MusicStyle::Ballad);
        assert_eq!(analysis.suggested_key, "F#m");
        assert_eq!(analysis.suggested_tempo, 92);
        assert_eq!(analysis.mood_description, "tender");

        let requests = analyzer.service.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.5);
        assert!(requests[0].prompt.contains("Language: chinese"));
        assert!(requests[0].system_prompt.as_deref().unwrap().contains("expert"));
    }

    #[test]
    fn test_unavailable_service_uses_defaults() {
        let analyzer = SuggestedLyricAnalyzer::new(NoSuggestions::default(), None, 100);
        let analysis = analyzer.analyze("Twinkle twinkle little star").unwrap();
        assert_eq!(analysis.language, Language::English);
        assert_eq!(analysis.emotional_tone, EmotionalTone::Peaceful);
        assert_eq!(analysis.suggested_key, "C");
        assert_eq!(analysis.suggested_style, MusicStyle::Pop);
        assert_eq!(analysis.suggested_tempo, 100);
        assert_eq!(analysis.suggested_time_signature, "4/4");
        let units: usize = analysis.lines.iter().map(|l| l.syllables.len()).sum();
        assert_eq!(analysis.total_words, units);
    }

    #[test]
    fn test_bad_tempo_uses_tone_table() {
        let service = Scripted::new(r#"{"emotional_tone": "energetic", "suggested_tempo": 900}"#);
        let analysis = SuggestedLyricAnalyzer::new(service, None, 100)
            .analyze("go go go")
            .unwrap();
        assert_eq!(analysis.suggested_tempo, EmotionalTone::Energetic.tempo());

        let service = Scripted::new(r#"{"emotional_tone": "melancholic"}"#);
        let analysis = SuggestedLyricAnalyzer::new(service, None, 100)
            .analyze("rain")
            .unwrap();
        assert_eq!(analysis.suggested_tempo, EmotionalTone::Melancholic.tempo());
    }

    #[test]
    fn test_unknown_labels_fall_back_individually() {
        let service = Scripted::new(
            r#"{"emotional_tone": "sarcastic", "suggested_key": "Q", "suggested_style": "jazz", "suggested_tempo": 120}"#,
        );
        let analysis = SuggestedLyricAnalyzer::new(service, None, 100)
            .analyze("hello")
            .unwrap();
        assert_eq!(analysis.emotional_tone, EmotionalTone::Peaceful);
        assert_eq!(analysis.suggested_key, "C");
        assert_eq!(analysis.suggested_style, MusicStyle::Pop);
        assert_eq!(analysis.suggested_tempo, 120);
    }

    #[test]
    fn test_forced_language_and_empty_lyrics() {
        let analyzer =
            SuggestedLyricAnalyzer::new(NoSuggestions::default(), Some(Language::English), 90);
        let analysis = analyzer.analyze("   \n  ").unwrap();
        assert_eq!(analysis.language, Language::English);
        assert!(analysis.word_list.is_empty());
        assert_eq!(analysis.total_words, 0);
        assert_eq!(analysis.suggested_tempo, 90);
    }
}
