// Melody generation stage.
//
// `ContourMelodyGenerator` asks the suggestion service for one note and one
// duration per lyric unit. The answer is used only when both arrays cover
// every unit; otherwise the whole melody comes from the rule-based fallback:
//
// 1. Pitch pool: the mood's scale on the key's tonic, octaves 4 and 5.
// 2. Walk: start at the middle of the pool and step by `contour - 2` plus a
//    random -1/0/+1, clamped to the pool.
// 3. Durations: one beat scaled by stress, stretched at line ends.
//
// Whichever source is used, every note passes through the same assembly: a
// malformed name becomes the fallback pitch, the octave is clamped into the
// singable range, and a missing, non-positive or over-long duration becomes
// the fallback duration. The result always has exactly one `WordNotes` per unit.

use cantilena_llm::{CompletionRequest, TextSuggestionService, request_suggestion};
use cantilena_theory::{Pitch, PitchClass, melodic_contour, scale_notes};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::analysis::LyricAnalysis;
use crate::config::MelodyConfig;
use crate::error::ComposeError;
use crate::melody::{Melody, NoteEvent, WordNotes, validate_melody};

const SYSTEM_PROMPT: &str =
    "You are a music composer. Generate simple, singable melodies. Always respond with valid JSON.";

static NOTE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Ga-g][#b]?)(\d)$").expect("note pattern is valid"));

pub trait MelodyGenerator {
    fn generate(&self, analysis: &LyricAnalysis) -> Result<Melody, ComposeError>;
}

/// Suggested notes. Entries are kept as raw JSON so one bad element only
/// costs that element.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MelodySuggestion {
    pub notes: Vec<Value>,
    pub durations: Vec<Value>,
}

pub struct ContourMelodyGenerator<S> {
    service: S,
    config: MelodyConfig,
}

impl<S: TextSuggestionService> ContourMelodyGenerator<S> {
    pub fn new(service: S, config: MelodyConfig) -> Self {
        Self { service, config }
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn prompt(analysis: &LyricAnalysis, count: usize) -> String {
        let key = analysis.key();
        let scale = analysis.emotional_tone.scale();
        let names = |octave: u8| {
            scale_notes(key.tonic, scale, octave)
                .into_iter()
                .map(|p| p.standard_name())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            r#"Generate a simple melody for these lyrics.

Lyrics: {lyrics}
Number of words/characters: {count}
Mood: {mood}
Tempo: {tempo} BPM
Key: {key}
Style: {style}

Available notes (scale): {low}
Also available one octave higher: {high}

Generate EXACTLY {count} notes, one for each word/character.
Use notes from C3 to C6 range.
Format each note as: NoteName+Octave (e.g., C4, G4, E5)

Respond in JSON format:
{{
    "notes": ["C4", "E4", "G4", ...],
    "durations": [0.4, 0.3, 0.5, ...]
}}

Respond ONLY with the JSON object."#,
            lyrics = analysis.original_text,
            mood = analysis.emotional_tone.name(),
            tempo = analysis.suggested_tempo,
            key = analysis.suggested_key,
            style = analysis.suggested_style.name(),
            low = names(4),
            high = names(5),
        )
    }

    /// Rule-based notes and durations for every unit.
    fn rule_based(&self, analysis: &LyricAnalysis, count: usize) -> (Vec<Value>, Vec<Value>) {
        let key = analysis.key();
        let scale = analysis.emotional_tone.scale();
        let pool: Vec<Pitch> = [4, 5]
            .into_iter()
            .flat_map(|octave| scale_notes(key.tonic, scale, octave))
            .collect();
        if pool.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut rng = self.rng();
        let last = pool.len() as i64 - 1;
        let mut position = (pool.len() / 2) as i64;
        let notes = melodic_contour(count, self.config.contour)
            .into_iter()
            .map(|value| {
                let step = value as i64 - 2 + rng.random_range(-1..=1);
                position = (position + step).clamp(0, last);
                Value::from(pool[position as usize].standard_name())
            })
            .collect();

        let beat = 60.0 / analysis.suggested_tempo.max(1) as f64;
        let syllables: Vec<_> = analysis.all_syllables().collect();
        let durations = (0..count)
            .map(|i| {
                let seconds = match syllables.get(i) {
                    Some(s) => {
                        let stressed = beat * (0.8 + 0.2 * s.stress_level as f64);
                        if s.is_line_end { stressed * 1.3 } else { stressed }
                    }
                    None => beat,
                };
                Value::from(round6(seconds))
            })
            .collect();
        (notes, durations)
    }

    fn fallback_pitch(&self) -> Pitch {
        self.config
            .fallback_pitch
            .parse()
            .unwrap_or(Pitch::note(PitchClass::C, 4))
    }

    /// Read one suggested note. Blank and "rest" are rests; anything that is
    /// not a letter, optional accidental and single-digit octave is replaced.
    fn format_note(&self, value: Option<&Value>) -> Pitch {
        let text = match value {
            Some(Value::String(s)) => s.trim(),
            Some(Value::Null) | None => "",
            Some(_) => return self.fallback_pitch(),
        };
        if text.is_empty() || text.eq_ignore_ascii_case("rest") {
            return Pitch::Rest;
        }
        let Some(caps) = NOTE_NAME.captures(text) else {
            debug!(note = text, "Malformed note, using fallback pitch");
            return self.fallback_pitch();
        };
        let Some(class) = PitchClass::parse(&caps[1]) else {
            return self.fallback_pitch();
        };
        let octave: u8 = caps[2].parse().unwrap_or(4);
        Pitch::note(class, octave).with_octave_clamped(self.config.min_octave, self.config.max_octave)
    }

    fn format_duration(&self, value: Option<&Value>) -> f64 {
        value
            .and_then(Value::as_f64)
            .filter(|d| d.is_finite() && *d > 0.0 && *d <= self.config.max_duration)
            .unwrap_or(self.config.fallback_duration)
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

impl<S: TextSuggestionService> MelodyGenerator for ContourMelodyGenerator<S> {
    fn generate(&self, analysis: &LyricAnalysis) -> Result<Melody, ComposeError> {
        let count = analysis.word_list.len();
        info!(words = count, "Starting melody generation");

        let request = CompletionRequest::new(Self::prompt(analysis, count))
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.8);
        let suggestion = request_suggestion::<MelodySuggestion, _>(&self.service, &request)
            .validate(|s| {
                if s.notes.len() >= count && s.durations.len() >= count {
                    Ok(())
                } else {
                    Err(format!(
                        "expected {count} notes and durations, got {} and {}",
                        s.notes.len(),
                        s.durations.len()
                    ))
                }
            });
        let (notes, durations) = match suggestion.parsed() {
            Some(MelodySuggestion {
                mut notes,
                mut durations,
            }) => {
                notes.truncate(count);
                durations.truncate(count);
                (notes, durations)
            }
            None => {
                warn!("Using rule-based melody generation");
                self.rule_based(analysis, count)
            }
        };

        let word_notes = analysis
            .word_list
            .iter()
            .enumerate()
            .map(|(i, word)| WordNotes {
                word: word.clone(),
                word_index: i,
                notes: vec![NoteEvent::new(
                    self.format_note(notes.get(i)),
                    self.format_duration(durations.get(i)),
                    i,
                )],
            })
            .collect();
        let melody = Melody {
            word_notes,
            tempo: analysis.suggested_tempo,
            key_signature: analysis.suggested_key.clone(),
            time_signature: analysis.suggested_time_signature.clone(),
        };

        if let Err(e) = validate_melody(&melody, count) {
            warn!(error = %e, "Generated melody failed validation");
        }
        info!(
            notes = melody.note_count(),
            seconds = melody.total_duration(),
            "Melody complete"
        );
        Ok(melody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::analysis_for;
    use crate::analyzer::fakes::Scripted;
    use cantilena_llm::NoSuggestions;
    use cantilena_text::Language;
    use cantilena_theory::{EmotionalTone, Key, ScaleKind};

    fn seeded(seed: u64) -> MelodyConfig {
        MelodyConfig {
            seed: Some(seed),
            ..MelodyConfig::default()
        }
    }

    #[test]
    fn test_suggestion_is_truncated_and_cleaned() {
        let service = Scripted::new(
            r#"{"notes": ["E4", "g#5", "H2", "C8", "rest", "D4"],
                "durations": [0.5, -1, "x", 0.25, 0.3, 0.9]}"#,
        );
        let analysis = analysis_for("one two three four five", Language::English);
        assert_eq!(analysis.word_list.len(), 5);
        let melody = ContourMelodyGenerator::new(service, seeded(1))
            .generate(&analysis)
            .unwrap();

        let pitches: Vec<String> = melody.notes().map(|n| n.pitch.standard_name()).collect();
        assert_eq!(pitches, vec!["E4", "G#5", "C4", "C6", "rest"]);
        let durations: Vec<f64> = melody.notes().map(|n| n.duration).collect();
        assert_eq!(durations, vec![0.5, 0.4, 0.4, 0.25, 0.3]);
        assert_eq!(validate_melody(&melody, 5), Ok(()));
    }

    #[test]
    fn test_over_long_durations_are_replaced() {
        let service = Scripted::new(
            r#"{"notes": ["C4", "D4", "E4"], "durations": [3000000.0, 8.0, 1e308]}"#,
        );
        let analysis = analysis_for("小酒窝", Language::Chinese);
        let melody = ContourMelodyGenerator::new(service, seeded(1))
            .generate(&analysis)
            .unwrap();
        let durations: Vec<f64> = melody.notes().map(|n| n.duration).collect();
        assert_eq!(durations, vec![0.4, 8.0, 0.4]);
    }

    #[test]
    fn test_short_suggestion_falls_back_to_rules() {
        let service = Scripted::new(r#"{"notes": ["C4"], "durations": [0.5]}"#);
        let analysis = analysis_for("小酒窝长睫毛", Language::Chinese);
        let melody = ContourMelodyGenerator::new(service, seeded(3))
            .generate(&analysis)
            .unwrap();
        assert_eq!(melody.word_notes.len(), 6);

        let key = Key::parse("Am").unwrap();
        let pool: Vec<Pitch> = [4, 5]
            .into_iter()
            .flat_map(|o| scale_notes(key.tonic, ScaleKind::Minor, o))
            .collect();
        assert!(melody.notes().all(|n| pool.contains(&n.pitch)));
    }

    #[test]
    fn test_rule_based_durations() {
        let analysis = analysis_for("小酒窝", Language::Chinese);
        let melody = ContourMelodyGenerator::new(NoSuggestions::default(), seeded(0))
            .generate(&analysis)
            .unwrap();
        // 120 BPM: one beat is 0.5 s. Stress 3, 1, then 2 at the line end.
        let durations: Vec<f64> = melody.notes().map(|n| n.duration).collect();
        assert_eq!(durations, vec![0.7, 0.5, 0.78]);
    }

    #[test]
    fn test_same_seed_same_melody() {
        let mut analysis = analysis_for("one two three four five six seven eight", Language::English);
        analysis.emotional_tone = EmotionalTone::Joyful;
        let first = ContourMelodyGenerator::new(NoSuggestions::default(), seeded(42))
            .generate(&analysis)
            .unwrap();
        let second = ContourMelodyGenerator::new(NoSuggestions::default(), seeded(42))
            .generate(&analysis)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.word_notes.len(), analysis.word_list.len());
    }

    #[test]
    fn test_empty_analysis_gives_empty_melody() {
        let analysis = analysis_for("", Language::Chinese);
        let melody = ContourMelodyGenerator::new(NoSuggestions::default(), seeded(0))
            .generate(&analysis)
            .unwrap();
        assert!(melody.word_notes.is_empty());
        assert_eq!(melody.tempo, 120);
    }

    #[test]
    fn test_prompt_lists_scale() {
        let analysis = analysis_for("la", Language::English);
        let prompt = ContourMelodyGenerator::<NoSuggestions>::prompt(&analysis, 1);
        assert!(prompt.contains("Generate EXACTLY 1 notes"));
        assert!(prompt.contains("A4, B4, C5"), "{prompt}");
        assert!(prompt.contains("A5, B5"));
    }
}
