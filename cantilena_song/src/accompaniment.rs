// Backing parts: drums, bass and chords.
//
// The song length in 4/4 measures is derived from the melody, with two extra
// measures so the backing outlasts the voice. Chord names come from the
// suggestion service; a missing or empty progression falls back to the
// song's key on every measure. A shorter progression is repeated, a longer
// one is cut.
//
// Parts, one measure per chord:
// - Drums (channel 10): kick on beats 1 and 3, snare on 2 and 4.
// - Bass: the chord root at octave 2 as a whole note.
// - Chords: closed position at octave 4, quarter-note stabs for rhythmic
//   styles and a sustained whole note otherwise.
// A chord name that does not parse leaves that measure silent in bass and
// chords.

use cantilena_llm::{CompletionRequest, TextSuggestionService, request_suggestion};
use cantilena_theory::{Chord, MusicStyle};
use serde::Deserialize;
use tracing::{info, warn};

use crate::melody::Melody;
use crate::midi::{MAX_TICK, Part, TICKS_PER_QUARTER, TimedNote};

const BEATS_PER_MEASURE: u32 = 4;
const MEASURE_TICKS: u32 = BEATS_PER_MEASURE * TICKS_PER_QUARTER;

const KICK: u8 = 36;
const SNARE: u8 = 38;
const DRUM_CHANNEL: u8 = 9;
const BASS_CHANNEL: u8 = 1;
const CHORD_CHANNEL: u8 = 2;
const PROGRAM_ELECTRIC_BASS: u8 = 33;
const PROGRAM_ELECTRIC_PIANO: u8 = 4;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChordSuggestion {
    pub progression: Vec<String>,
}

/// Chords per measure plus the style that decides the chord rhythm.
#[derive(Debug, Clone, PartialEq)]
pub struct Accompaniment {
    pub progression: Vec<String>,
    pub style: MusicStyle,
}

/// Measures that fit in a MIDI track.
const MAX_MEASURES: usize = (MAX_TICK / MEASURE_TICKS) as usize;

/// Measures covering the melody plus two, at most `MAX_MEASURES`.
pub fn measure_count(melody: &Melody) -> usize {
    let beats = melody.total_duration() / 60.0 * melody.tempo as f64;
    let measures = (beats / BEATS_PER_MEASURE as f64).floor().max(0.0) as usize;
    measures.saturating_add(2).min(MAX_MEASURES)
}

fn chord_prompt(key: &str, style: MusicStyle, measures: usize) -> String {
    format!(
        r#"Generate a chord progression for a song.
Key: {key}
Style: {style}
Length: {measures} measures

Respond in JSON format:
{{
    "progression": ["C", "Am", "F", "G", ...]
}}
The list must contain exactly {measures} chords."#,
        style = style.name()
    )
}

/// Ask for a progression and fit it to the song length.
pub fn plan_accompaniment<S>(melody: &Melody, style: MusicStyle, service: &S) -> Accompaniment
where
    S: TextSuggestionService + ?Sized,
{
    let measures = measure_count(melody);
    let request = CompletionRequest::new(chord_prompt(&melody.key_signature, style, measures));
    let suggested = request_suggestion::<ChordSuggestion, S>(service, &request)
        .parsed()
        .map(|s| s.progression)
        .unwrap_or_default();

    let progression: Vec<String> = if suggested.is_empty() {
        warn!(key = %melody.key_signature, "No chord progression, repeating the key");
        vec![melody.key_signature.clone(); measures]
    } else {
        suggested.iter().cycle().take(measures).cloned().collect()
    };
    info!(measures, style = style.name(), "Accompaniment planned");
    Accompaniment { progression, style }
}

impl Accompaniment {
    pub fn measures(&self) -> usize {
        self.progression.len()
    }

    fn chords(&self) -> impl Iterator<Item = (u32, Option<Chord>)> + '_ {
        self.progression
            .iter()
            .enumerate()
            .map(|(m, name)| (m as u32 * MEASURE_TICKS, Chord::parse(name)))
    }

    pub fn drums(&self) -> Part {
        let notes = (0..self.measures() as u32)
            .flat_map(|m| {
                (0..BEATS_PER_MEASURE).map(move |beat| TimedNote {
                    start: m * MEASURE_TICKS + beat * TICKS_PER_QUARTER,
                    length: TICKS_PER_QUARTER,
                    key: if beat % 2 == 0 { KICK } else { SNARE },
                    velocity: 90,
                })
            })
            .collect();
        Part {
            name: "Drums",
            channel: DRUM_CHANNEL,
            program: None,
            notes,
        }
    }

    pub fn bass(&self) -> Part {
        let notes = self
            .chords()
            .filter_map(|(start, chord)| {
                chord.map(|c| TimedNote {
                    start,
                    length: MEASURE_TICKS,
                    key: c.root_midi(2),
                    velocity: 70,
                })
            })
            .collect();
        Part {
            name: "Bass",
            channel: BASS_CHANNEL,
            program: Some(PROGRAM_ELECTRIC_BASS),
            notes,
        }
    }

    pub fn chord_part(&self) -> Part {
        let rhythmic = self.style.is_rhythmic();
        let mut notes = Vec::new();
        for (start, chord) in self.chords() {
            let Some(chord) = chord else {
                continue;
            };
            let voicing = chord.voicing(4);
            if rhythmic {
                for beat in 0..BEATS_PER_MEASURE {
                    notes.extend(voicing.iter().map(|&key| TimedNote {
                        start: start + beat * TICKS_PER_QUARTER,
                        length: TICKS_PER_QUARTER,
                        key,
                        velocity: 60,
                    }));
                }
            } else {
                notes.extend(voicing.iter().map(|&key| TimedNote {
                    start,
                    length: MEASURE_TICKS,
                    key,
                    velocity: 50,
                }));
            }
        }
        Part {
            name: "Chords",
            channel: CHORD_CHANNEL,
            program: Some(PROGRAM_ELECTRIC_PIANO),
            notes,
        }
    }

    pub fn parts(&self) -> Vec<Part> {
        vec![self.drums(), self.bass(), self.chord_part()]
    }
}
