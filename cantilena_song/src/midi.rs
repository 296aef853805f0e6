// MIDI output from a melody.
//
// Converts a `Melody` (and optionally its `Accompaniment`) into a Standard
// MIDI File for playback and for rendering the backing track. Output is SMF
// Format 1: track 0 carries tempo, key signature and time signature; the
// lead melody and each backing part get their own track and channel.
//
// Durations are in seconds upstream and in ticks here: one beat is
// `60 / tempo` seconds and 480 ticks. Rests produce gaps, not events.
// Every absolute tick must fit the 28-bit delta field; a melody that runs
// past it is a `ComposeError::Midi`, never a truncated file.
//
// Uses the `midly` crate for MIDI writing.

use cantilena_theory::{Key, TimeSignature};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;
use tracing::{debug, info};

use crate::accompaniment::Accompaniment;
use crate::error::ComposeError;
use crate::melody::Melody;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u32 = 480;

/// General MIDI programs.
const PROGRAM_PIANO: u8 = 0;
const PROGRAM_OBOE: u8 = 68;

const LEAD_CHANNEL: u8 = 0;

/// Largest tick a track may reach (the `u28` delta range).
pub const MAX_TICK: u32 = (1 << 28) - 1;

/// Largest tempo meta value (microseconds per quarter, `u24`).
const MAX_TEMPO_MICROSECONDS: u32 = (1 << 24) - 1;

/// A note placed on the tick grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedNote {
    pub start: u32,
    pub length: u32,
    pub key: u8,
    pub velocity: u8,
}

/// One backing or lead part ready to become a track.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: &'static str,
    pub channel: u8,
    /// None leaves the channel's default (drum kits on channel 10).
    pub program: Option<u8>,
    pub notes: Vec<TimedNote>,
}

/// Seconds to ticks at `tempo` BPM.
pub fn seconds_to_ticks(seconds: f64, tempo: u32) -> u32 {
    let beats = seconds / (60.0 / tempo.max(1) as f64);
    (beats * TICKS_PER_QUARTER as f64).round().max(0.0) as u32
}

/// `start + length`, if it stays within `MAX_TICK`.
fn end_tick(start: u32, length: u32) -> Option<u32> {
    start.checked_add(length).filter(|&end| end <= MAX_TICK)
}

/// Lead notes laid end to end. Rests advance time without a note.
pub fn lead_notes(melody: &Melody) -> Result<Vec<TimedNote>, ComposeError> {
    let mut tick = 0;
    let mut notes = Vec::with_capacity(melody.note_count());
    for (index, event) in melody.notes().enumerate() {
        let length = seconds_to_ticks(event.duration, melody.tempo);
        let end = end_tick(tick, length).ok_or_else(|| {
            ComposeError::Midi(format!(
                "note {index} ({}s) ends past the last representable tick",
                event.duration
            ))
        })?;
        if let Some(key) = event.pitch.midi() {
            notes.push(TimedNote {
                start: tick,
                length,
                key,
                velocity: event.velocity.min(127),
            });
        }
        tick = end;
    }
    Ok(notes)
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

fn conductor_track(melody: &Melody) -> Track<'static> {
    let key = Key::parse(&melody.key_signature).unwrap_or_else(Key::c_major);
    let time = TimeSignature::parse_or_default(&melody.time_signature);
    let tempo_microseconds = (60_000_000 / melody.tempo.max(1)).min(MAX_TEMPO_MICROSECONDS);
    vec![
        meta(0, MetaMessage::Tempo(u24::new(tempo_microseconds))),
        meta(0, MetaMessage::KeySignature(key.sharps(), key.minor)),
        meta(
            0,
            MetaMessage::TimeSignature(time.numerator, time.denominator_power(), 24, 8),
        ),
        meta(0, MetaMessage::EndOfTrack),
    ]
}

/// Build a track from absolute-time notes. At equal ticks note-offs sort
/// before note-ons so repeated keys retrigger cleanly.
fn part_track(part: &Part) -> Result<Track<'static>, ComposeError> {
    let channel = u4::new(part.channel);
    let mut timed: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(part.notes.len() * 2);
    for note in &part.notes {
        let end = end_tick(note.start, note.length).ok_or_else(|| {
            ComposeError::Midi(format!(
                "{} note at tick {} runs past the last representable tick",
                part.name, note.start
            ))
        })?;
        timed.push((note.start, true, note.key, note.velocity));
        timed.push((end, false, note.key, 0));
    }
    timed.sort_by_key(|&(tick, is_on, _, _)| (tick, is_on));

    let mut track: Track<'static> = Vec::with_capacity(timed.len() + 3);
    track.push(meta(0, MetaMessage::TrackName(part.name.as_bytes())));
    if let Some(program) = part.program {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            },
        });
    }

    let mut last_tick = 0;
    for (tick, is_on, key, vel) in timed {
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    track.push(meta(0, MetaMessage::EndOfTrack));
    Ok(track)
}

/// Convert a melody (plus optional backing parts) to an in-memory SMF.
pub fn melody_to_smf(
    melody: &Melody,
    accompaniment: Option<&Accompaniment>,
) -> Result<Smf<'static>, ComposeError> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER as u16)),
    ));
    smf.tracks.push(conductor_track(melody));

    let lead = Part {
        name: "Lead",
        channel: LEAD_CHANNEL,
        program: Some(if accompaniment.is_some() {
            PROGRAM_OBOE
        } else {
            PROGRAM_PIANO
        }),
        notes: lead_notes(melody)?,
    };
    smf.tracks.push(part_track(&lead)?);

    if let Some(accompaniment) = accompaniment {
        for part in accompaniment.parts() {
            debug!(part = part.name, notes = part.notes.len(), "backing part");
            smf.tracks.push(part_track(&part)?);
        }
    }
    Ok(smf)
}

/// Convert a melody to MIDI and write it to `path`.
pub fn write_melody_midi(
    melody: &Melody,
    accompaniment: Option<&Accompaniment>,
    path: &Path,
) -> Result<(), ComposeError> {
    let smf = melody_to_smf(melody, accompaniment)?;
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| ComposeError::Midi(e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &buf)?;
    info!(
        path = %path.display(),
        tracks = smf.tracks.len(),
        "MIDI saved"
    );
    Ok(())
}
