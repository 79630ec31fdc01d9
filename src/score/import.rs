//! Standard MIDI File (SMF) import.
//!
//! Flattens a .mid/.midi file into the chronological [`Score`] event list the
//! navigators consume. Supports SMF Format 0 (single track) and Format 1
//! (multi-track); all tracks are merged into one sequence.
//!
//! # Limitations
//!
//! - Note on/off pairs become Sound events; unclosed notes are given a
//!   one-beat duration
//! - Tempo, program change and control change messages become their
//!   long-lasting event kinds
//! - Pitch bend and aftertouch are ignored
//! - SMPTE timecode timing and Format 2 files are rejected

use super::{EventId, Score, ScoreEvent, Tick};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while turning a MIDI file into a [`Score`].
#[derive(Debug, Error)]
pub enum ScoreError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// MIDI parsing failed.
    #[error("MIDI parse error: {0}")]
    Parse(String),

    /// Unsupported MIDI format or timing.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The parser produced an event the event model has no rule for.
    /// Indicates a contract violation upstream, not a recoverable condition.
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),
}

/// State for pairing note-on/note-off messages during import.
/// Key is (channel, note), value is (begin_tick, velocity).
type PendingNotes = HashMap<(u8, u8), (Tick, u8)>;

/// Reads a MIDI file from disk and flattens it into a [`Score`].
///
/// # Errors
///
/// Returns [`ScoreError`] if the file cannot be read or parsed, or uses an
/// unsupported timing/format.
pub fn read_score<P: AsRef<Path>>(path: P) -> Result<Score, ScoreError> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    let smf = Smf::parse(&data).map_err(|e| ScoreError::Parse(e.to_string()))?;
    let score = score_from_smf(&smf)?;
    tracing::info!(
        path = %path.display(),
        events = score.len(),
        duration_ticks = score.duration_ticks,
        "imported score"
    );
    Ok(score)
}

/// Flattens an already-parsed SMF into a [`Score`].
pub fn score_from_smf(smf: &Smf) -> Result<Score, ScoreError> {
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(_, _) => {
            return Err(ScoreError::UnsupportedFormat(
                "SMPTE timecode timing not supported".to_string(),
            ))
        }
    };

    if smf.header.format == Format::Sequential {
        return Err(ScoreError::UnsupportedFormat(
            "Format 2 (sequential) MIDI files not supported".to_string(),
        ));
    }

    let mut events = Vec::new();
    let mut next_id: u64 = 0;

    for track in &smf.tracks {
        parse_track(track, &mut events, &mut next_id)?;
    }

    let duration_ticks = events.iter().map(|e| e.end_when()).max().unwrap_or(0);
    Ok(Score::new(events, duration_ticks, ticks_per_beat))
}

/// Parses a single MIDI track, appending flattened events to `events`.
///
/// Event ids are assigned in parse order from `next_id`; the [`Score`]
/// constructor handles chronological ordering afterwards.
fn parse_track(
    track: &[midly::TrackEvent],
    events: &mut Vec<ScoreEvent>,
    next_id: &mut u64,
) -> Result<(), ScoreError> {
    let mut pending: PendingNotes = HashMap::new();
    let mut current_tick: Tick = 0;

    let take_id = |next_id: &mut u64| {
        let id = EventId::new(*next_id);
        *next_id += 1;
        id
    };

    for event in track {
        current_tick += Tick::from(event.delta.as_int());

        match event.kind {
            TrackEventKind::Meta(meta) => match meta {
                MetaMessage::Tempo(micros_per_beat) => {
                    let micros = micros_per_beat.as_int();
                    if micros > 0 {
                        events.push(ScoreEvent::tempo(take_id(next_id), current_tick, micros));
                    } else {
                        tracing::warn!(tick = current_tick, "ignoring zero tempo");
                    }
                }
                MetaMessage::Unknown(kind, _) => {
                    return Err(ScoreError::UnknownEventKind(format!(
                        "meta event 0x{kind:02x}"
                    )));
                }
                _ => {} // Other meta events carry no timeline state
            },
            TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } => {
                        let note = key.as_int();
                        let velocity = vel.as_int();
                        if velocity > 0 {
                            pending.insert((ch, note), (current_tick, velocity));
                        } else {
                            // Note on with velocity 0 = note off
                            close_note(&mut pending, events, next_id, ch, note, current_tick);
                        }
                    }
                    MidiMessage::NoteOff { key, .. } => {
                        close_note(&mut pending, events, next_id, ch, key.as_int(), current_tick);
                    }
                    MidiMessage::ProgramChange { program } => {
                        events.push(ScoreEvent::program_change(
                            take_id(next_id),
                            current_tick,
                            ch,
                            program.as_int(),
                        ));
                    }
                    MidiMessage::Controller { controller, value } => {
                        events.push(ScoreEvent::control_change(
                            take_id(next_id),
                            current_tick,
                            ch,
                            controller.as_int(),
                            value.as_int(),
                        ));
                    }
                    _ => {} // Pitch bend and aftertouch are not modeled
                }
            }
            _ => {} // SysEx and escape sequences are not modeled
        }
    }

    // Close any notes the file left hanging, with a one-beat fallback length.
    for ((ch, note), (begin_tick, velocity)) in pending {
        let id = EventId::new(*next_id);
        *next_id += 1;
        let end = begin_tick + Tick::from(super::DEFAULT_TICKS_PER_BEAT);
        events.push(ScoreEvent::sound(id, begin_tick, end, ch, note, velocity));
    }

    Ok(())
}

/// Completes a pending note-on into a Sound event, if one is open.
fn close_note(
    pending: &mut PendingNotes,
    events: &mut Vec<ScoreEvent>,
    next_id: &mut u64,
    channel: u8,
    note: u8,
    end_tick: Tick,
) {
    if let Some((begin_tick, velocity)) = pending.remove(&(channel, note)) {
        let id = EventId::new(*next_id);
        *next_id += 1;
        let end = end_tick.max(begin_tick + 1);
        events.push(ScoreEvent::sound(id, begin_tick, end, channel, note, velocity));
    }
}
