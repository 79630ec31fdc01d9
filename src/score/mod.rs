//! Score data structures: the flat chronological event list a navigator
//! consumes, plus tick/time conversion helpers.
//!
//! A [`Score`] is the read-only product of loading a MIDI file: every note,
//! tempo change, program change and control change flattened into one
//! sequence sorted by begin tick, together with the total duration and the
//! file's ticks-per-beat resolution.

mod event;
mod import;

pub use event::{EventId, EventKind, ScoreEvent};
pub(crate) use event::FoldKey;
pub use import::{read_score, score_from_smf, ScoreError};

use serde::{Deserialize, Serialize};

/// The file's native time unit. Signed: playback may start before tick zero
/// (a lead-in), and seek targets before the start of the score are valid.
pub type Tick = i64;

/// Number of MIDI channels.
pub const CHANNEL_COUNT: usize = 16;

/// Default tempo in microseconds per beat (120 BPM), per the MIDI standard.
pub const DEFAULT_TEMPO_MICROS: u32 = 500_000;

/// Default ticks per beat when a file does not specify a resolution.
pub const DEFAULT_TICKS_PER_BEAT: u16 = 480;

/// Converts a tick span to microseconds under a fixed tempo.
///
/// # Arguments
///
/// * `ticks` - Number of ticks
/// * `micros_per_beat` - Tempo in microseconds per beat
/// * `ticks_per_beat` - File resolution
pub fn ticks_to_micros(ticks: Tick, micros_per_beat: u32, ticks_per_beat: u16) -> i64 {
    ticks * i64::from(micros_per_beat) / i64::from(ticks_per_beat.max(1))
}

/// Converts a microsecond span to ticks under a fixed tempo.
///
/// Inverse of [`ticks_to_micros`], truncating toward zero.
pub fn micros_to_ticks(micros: i64, micros_per_beat: u32, ticks_per_beat: u16) -> Tick {
    micros * i64::from(ticks_per_beat.max(1)) / i64::from(micros_per_beat.max(1))
}

/// A loaded piece of music: the sorted event sequence plus timing metadata.
///
/// Events are immutable once the score is constructed. Construction sorts the
/// sequence stably by begin tick, so same-tick events keep the order the
/// parser produced them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    /// All timeline events, sorted non-decreasing by begin tick.
    events: Vec<ScoreEvent>,

    /// Total duration in ticks (at least the largest end tick).
    pub duration_ticks: Tick,

    /// Resolution of the tick unit, from the file header.
    pub ticks_per_beat: u16,
}

impl Score {
    /// Builds a score from an event list, sorting it stably by begin tick.
    ///
    /// # Arguments
    ///
    /// * `events` - Timeline events in any order; ids must be unique
    /// * `duration_ticks` - Total duration in ticks
    /// * `ticks_per_beat` - File resolution
    pub fn new(mut events: Vec<ScoreEvent>, duration_ticks: Tick, ticks_per_beat: u16) -> Self {
        events.sort_by_key(|e| e.begin_when());
        Self {
            events,
            duration_ticks,
            ticks_per_beat,
        }
    }

    /// The sorted event sequence.
    pub fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    /// Number of events in the score.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the score contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_conversions() {
        // At 500_000 us/beat and 480 ticks/beat, one beat = half a second.
        assert_eq!(ticks_to_micros(480, 500_000, 480), 500_000);
        assert_eq!(micros_to_ticks(500_000, 500_000, 480), 480);

        // Negative spans stay negative (lead-in before tick 0).
        assert_eq!(ticks_to_micros(-480, 500_000, 480), -500_000);
    }

    #[test]
    fn test_score_sorts_stably() {
        let events = vec![
            ScoreEvent::sound(EventId::new(0), 100, 200, 0, 60, 100),
            ScoreEvent::program_change(EventId::new(1), 10, 0, 5),
            ScoreEvent::sound(EventId::new(2), 10, 50, 0, 62, 100),
        ];
        let score = Score::new(events, 200, 480);

        let ids: Vec<u64> = score.events().iter().map(|e| e.id.as_u64()).collect();
        // Events at tick 10 keep their original relative order.
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_score() {
        let score = Score::new(Vec::new(), 0, DEFAULT_TICKS_PER_BEAT);
        assert!(score.is_empty());
        assert_eq!(score.len(), 0);
    }
}
