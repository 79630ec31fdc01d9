//! Playback-side collaborators of the navigator: the per-frame context that
//! tracks tempo and channel state, the priority-ordered output message
//! queue, and the frame-driven transport gluing them together.

mod messages;
mod transport;

pub use messages::{MessageQueue, PlaybackMessage};
pub use transport::Transport;

use serde::{Deserialize, Serialize};

use crate::score::{
    micros_to_ticks, ticks_to_micros, EventKind, Score, ScoreEvent, Tick, CHANNEL_COUNT,
    DEFAULT_TEMPO_MICROS, DEFAULT_TICKS_PER_BEAT,
};

/// Mutable playback state with single-writer ownership per frame.
///
/// Replaces a grab-bag of globals with an explicit struct passed by
/// reference into the frame path: current playhead, the tempo and program
/// state accumulated from long-lasting events, and the score's timing
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackContext {
    /// Current playhead position in ticks. May be negative during lead-in.
    pub current_tick: Tick,

    /// Active tempo in microseconds per beat.
    pub tempo_micros_per_beat: u32,

    /// Resolution of the tick unit, from the loaded score.
    pub ticks_per_beat: u16,

    /// Total duration of the loaded score in ticks.
    pub duration_ticks: Tick,

    /// Active program per channel.
    pub channel_programs: [u8; CHANNEL_COUNT],
}

impl Default for PlaybackContext {
    fn default() -> Self {
        Self {
            current_tick: 0,
            tempo_micros_per_beat: DEFAULT_TEMPO_MICROS,
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            duration_ticks: 0,
            channel_programs: [0; CHANNEL_COUNT],
        }
    }
}

impl PlaybackContext {
    /// Creates a context for a loaded score, with default tempo and programs.
    pub fn for_score(score: &Score) -> Self {
        Self {
            ticks_per_beat: score.ticks_per_beat,
            duration_ticks: score.duration_ticks,
            ..Self::default()
        }
    }

    /// Applies a long-lasting event's state change. Sounds and control
    /// changes carry no context state and are ignored.
    pub fn apply(&mut self, event: &ScoreEvent) {
        match event.kind {
            EventKind::Tempo { micros_per_beat } => {
                self.tempo_micros_per_beat = micros_per_beat;
            }
            EventKind::ProgramChange { channel, program } => {
                self.channel_programs[usize::from(channel.min(15))] = program;
            }
            EventKind::Sound { .. } | EventKind::ControlChange { .. } => {}
        }
    }

    /// Converts an elapsed wall-clock span to ticks at the current tempo.
    pub fn micros_to_ticks(&self, micros: i64) -> Tick {
        micros_to_ticks(micros, self.tempo_micros_per_beat, self.ticks_per_beat)
    }

    /// Converts a tick span to wall-clock microseconds at the current tempo.
    pub fn ticks_to_micros(&self, ticks: Tick) -> i64 {
        ticks_to_micros(ticks, self.tempo_micros_per_beat, self.ticks_per_beat)
    }

    /// Whether the playhead has passed the end of the score.
    pub fn at_end(&self) -> bool {
        self.current_tick >= self.duration_ticks
    }
}
