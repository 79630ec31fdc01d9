//! Frame-driven playback transport.
//!
//! One driving loop calls [`Transport::on_frame`] with the wall-clock time
//! elapsed since the previous frame (~60Hz in practice). The transport
//! converts it to ticks at the current tempo, advances the caching
//! navigator, folds long-lasting presses into the context, and hands back
//! the ordered message batch for the device. Scrub-bar jumps go through
//! [`Transport::seek`], which re-registers the full active state.

use std::sync::Arc;

use crate::navigator::{CachingNavigator, NavigatorConfig, NavigatorError, SeekSnapshot};
use crate::score::{Score, Tick};

use super::{MessageQueue, PlaybackContext, PlaybackMessage};

/// Playback driver owning the navigator, context and output queue.
///
/// Single logical thread of control: every call runs to completion
/// synchronously, and a seek fully replaces cursor state before any
/// subsequent frame advance resumes.
#[derive(Debug)]
pub struct Transport {
    navigator: CachingNavigator,
    context: PlaybackContext,
    queue: MessageQueue,
    playing: bool,
}

impl Transport {
    /// Creates a stopped, unloaded transport.
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError::InvalidConfiguration`] if the config is
    /// rejected.
    pub fn new(config: NavigatorConfig) -> Result<Self, NavigatorError> {
        Ok(Self {
            navigator: CachingNavigator::new(config)?,
            context: PlaybackContext::default(),
            queue: MessageQueue::new(),
            playing: false,
        })
    }

    /// Loads a score, building the seek cache and resetting the playhead.
    pub fn load(&mut self, score: impl Into<Arc<Score>>) {
        let score = score.into();
        self.context = PlaybackContext::for_score(&score);
        self.navigator.load(score);
        self.queue.clear();
        self.playing = false;
    }

    /// Unloads the score and drops any pending output.
    pub fn unload(&mut self) {
        self.navigator.unload();
        self.context = PlaybackContext::default();
        self.queue.clear();
        self.playing = false;
    }

    /// Starts advancing on subsequent frames.
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stops advancing; the playhead stays where it is.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current playhead position in ticks.
    pub fn current_tick(&self) -> Tick {
        self.context.current_tick
    }

    /// Playback state accumulated from long-lasting events.
    pub fn context(&self) -> &PlaybackContext {
        &self.context
    }

    /// Read access to the navigator, e.g. for rendering the created set.
    pub fn navigator(&self) -> &CachingNavigator {
        &self.navigator
    }

    /// Advances one frame and returns the ordered device messages.
    ///
    /// No-op while paused. Pauses automatically at the end of the score.
    pub fn on_frame(&mut self, elapsed_micros: i64) -> Result<Vec<PlaybackMessage>, NavigatorError> {
        if !self.playing {
            return Ok(Vec::new());
        }

        let target = self.context.current_tick + self.context.micros_to_ticks(elapsed_micros.max(0));
        let delta = self.navigator.advance_to(target)?;
        self.context.current_tick = target;

        for event in &delta.pressed {
            if event.is_long_lasting() {
                self.context.apply(event);
            }
        }

        if self.context.at_end() {
            tracing::debug!(tick = target, "reached end of score");
            self.playing = false;
        }

        self.queue.enqueue_delta(&delta);
        Ok(self.queue.drain_ordered())
    }

    /// Jumps the playhead to an arbitrary tick and returns the forced
    /// re-registration batch: everything off, then the state and notes
    /// active at the target.
    pub fn seek(&mut self, target_tick: Tick) -> Result<Vec<PlaybackMessage>, NavigatorError> {
        let snapshot = self.navigator.seek_to(target_tick)?;
        self.context.current_tick = target_tick;
        self.apply_snapshot(&snapshot);

        self.queue.clear();
        self.queue.enqueue_snapshot(&snapshot);
        Ok(self.queue.drain_ordered())
    }

    /// Folds a seek snapshot's long-lasting events into the context.
    fn apply_snapshot(&mut self, snapshot: &SeekSnapshot) {
        // Reset to defaults first: a backward seek must not keep state from
        // events that now lie in the future.
        let current_tick = self.context.current_tick;
        self.context = PlaybackContext {
            current_tick,
            ticks_per_beat: self.context.ticks_per_beat,
            duration_ticks: self.context.duration_ticks,
            ..PlaybackContext::default()
        };
        for event in &snapshot.pressed {
            if event.is_long_lasting() {
                self.context.apply(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{EventId, ScoreEvent};

    fn config() -> NavigatorConfig {
        NavigatorConfig {
            lookahead_ticks: 100,
            partition_length: 500,
        }
    }

    /// 480 ticks per beat at 120 BPM: one millisecond is roughly one tick.
    fn score() -> Score {
        let events = vec![
            ScoreEvent::tempo(EventId::new(0), 0, 500_000),
            ScoreEvent::program_change(EventId::new(1), 0, 0, 19),
            ScoreEvent::sound(EventId::new(2), 10, 500, 0, 60, 100),
            ScoreEvent::sound(EventId::new(3), 600, 900, 0, 64, 90),
        ];
        Score::new(events, 1000, 480)
    }

    #[test]
    fn test_frame_advance_emits_ordered_messages() {
        let mut transport = Transport::new(config()).unwrap();
        transport.load(score());
        transport.play();

        // ~31ms at 120 BPM / 480 tpb is ~30 ticks: past the first note-on.
        let batch = transport.on_frame(31_250).unwrap();
        assert_eq!(
            batch,
            vec![
                PlaybackMessage::TempoChange {
                    micros_per_beat: 500_000
                },
                PlaybackMessage::ProgramChange {
                    channel: 0,
                    program: 19
                },
                PlaybackMessage::NoteOn {
                    channel: 0,
                    note: 60,
                    velocity: 100
                },
            ]
        );
        assert_eq!(transport.current_tick(), 30);
        assert_eq!(transport.context().channel_programs[0], 19);
    }

    #[test]
    fn test_paused_transport_is_inert() {
        let mut transport = Transport::new(config()).unwrap();
        transport.load(score());

        assert!(transport.on_frame(16_000).unwrap().is_empty());
        assert_eq!(transport.current_tick(), 0);
    }

    #[test]
    fn test_seek_forces_full_registration() {
        let mut transport = Transport::new(config()).unwrap();
        transport.load(score());

        let batch = transport.seek(700).unwrap();
        assert_eq!(
            batch,
            vec![
                PlaybackMessage::AllNotesOff,
                PlaybackMessage::TempoChange {
                    micros_per_beat: 500_000
                },
                PlaybackMessage::ProgramChange {
                    channel: 0,
                    program: 19
                },
                PlaybackMessage::NoteOn {
                    channel: 0,
                    note: 64,
                    velocity: 90
                },
            ]
        );
        assert_eq!(transport.current_tick(), 700);
    }

    #[test]
    fn test_backward_seek_resets_context() {
        let mut transport = Transport::new(config()).unwrap();
        transport.load(score());

        transport.seek(700).unwrap();
        assert_eq!(transport.context().channel_programs[0], 19);

        // Before the program change fired: context is back to defaults.
        let batch = transport.seek(-100).unwrap();
        assert_eq!(batch, vec![PlaybackMessage::AllNotesOff]);
        assert_eq!(transport.context().channel_programs[0], 0);
    }

    #[test]
    fn test_pauses_at_end_of_score() {
        let mut transport = Transport::new(config()).unwrap();
        transport.load(score());
        transport.seek(990).unwrap();
        transport.play();

        transport.on_frame(1_000_000).unwrap();
        assert!(!transport.is_playing());
        assert!(transport.context().at_end());
    }

    #[test]
    fn test_unloaded_transport_frame_is_error_free_noop_when_paused() {
        let mut transport = Transport::new(config()).unwrap();
        assert!(transport.on_frame(16_000).unwrap().is_empty());

        transport.play();
        assert!(matches!(
            transport.on_frame(16_000),
            Err(NavigatorError::NotLoaded)
        ));
    }
}
