//! Timeline navigation over the sorted score event list.
//!
//! Navigation answers one question: at an arbitrary target tick, which events
//! are *pending creation* (inside the lookahead window, visible as falling
//! notes but not yet struck), which are *pressed* (currently sounding or
//! semantically active), and where do the cursors into the master event list
//! stand.
//!
//! Two navigators share the same incremental-advance primitive:
//!
//! - [`LinearNavigator`] walks forward from wherever it last stood; cheap per
//!   frame, O(file) for an arbitrary jump.
//! - [`CachingNavigator`] snapshots cursor state at fixed tick intervals when
//!   a score is loaded, so an arbitrary seek costs at most one partition of
//!   forward work.

mod caching;
mod linear;
mod partition;

pub use caching::CachingNavigator;
pub use linear::LinearNavigator;
pub use partition::{build_checkpoints, Checkpoint};

use indexmap::IndexMap;
use thiserror::Error;

use crate::score::{EventId, ScoreEvent, Tick};

/// Default lookahead window: how far ahead of the playhead upcoming events
/// are pre-materialized for animation.
pub const DEFAULT_LOOKAHEAD_TICKS: Tick = 800;

/// Default tick span covered by one checkpoint partition.
pub const DEFAULT_PARTITION_LENGTH: Tick = 1000;

/// Errors produced by navigator operations.
///
/// All variants are local, synchronous and recoverable: the playback driver
/// is expected to no-op or request a clean reload, never to keep advancing
/// with corrupt pointers. Retries are meaningless; these are logic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigatorError {
    /// `advance_to` was called with a target behind the last advanced tick.
    /// Backward movement must go through a seek, never through incremental
    /// advance.
    #[error("advance target {target} is behind the last advanced tick {last}")]
    InvalidSeekDirection { last: Tick, target: Tick },

    /// A navigator was configured with a non-positive partition length or a
    /// negative lookahead window.
    #[error("invalid navigator configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// An operation was issued against a navigator with no score loaded.
    #[error("no score is loaded")]
    NotLoaded,
}

/// Tunable parameters for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Tick distance ahead of the playhead within which upcoming events
    /// enter the created set.
    pub lookahead_ticks: Tick,

    /// Ticks per checkpoint partition. Must be positive.
    pub partition_length: Tick,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            lookahead_ticks: DEFAULT_LOOKAHEAD_TICKS,
            partition_length: DEFAULT_PARTITION_LENGTH,
        }
    }
}

impl NavigatorConfig {
    pub(crate) fn validate(&self) -> Result<(), NavigatorError> {
        if self.partition_length <= 0 {
            return Err(NavigatorError::InvalidConfiguration(
                "partition length must be positive",
            ));
        }
        if self.lookahead_ticks < 0 {
            return Err(NavigatorError::InvalidConfiguration(
                "lookahead window must not be negative",
            ));
        }
        Ok(())
    }
}

/// Events that changed state during one forward advance, in three disjoint
/// lists: entered the lookahead window, reached their begin tick, reached
/// their end tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceDelta {
    /// Events that just entered the lookahead window.
    pub created: Vec<ScoreEvent>,

    /// Events that just reached their begin tick.
    pub pressed: Vec<ScoreEvent>,

    /// Non-long-lasting events that just reached their end tick.
    pub released: Vec<ScoreEvent>,
}

impl AdvanceDelta {
    /// Whether the advance changed nothing.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.pressed.is_empty() && self.released.is_empty()
    }
}

/// Full created/pressed sets at a seek target.
///
/// A seek jumps discontinuously, so intermediate per-tick transitions are
/// not replayed: the caller must treat every entry as a *forced*
/// registration or press, not an incremental delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeekSnapshot {
    /// Every event inside the lookahead window but not yet pressed.
    pub created: Vec<ScoreEvent>,

    /// Every event active at the seek target.
    pub pressed: Vec<ScoreEvent>,
}

/// Mutable cursor state of one pass over the event sequence.
///
/// Invariants: `create_pointer >= press_pointer`; both pointers are monotone
/// non-decreasing across forward advances and lie in `[0, N]`. The created
/// and pressed maps are keyed by owner id; their iteration order carries no
/// meaning.
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    create_pointer: usize,
    press_pointer: usize,
    created: IndexMap<EventId, ScoreEvent>,
    pressed: IndexMap<EventId, ScoreEvent>,
}

impl CursorState {
    /// Index of the next event to enter the lookahead window.
    pub fn create_pointer(&self) -> usize {
        self.create_pointer
    }

    /// Index of the next event to reach its begin tick.
    pub fn press_pointer(&self) -> usize {
        self.press_pointer
    }

    /// Events inside the lookahead window, not yet pressed.
    pub fn created(&self) -> impl Iterator<Item = &ScoreEvent> {
        self.created.values()
    }

    /// Events currently active.
    pub fn pressed(&self) -> impl Iterator<Item = &ScoreEvent> {
        self.pressed.values()
    }

    /// Rebuilds a cursor from parts. Used by the partition builder when
    /// folding long-lasting events into a checkpoint.
    pub(crate) fn from_parts(
        create_pointer: usize,
        press_pointer: usize,
        created: IndexMap<EventId, ScoreEvent>,
        pressed: IndexMap<EventId, ScoreEvent>,
    ) -> Self {
        Self {
            create_pointer,
            press_pointer,
            created,
            pressed,
        }
    }

    /// Captures the full created/pressed sets for a forced re-registration
    /// after a discontinuous jump.
    pub(crate) fn snapshot(&self) -> SeekSnapshot {
        SeekSnapshot {
            created: self.created.values().copied().collect(),
            pressed: self.pressed.values().copied().collect(),
        }
    }

    /// Advances this cursor to `target_tick`, which must not precede any
    /// earlier target within the same pass.
    ///
    /// Single pass, amortized O(1) per call when ticks advance smoothly:
    ///
    /// 1. Every event whose begin tick has entered the lookahead window is
    ///    added to the created set.
    /// 2. Every event whose begin tick has been reached moves from the
    ///    created set into the pressed set.
    /// 3. Every pressed non-long-lasting event whose end tick has been
    ///    reached is removed.
    ///
    /// Same-tick ties fire in sequence order; callers that care about
    /// cross-kind determinism must order their side effects (see
    /// [`crate::playback::MessageQueue`]).
    pub(crate) fn advance(
        &mut self,
        events: &[ScoreEvent],
        target_tick: Tick,
        lookahead: Tick,
    ) -> AdvanceDelta {
        let mut delta = AdvanceDelta::default();

        while self.create_pointer < events.len() {
            let event = events[self.create_pointer];
            if target_tick + lookahead < event.begin_when() {
                break;
            }
            // Keyed insertion: overwrites any stale entry with the same id
            self.created.insert(event.owner_id(), event);
            delta.created.push(event);
            self.create_pointer += 1;
        }

        while self.press_pointer < events.len() {
            let event = events[self.press_pointer];
            if target_tick < event.begin_when() {
                break;
            }
            self.created.swap_remove(&event.owner_id());
            self.pressed.insert(event.owner_id(), event);
            delta.pressed.push(event);
            self.press_pointer += 1;
        }

        let expired: Vec<EventId> = self
            .pressed
            .values()
            .filter(|e| !e.is_long_lasting() && target_tick >= e.end_when())
            .map(|e| e.owner_id())
            .collect();
        for id in expired {
            if let Some(event) = self.pressed.swap_remove(&id) {
                delta.released.push(event);
            }
        }

        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{EventId, ScoreEvent};

    fn sound(id: u64, begin: Tick, end: Tick) -> ScoreEvent {
        ScoreEvent::sound(EventId::new(id), begin, end, 0, 60, 100)
    }

    #[test]
    fn test_config_validation() {
        assert!(NavigatorConfig::default().validate().is_ok());

        let config = NavigatorConfig {
            partition_length: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(NavigatorError::InvalidConfiguration(_))
        ));

        let config = NavigatorConfig {
            lookahead_ticks: -1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(NavigatorError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_advance_window_then_press_then_release() {
        let events = vec![sound(0, 100, 200)];
        let mut cursor = CursorState::default();

        // Outside the lookahead window: nothing happens.
        let delta = cursor.advance(&events, 0, 50);
        assert!(delta.is_empty());
        assert_eq!(cursor.create_pointer(), 0);

        // Window reaches the event: created only.
        let delta = cursor.advance(&events, 50, 50);
        assert_eq!(delta.created.len(), 1);
        assert!(delta.pressed.is_empty());
        assert_eq!(cursor.create_pointer(), 1);
        assert_eq!(cursor.press_pointer(), 0);

        // Begin tick reached: moves from created to pressed.
        let delta = cursor.advance(&events, 100, 50);
        assert_eq!(delta.pressed.len(), 1);
        assert_eq!(cursor.created().count(), 0);
        assert_eq!(cursor.pressed().count(), 1);

        // End tick reached: released.
        let delta = cursor.advance(&events, 200, 50);
        assert_eq!(delta.released.len(), 1);
        assert_eq!(cursor.pressed().count(), 0);
    }

    #[test]
    fn test_long_lasting_events_never_expire() {
        let events = vec![ScoreEvent::tempo(EventId::new(0), 10, 400_000)];
        let mut cursor = CursorState::default();

        cursor.advance(&events, 10_000, 0);
        assert_eq!(cursor.pressed().count(), 1);
    }

    #[test]
    fn test_pointer_invariant_holds_across_advances() {
        let events = vec![sound(0, 0, 5), sound(1, 10, 15), sound(2, 10, 20), sound(3, 30, 40)];
        let mut cursor = CursorState::default();

        let mut last_create = 0;
        let mut last_press = 0;
        for target in (0..50).step_by(3) {
            cursor.advance(&events, target, 8);
            assert!(cursor.create_pointer() >= cursor.press_pointer());
            assert!(cursor.create_pointer() >= last_create);
            assert!(cursor.press_pointer() >= last_press);
            last_create = cursor.create_pointer();
            last_press = cursor.press_pointer();
        }
        assert_eq!(cursor.create_pointer(), events.len());
        assert_eq!(cursor.press_pointer(), events.len());
    }

    #[test]
    fn test_same_tick_ties_fire_in_sequence_order() {
        let events = vec![
            ScoreEvent::program_change(EventId::new(0), 10, 0, 7),
            ScoreEvent::sound(EventId::new(1), 10, 20, 0, 60, 100),
        ];
        let mut cursor = CursorState::default();

        let delta = cursor.advance(&events, 10, 0);
        let ids: Vec<u64> = delta.pressed.iter().map(|e| e.id.as_u64()).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
