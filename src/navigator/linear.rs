//! Baseline navigator: linear forward walk over the event list.
//!
//! Per-frame advances are amortized O(1); an arbitrary seek replays the
//! whole file from tick zero. The caching navigator reuses this module's
//! advance primitive and exists to make seeks cheaper; the linear navigator
//! is the ground truth it is tested against.

use std::sync::Arc;

use crate::score::{Score, Tick};

use super::{AdvanceDelta, CursorState, NavigatorError, SeekSnapshot};

/// O(seek-distance) navigator over a loaded score.
#[derive(Debug)]
pub struct LinearNavigator {
    lookahead: Tick,
    score: Option<Arc<Score>>,
    cursor: CursorState,
    last_tick: Option<Tick>,
}

impl LinearNavigator {
    /// Creates a navigator with the given lookahead window.
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError::InvalidConfiguration`] for a negative
    /// lookahead.
    pub fn new(lookahead_ticks: Tick) -> Result<Self, NavigatorError> {
        if lookahead_ticks < 0 {
            return Err(NavigatorError::InvalidConfiguration(
                "lookahead window must not be negative",
            ));
        }
        Ok(Self {
            lookahead: lookahead_ticks,
            score: None,
            cursor: CursorState::default(),
            last_tick: None,
        })
    }

    /// Loads a score and resets the cursor to before the start.
    pub fn load(&mut self, score: impl Into<Arc<Score>>) {
        let score = score.into();
        tracing::debug!(events = score.len(), "linear navigator loaded");
        self.score = Some(score);
        self.cursor = CursorState::default();
        self.last_tick = None;
    }

    /// Unloads the current score, invalidating all cursor state.
    pub fn unload(&mut self) {
        self.score = None;
        self.cursor = CursorState::default();
        self.last_tick = None;
    }

    /// The cursor as of the last advance or seek.
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Advances to `target_tick` and returns the events that changed state.
    ///
    /// Targets must be non-decreasing between seeks; a backward target fails
    /// with [`NavigatorError::InvalidSeekDirection`].
    pub fn advance_to(&mut self, target_tick: Tick) -> Result<AdvanceDelta, NavigatorError> {
        let score = self.score.as_ref().ok_or(NavigatorError::NotLoaded)?;
        if let Some(last) = self.last_tick {
            if target_tick < last {
                return Err(NavigatorError::InvalidSeekDirection {
                    last,
                    target: target_tick,
                });
            }
        }
        let delta = self
            .cursor
            .advance(score.events(), target_tick, self.lookahead);
        self.last_tick = Some(target_tick);
        Ok(delta)
    }

    /// Seeks by full replay from tick zero. O(events before target).
    ///
    /// The returned snapshot holds the complete created/pressed sets at the
    /// target; the replaced cursor becomes the starting point for subsequent
    /// advances.
    pub fn seek_to(&mut self, target_tick: Tick) -> Result<SeekSnapshot, NavigatorError> {
        let score = self.score.as_ref().ok_or(NavigatorError::NotLoaded)?;
        let mut cursor = CursorState::default();
        cursor.advance(score.events(), target_tick, self.lookahead);
        let snapshot = cursor.snapshot();
        self.cursor = cursor;
        self.last_tick = Some(target_tick);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::DEFAULT_LOOKAHEAD_TICKS;
    use crate::score::{EventId, ScoreEvent};

    fn score() -> Score {
        let events = vec![
            ScoreEvent::sound(EventId::new(0), 0, 5, 0, 60, 100),
            ScoreEvent::sound(EventId::new(1), 10, 15, 0, 62, 100),
            ScoreEvent::sound(EventId::new(2), 10, 20, 0, 64, 100),
            ScoreEvent::sound(EventId::new(3), 1000, 1005, 0, 65, 100),
            ScoreEvent::sound(EventId::new(4), 1000, 2000, 0, 67, 100),
        ];
        Score::new(events, 2000, 480)
    }

    #[test]
    fn test_not_loaded() {
        let mut nav = LinearNavigator::new(DEFAULT_LOOKAHEAD_TICKS).unwrap();
        assert_eq!(nav.advance_to(0), Err(NavigatorError::NotLoaded));
        assert!(matches!(nav.seek_to(0), Err(NavigatorError::NotLoaded)));
    }

    #[test]
    fn test_backward_advance_is_rejected() {
        let mut nav = LinearNavigator::new(50).unwrap();
        nav.load(score());
        nav.advance_to(100).unwrap();
        assert_eq!(
            nav.advance_to(99),
            Err(NavigatorError::InvalidSeekDirection {
                last: 100,
                target: 99
            })
        );
        // Equal targets are fine: non-decreasing, not strictly increasing.
        assert!(nav.advance_to(100).unwrap().is_empty());
    }

    #[test]
    fn test_press_notifications_across_gap() {
        let mut nav = LinearNavigator::new(50).unwrap();
        nav.load(score());
        nav.advance_to(999).unwrap();

        let delta = nav.advance_to(1001).unwrap();
        let pressed: Vec<u64> = delta.pressed.iter().map(|e| e.id.as_u64()).collect();
        assert_eq!(pressed, vec![3, 4]);
        // Events 0-2 were released long before this frame.
        assert!(delta.released.is_empty());
    }

    #[test]
    fn test_seek_replaces_cursor_and_advance_resumes() {
        let mut nav = LinearNavigator::new(50).unwrap();
        nav.load(score());
        nav.advance_to(500).unwrap();

        let snapshot = nav.seek_to(12).unwrap();
        let pressed: Vec<u64> = snapshot.pressed.iter().map(|e| e.id.as_u64()).collect();
        assert_eq!(pressed, vec![1, 2]);

        // Backwards relative to the earlier advance, but legal after a seek.
        let delta = nav.advance_to(20).unwrap();
        let released: Vec<u64> = delta.released.iter().map(|e| e.id.as_u64()).collect();
        assert_eq!(released, vec![1, 2]);
    }

    #[test]
    fn test_unload_invalidates_state() {
        let mut nav = LinearNavigator::new(50).unwrap();
        nav.load(score());
        nav.advance_to(100).unwrap();
        nav.unload();
        assert_eq!(nav.advance_to(200), Err(NavigatorError::NotLoaded));
    }
}
