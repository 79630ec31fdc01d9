//! Seek-capable navigator backed by the checkpoint cache.
//!
//! Sequential per-frame advances run the same incremental logic as the
//! linear navigator. An arbitrary seek (forward, backward, even before the
//! start of the score) picks the checkpoint at or before the target and
//! refines forward from its cloned cursor, bounding per-seek cost to at most
//! one partition length of events rather than the whole file.

use std::sync::Arc;

use crate::score::{Score, Tick};

use super::partition::build_checkpoints_impl;
use super::{AdvanceDelta, Checkpoint, CursorState, NavigatorConfig, NavigatorError, SeekSnapshot};

/// Read-only state built once per loaded score and discarded on unload.
#[derive(Debug)]
struct LoadedScore {
    score: Arc<Score>,
    checkpoints: Vec<Checkpoint>,
}

/// Navigator answering arbitrary seeks in time bounded by the partition
/// length instead of the file length.
#[derive(Debug)]
pub struct CachingNavigator {
    config: NavigatorConfig,
    loaded: Option<LoadedScore>,
    cursor: CursorState,
    last_tick: Option<Tick>,
}

impl CachingNavigator {
    /// Creates a navigator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError::InvalidConfiguration`] for a non-positive
    /// partition length or a negative lookahead window.
    pub fn new(config: NavigatorConfig) -> Result<Self, NavigatorError> {
        config.validate()?;
        Ok(Self {
            config,
            loaded: None,
            cursor: CursorState::default(),
            last_tick: None,
        })
    }

    /// Loads a score, building its checkpoint cache in one forward pass and
    /// resetting the cursor to before the start.
    pub fn load(&mut self, score: impl Into<Arc<Score>>) {
        let score = score.into();
        let checkpoints = build_checkpoints_impl(score.events(), score.duration_ticks, &self.config);
        tracing::info!(
            events = score.len(),
            checkpoints = checkpoints.len(),
            "caching navigator loaded"
        );
        self.loaded = Some(LoadedScore { score, checkpoints });
        self.cursor = CursorState::default();
        self.last_tick = None;
    }

    /// Unloads the score, discarding checkpoints and invalidating all
    /// outstanding cursor state atomically. Any seek issued afterwards fails
    /// with [`NavigatorError::NotLoaded`] rather than reading stale state.
    pub fn unload(&mut self) {
        self.loaded = None;
        self.cursor = CursorState::default();
        self.last_tick = None;
    }

    /// Whether a score is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The loaded score, if any.
    pub fn score(&self) -> Option<&Arc<Score>> {
        self.loaded.as_ref().map(|l| &l.score)
    }

    /// Number of checkpoints in the cache. Zero when unloaded.
    pub fn checkpoint_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.checkpoints.len())
    }

    /// The cursor as of the last advance or seek.
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Monotonic per-frame advance; identical semantics to
    /// [`super::LinearNavigator::advance_to`].
    pub fn advance_to(&mut self, target_tick: Tick) -> Result<AdvanceDelta, NavigatorError> {
        let loaded = self.loaded.as_ref().ok_or(NavigatorError::NotLoaded)?;
        if let Some(last) = self.last_tick {
            if target_tick < last {
                return Err(NavigatorError::InvalidSeekDirection {
                    last,
                    target: target_tick,
                });
            }
        }
        let delta = self.cursor.advance(
            loaded.score.events(),
            target_tick,
            self.config.lookahead_ticks,
        );
        self.last_tick = Some(target_tick);
        Ok(delta)
    }

    /// Discontinuous jump to an arbitrary tick.
    ///
    /// Picks `floor(target / partition_length)` clamped into the checkpoint
    /// range, clones that checkpoint's cursor and refines it forward to the
    /// exact target, which is always a bounded forward advance. The refined cursor
    /// replaces the current one, so a following [`advance_to`](Self::advance_to)
    /// resumes from the seek target.
    ///
    /// The returned snapshot holds the *full* created and pressed sets at
    /// the target for forced re-registration; intermediate transitions are
    /// not replayed.
    pub fn seek_to(&mut self, target_tick: Tick) -> Result<SeekSnapshot, NavigatorError> {
        let loaded = self.loaded.as_ref().ok_or(NavigatorError::NotLoaded)?;

        let index = target_tick
            .div_euclid(self.config.partition_length)
            .clamp(0, loaded.checkpoints.len() as Tick - 1) as usize;
        let checkpoint = &loaded.checkpoints[index];
        tracing::debug!(target = target_tick, partition = index, "seek");

        let mut cursor = checkpoint.cursor().clone();
        cursor.advance(
            loaded.score.events(),
            target_tick,
            self.config.lookahead_ticks,
        );
        let snapshot = cursor.snapshot();
        self.cursor = cursor;
        self.last_tick = Some(target_tick);
        Ok(snapshot)
    }
}
