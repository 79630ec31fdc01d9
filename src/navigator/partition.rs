//! Checkpoint construction: one offline forward pass over the event list,
//! snapshotting cursor state at fixed tick intervals.
//!
//! Checkpoints make arbitrary seeks cheap: a seek clones the checkpoint at
//! or before its target and refines forward at most one partition length.
//!
//! Long-lasting events are folded rather than accumulated: a checkpoint
//! retains only the latest tempo, the latest program change per channel and
//! the latest control change per (channel, controller) pair, because only
//! the most recent instance of each is semantically active at any tick. This
//! bounds checkpoint size independent of file length.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::score::{EventId, FoldKey, ScoreEvent, Tick};

use super::{CursorState, NavigatorConfig};

/// An immutable snapshot of cursor state at a fixed tick boundary.
///
/// Owned by the caching navigator that built it; never mutated after
/// creation. Seeks clone the cursor (copy-on-read).
#[derive(Debug, Clone)]
pub struct Checkpoint {
    tick: Tick,
    cursor: CursorState,
}

impl Checkpoint {
    /// Tick at which this snapshot was captured.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// The captured cursor state.
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }
}

/// Builds the checkpoint sequence for a loaded score in one forward pass.
///
/// Produces `ceil(duration / partition_length)` checkpoints at ticks
/// `0, L, 2L, ...`; an empty or zero-length score produces exactly one
/// pristine checkpoint so that seeks against it resolve to empty sets.
/// Checkpoint 0 is always the pristine state: a seek target before tick
/// zero must see nothing in its lookahead window yet.
///
/// The config must already be validated.
pub(crate) fn build_checkpoints_impl(
    events: &[ScoreEvent],
    duration: Tick,
    config: &NavigatorConfig,
) -> Vec<Checkpoint> {
    let length = config.partition_length;
    let boundaries = if duration <= 0 {
        1
    } else {
        ((duration + length - 1) / length) as usize
    };

    let mut builder = PartitionBuilder::new(events, config.lookahead_ticks);
    let mut checkpoints = Vec::with_capacity(boundaries);
    checkpoints.push(builder.checkpoint(0));
    for boundary in 1..boundaries {
        let tick = boundary as Tick * length;
        builder.advance_to(tick);
        checkpoints.push(builder.checkpoint(tick));
    }

    tracing::debug!(
        checkpoints = checkpoints.len(),
        partition_length = length,
        "built seek checkpoints"
    );
    checkpoints
}

/// Builds the checkpoint sequence for a score.
///
/// Standalone entry point mirroring what [`super::CachingNavigator`] does on
/// load, for callers that manage checkpoints themselves.
///
/// # Errors
///
/// Returns [`super::NavigatorError::InvalidConfiguration`] for a
/// non-positive partition length or negative lookahead.
pub fn build_checkpoints(
    events: &[ScoreEvent],
    duration: Tick,
    config: &NavigatorConfig,
) -> Result<Vec<Checkpoint>, super::NavigatorError> {
    config.validate()?;
    Ok(build_checkpoints_impl(events, duration, config))
}

/// Single-pass walker producing folded cursor snapshots.
///
/// Runs the same create/press/release loops as the linear advance, with one
/// override: pressing a long-lasting event replaces any existing entry under
/// the same fold key instead of inserting by owner id.
struct PartitionBuilder<'a> {
    events: &'a [ScoreEvent],
    lookahead: Tick,
    create_pointer: usize,
    press_pointer: usize,
    created: IndexMap<EventId, ScoreEvent>,
    /// Active events keyed by fold scope: sounds by identity, long-lasting
    /// kinds by the scope they supersede. The ordered key type also fixes
    /// checkpoint layout: tempo, then programs, then controls, then sounds.
    pressed: BTreeMap<FoldKey, ScoreEvent>,
}

impl<'a> PartitionBuilder<'a> {
    fn new(events: &'a [ScoreEvent], lookahead: Tick) -> Self {
        Self {
            events,
            lookahead,
            create_pointer: 0,
            press_pointer: 0,
            created: IndexMap::new(),
            pressed: BTreeMap::new(),
        }
    }

    /// Advances the walk to an absolute tick boundary.
    fn advance_to(&mut self, target_tick: Tick) {
        while self.create_pointer < self.events.len() {
            let event = self.events[self.create_pointer];
            if target_tick + self.lookahead < event.begin_when() {
                break;
            }
            self.created.insert(event.owner_id(), event);
            self.create_pointer += 1;
        }

        while self.press_pointer < self.events.len() {
            let event = self.events[self.press_pointer];
            if target_tick < event.begin_when() {
                break;
            }
            self.created.swap_remove(&event.owner_id());
            // Folding press: replaces any entry under the same fold key
            self.pressed.insert(event.fold_key(), event);
            self.press_pointer += 1;
        }

        let expired: Vec<FoldKey> = self
            .pressed
            .values()
            .filter(|e| !e.is_long_lasting() && target_tick >= e.end_when())
            .map(|e| e.fold_key())
            .collect();
        for key in expired {
            self.pressed.remove(&key);
        }
    }

    /// Materializes the folded state into an immutable checkpoint.
    ///
    /// Long-lasting entries come first so that a forced re-registration
    /// after a seek applies tempo/program/control state before note-ons.
    fn checkpoint(&self, tick: Tick) -> Checkpoint {
        let pressed: IndexMap<EventId, ScoreEvent> = self
            .pressed
            .values()
            .map(|event| (event.owner_id(), *event))
            .collect();

        Checkpoint {
            tick,
            cursor: CursorState::from_parts(
                self.create_pointer,
                self.press_pointer,
                self.created.clone(),
                pressed,
            ),
        }
    }
}
