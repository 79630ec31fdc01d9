//! Timeline event representation.
//!
//! Every entry on the timeline (a sounding note, a tempo change, a program
//! change, or a control change) is a [`ScoreEvent`]: a `kind` discriminant
//! plus uniform temporal queries. The navigator never matches on the kind
//! directly; it only asks *when* an event begins, *when* it ends, and whether
//! it is long-lasting.

use serde::{Deserialize, Serialize};

use super::Tick;

/// Unique identifier for a timeline event.
///
/// Assigned monotonically by whoever builds the event list (the MIDI importer
/// in practice). Used as the key for idempotent insertion into the
/// created/pressed sets: an event must never appear twice in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw ID value (for serialization/debugging).
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Kind-specific payload of a timeline event.
///
/// Tempo, program and control changes are instantaneous on the timeline but
/// represent *persistent state*: they stay active until superseded by a later
/// change with the same scope, rather than having a bounded duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A sounding note with a bounded duration.
    Sound {
        /// MIDI channel (0-15).
        channel: u8,
        /// MIDI note number (0-127).
        note: u8,
        /// Note velocity (0-127).
        velocity: u8,
    },
    /// A tempo change, in microseconds per beat.
    Tempo { micros_per_beat: u32 },
    /// An instrument change on a channel.
    ProgramChange { channel: u8, program: u8 },
    /// A controller value change on a channel.
    ControlChange { channel: u8, controller: u8, value: u8 },
}

/// Scope under which long-lasting events supersede each other.
///
/// The partition builder keeps only the most recent event per fold key: a
/// single tempo slot, one program per channel, one control value per
/// (channel, controller) pair. Sounds never fold; they are keyed by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum FoldKey {
    Tempo,
    Program(u8),
    Control(u8, u8),
    Owner(EventId),
}

/// A single immutable event on the timeline.
///
/// Events are created once at load time and read-only thereafter. The full
/// sequence handed to a navigator is sorted non-decreasing by
/// [`begin_when`](Self::begin_when); ties keep their original order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    /// Unique identifier for this event.
    pub id: EventId,

    /// Tick at which the event begins.
    pub begin_tick: Tick,

    /// Tick at which the event ends. Equals `begin_tick` for instantaneous
    /// kinds (tempo/program/control changes).
    pub end_tick: Tick,

    /// Kind discriminant plus payload.
    pub kind: EventKind,
}

impl ScoreEvent {
    /// Creates a sounding note spanning `[begin_tick, end_tick]`.
    pub fn sound(
        id: EventId,
        begin_tick: Tick,
        end_tick: Tick,
        channel: u8,
        note: u8,
        velocity: u8,
    ) -> Self {
        Self {
            id,
            begin_tick,
            end_tick,
            kind: EventKind::Sound {
                channel: channel.min(15),
                note: note.min(127),
                velocity: velocity.min(127),
            },
        }
    }

    /// Creates an instantaneous tempo change.
    pub fn tempo(id: EventId, at_tick: Tick, micros_per_beat: u32) -> Self {
        Self {
            id,
            begin_tick: at_tick,
            end_tick: at_tick,
            kind: EventKind::Tempo { micros_per_beat },
        }
    }

    /// Creates an instantaneous program (instrument) change.
    pub fn program_change(id: EventId, at_tick: Tick, channel: u8, program: u8) -> Self {
        Self {
            id,
            begin_tick: at_tick,
            end_tick: at_tick,
            kind: EventKind::ProgramChange {
                channel: channel.min(15),
                program: program.min(127),
            },
        }
    }

    /// Creates an instantaneous control change.
    pub fn control_change(
        id: EventId,
        at_tick: Tick,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Self {
        Self {
            id,
            begin_tick: at_tick,
            end_tick: at_tick,
            kind: EventKind::ControlChange {
                channel: channel.min(15),
                controller,
                value,
            },
        }
    }

    /// Tick at which this event begins.
    pub fn begin_when(&self) -> Tick {
        self.begin_tick
    }

    /// Tick at which this event ends.
    ///
    /// For long-lasting kinds this equals [`begin_when`](Self::begin_when);
    /// they leave the pressed set only when superseded, never by expiry.
    pub fn end_when(&self) -> Tick {
        self.end_tick
    }

    /// Whether this event represents persistent state rather than a bounded
    /// duration. True for tempo, program and control changes.
    pub fn is_long_lasting(&self) -> bool {
        !matches!(self.kind, EventKind::Sound { .. })
    }

    /// Key for idempotent membership in the created/pressed sets.
    pub fn owner_id(&self) -> EventId {
        self.id
    }

    /// Scope under which this event supersedes earlier ones.
    pub(crate) fn fold_key(&self) -> FoldKey {
        match self.kind {
            EventKind::Sound { .. } => FoldKey::Owner(self.id),
            EventKind::Tempo { .. } => FoldKey::Tempo,
            EventKind::ProgramChange { channel, .. } => FoldKey::Program(channel),
            EventKind::ControlChange {
                channel, controller, ..
            } => FoldKey::Control(channel, controller),
        }
    }
}
