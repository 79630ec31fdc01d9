//! Output messages for the sound device, with deterministic ordering.
//!
//! Within one frame the navigator reports creations, presses and releases in
//! sequence order, which is parse order for same-tick ties. The queue makes
//! cross-kind ordering explicit: state changes (tempo, program, control) go
//! out before note-offs, and note-offs before note-ons, so a re-struck note
//! is never cut off by its own predecessor's release.

use serde::{Deserialize, Serialize};

use crate::score::{EventKind, ScoreEvent};

use crate::navigator::{AdvanceDelta, SeekSnapshot};

/// One instruction for the playback device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMessage {
    /// Silence every sounding note. Emitted before re-registering state on a
    /// discontinuous jump.
    AllNotesOff,
    /// Change the active tempo.
    TempoChange { micros_per_beat: u32 },
    /// Change the instrument on a channel.
    ProgramChange { channel: u8, program: u8 },
    /// Change a controller value on a channel.
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Stop a sounding note.
    NoteOff { channel: u8, note: u8 },
    /// Strike a note.
    NoteOn { channel: u8, note: u8, velocity: u8 },
}

impl PlaybackMessage {
    /// Builds the message a pressed event sends to the device.
    fn for_press(event: &ScoreEvent) -> Self {
        match event.kind {
            EventKind::Sound {
                channel,
                note,
                velocity,
            } => Self::NoteOn {
                channel,
                note,
                velocity,
            },
            EventKind::Tempo { micros_per_beat } => Self::TempoChange { micros_per_beat },
            EventKind::ProgramChange { channel, program } => {
                Self::ProgramChange { channel, program }
            }
            EventKind::ControlChange {
                channel,
                controller,
                value,
            } => Self::ControlChange {
                channel,
                controller,
                value,
            },
        }
    }

    /// Dispatch order within one frame; lower goes first.
    fn priority(&self) -> u8 {
        match self {
            Self::AllNotesOff => 0,
            Self::TempoChange { .. } => 1,
            Self::ProgramChange { .. } => 2,
            Self::ControlChange { .. } => 3,
            Self::NoteOff { .. } => 4,
            Self::NoteOn { .. } => 5,
        }
    }
}

/// Per-frame message batch, drained in priority order.
#[derive(Debug, Default)]
pub struct MessageQueue {
    queue: Vec<PlaybackMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one message.
    pub fn enqueue(&mut self, message: PlaybackMessage) {
        self.queue.push(message);
    }

    /// Queues the device effects of one incremental advance: note-offs for
    /// released sounds, then the press effects of newly pressed events.
    pub fn enqueue_delta(&mut self, delta: &AdvanceDelta) {
        for event in &delta.released {
            if let EventKind::Sound { channel, note, .. } = event.kind {
                self.enqueue(PlaybackMessage::NoteOff { channel, note });
            }
        }
        for event in &delta.pressed {
            self.enqueue(PlaybackMessage::for_press(event));
        }
    }

    /// Queues the forced re-registration after a discontinuous jump: silence
    /// everything, then replay the snapshot's active state and notes.
    pub fn enqueue_snapshot(&mut self, snapshot: &SeekSnapshot) {
        self.enqueue(PlaybackMessage::AllNotesOff);
        for event in &snapshot.pressed {
            self.enqueue(PlaybackMessage::for_press(event));
        }
    }

    /// Drains the batch, stably sorted by dispatch priority.
    pub fn drain_ordered(&mut self) -> Vec<PlaybackMessage> {
        let mut batch = std::mem::take(&mut self.queue);
        batch.sort_by_key(PlaybackMessage::priority);
        batch
    }

    /// Drops everything queued without dispatching it.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
