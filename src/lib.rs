//! notefall - timeline core for a falling-notes MIDI visualizer and player.
//!
//! The crate answers one hard question cheaply: given an arbitrary target
//! tick on a large, time-ordered event sequence, which events are sounding,
//! which are visible in the lookahead window, and where do the cursors into
//! the master list stand, without re-scanning the list from tick zero on
//! every scrub-bar jump.
//!
//! Rendering, audio output and UI are external collaborators; they drive the
//! [`playback::Transport`] once per frame and consume the ordered
//! [`playback::PlaybackMessage`] batches it emits.

pub mod navigator;
pub mod playback;
pub mod score;

// Re-export commonly used types
pub use navigator::{
    AdvanceDelta, CachingNavigator, LinearNavigator, NavigatorConfig, NavigatorError, SeekSnapshot,
};
pub use playback::{MessageQueue, PlaybackContext, PlaybackMessage, Transport};
pub use score::{read_score, EventId, EventKind, Score, ScoreError, ScoreEvent, Tick};
