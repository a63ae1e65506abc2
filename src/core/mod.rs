//! Core alerting logic.
//!
//! This module contains:
//! - Classifier: raw line to event tag
//! - Episode: alert debounce state machine
//! - Dispatcher: one mail + SMS burst per episode
//! - Monitor: the loop that drives all of the above

pub mod classifier;
pub mod dispatcher;
pub mod episode;
pub mod monitor;

// Re-export commonly used types
pub use classifier::{classify, PatternSet};
pub use dispatcher::Dispatcher;
pub use episode::{Action, AlertEpisode, EpisodeState};
pub use monitor::{shutdown_signal, Monitor, MonitorSummary, StopReason};
