//! homesentry - Serial sensor alerting loop
//!
//! Watches the status lines printed by a home-security sensor board,
//! classifies them, and sends one alert burst (mail with the latest camera
//! snapshot, then SMS) per alarm episode.
//!
//! # Architecture
//!
//! The loop is strictly sequential:
//! - A `LineSource` yields one line from the device
//! - The classifier maps it to an `EventTag`
//! - The `AlertEpisode` state machine decides what to do
//! - Motion captures a snapshot; the first alarm of an episode dispatches
//!
//! Repeated alarm lines inside an episode are suppressed until the device
//! reports that motion stopped or the system was re-initialized.
//!
//! # Modules
//!
//! - `adapters`: Device stream, camera, mail and SMS integrations
//! - `core`: Classifier, episode state machine, dispatcher, monitor loop
//! - `domain`: Data structures (EventTag, SnapshotHandle, DispatchResult)
//! - `config`: Config file, environment and defaults
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Watch the board on the default serial port
//! homesentry watch --device /dev/ttyUSB0
//!
//! # Try a pattern set against a recorded log without sending anything
//! homesentry replay device.log
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use adapters::{LineSource, Notifier, SnapshotProvider};
pub use crate::core::{
    classify, AlertEpisode, Dispatcher, EpisodeState, Monitor, MonitorSummary, PatternSet, StopReason,
};
pub use domain::{AlertPayload, ChannelOutcome, DispatchResult, EventTag, SnapshotHandle};
pub use error::MonitorError;
