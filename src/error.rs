//! Failure taxonomy for the monitoring loop.
//!
//! Only `StartupFatal` and `DeviceLost` leave the process; every other kind is
//! logged by the loop iteration that produced it and monitoring carries on.

use std::string::FromUtf8Error;

use thiserror::Error;

use crate::domain::Channel;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Cannot open device stream {endpoint}: {reason}")]
    StartupFatal { endpoint: String, reason: String },

    #[error("Lost device stream {endpoint}: {reason}")]
    DeviceLost { endpoint: String, reason: String },

    #[error("Snapshot unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("{channel} notification failed for episode {episode}: {reason}")]
    ChannelSend {
        channel: Channel,
        episode: u64,
        reason: String,
    },

    #[error("Skipping undecodable line ({len} bytes): {source}")]
    Decode {
        len: usize,
        #[source]
        source: FromUtf8Error,
    },
}

impl MonitorError {
    /// Whether the device could not be opened at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, MonitorError::StartupFatal { .. })
    }
}
