//! Domain types for homesentry.
//!
//! This module contains the core data structures:
//! - Events: tags assigned to device lines
//! - Snapshot: handles to captured images
//! - Alert: payloads and per-channel dispatch results

pub mod alert;
pub mod events;
pub mod snapshot;

// Re-export commonly used types
pub use alert::{AlertPayload, AlertTemplate, Channel, ChannelOutcome, DispatchResult};
pub use events::EventTag;
pub use snapshot::SnapshotHandle;
