//! Adapter interfaces for external collaborators.
//!
//! The monitoring core only talks to these traits:
//! - `LineSource`: the sensor device stream
//! - `SnapshotProvider`: the camera
//! - `Notifier`: mail and SMS delivery
//!
//! Concrete implementations live in the submodules and are wired up by the
//! CLI from the resolved configuration.

pub mod camera;
pub mod device;
pub mod mail;
pub mod notifier;
pub mod sms;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{AlertPayload, SnapshotHandle};

pub use camera::{CommandCamera, NoCamera};
pub use device::{DeviceEndpoint, DeviceStream};
pub use mail::MailClient;
pub use notifier::{ChannelNotifier, LogNotifier};
pub use sms::SmsClient;

/// Producer of device lines
#[async_trait]
pub trait LineSource: Send {
    /// Endpoint name for logs
    fn describe(&self) -> &str;

    /// Next line without its delimiter, or `None` once the stream ends.
    ///
    /// Bytes are returned undecoded so the caller decides what to do with
    /// invalid UTF-8.
    async fn next_line(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Camera that can take a single still image
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Capture one frame. Any failure yields `None`.
    async fn capture(&self) -> Option<SnapshotHandle>;
}

/// Alert delivery over two independent channels
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Send the attachment-capable message
    async fn send_mail(&self, payload: &AlertPayload) -> Result<()>;

    /// Send the short text message
    async fn send_text(&self, body: &str) -> Result<()>;
}
