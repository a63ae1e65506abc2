//! Snapshot capture.
//!
//! Shells out to an external capture tool (ffmpeg by default) that grabs a
//! single frame and writes it to `snapshot_<unix-seconds>.jpg`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use super::SnapshotProvider;
use crate::config::CameraSettings;
use crate::domain::SnapshotHandle;
use crate::error::MonitorError;

/// Placeholder replaced by the output file path in capture arguments
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Camera driven by an external command
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    output_dir: PathBuf,
    timeout: Duration,
}

impl CommandCamera {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            output_dir: output_dir.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self::new(
            settings.program.clone(),
            settings.args.clone(),
            settings.output_dir.clone(),
            Duration::from_secs(settings.timeout_seconds),
        )
    }

    /// Path for a snapshot taken now
    fn snapshot_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("snapshot_{}.jpg", Utc::now().timestamp()))
    }

    fn render_args(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }

    async fn try_capture(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let path = self.snapshot_path();

        let run = Command::new(&self.program)
            .args(self.render_args(&path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = timeout(self.timeout, run)
            .await
            .with_context(|| format!("{} timed out after {:?}", self.program, self.timeout))?
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        if !path.is_file() {
            anyhow::bail!("{} produced no frame at {}", self.program, path.display());
        }

        Ok(path)
    }
}

#[async_trait]
impl SnapshotProvider for CommandCamera {
    fn name(&self) -> &str {
        &self.program
    }

    async fn capture(&self) -> Option<SnapshotHandle> {
        match self.try_capture().await {
            Ok(path) => {
                info!("📸 Snapshot saved: {}", path.display());
                Some(SnapshotHandle::new(path))
            }
            Err(e) => {
                warn!("{}", MonitorError::CaptureUnavailable(format!("{:#}", e)));
                None
            }
        }
    }
}

/// Provider used when the camera is disabled
#[derive(Debug, Default)]
pub struct NoCamera;

#[async_trait]
impl SnapshotProvider for NoCamera {
    fn name(&self) -> &str {
        "none"
    }

    async fn capture(&self) -> Option<SnapshotHandle> {
        None
    }
}
