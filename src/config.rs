//! Configuration for homesentry.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI after loading)
//! 2. Environment variables (HOMESENTRY_*)
//! 3. Config file (.homesentry/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - `--config <path>` (or HOMESENTRY_CONFIG) wins if given
//! - Otherwise searches current directory and parents for .homesentry/config.yaml
//! - Relative paths in the config file are resolved against the directory
//!   that contains `.homesentry/`
//!
//! Secrets (mail API key, Twilio token) are never hard-coded; supply them in
//! the config file or, preferably, through the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::core::PatternSet;
use crate::domain::AlertTemplate;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub sms: SmsSettings,
    #[serde(default)]
    pub alert: AlertTemplate,
    #[serde(default)]
    pub patterns: PatternSet,
    /// Per-request timeout for the notification APIs
    #[serde(default)]
    pub http_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    /// Serial port path, `tcp://host:port`, or `-` for stdin
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Delay after opening a serial port before reading (ms)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_endpoint() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_settle_ms() -> u64 {
    2000
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            baud_rate: default_baud_rate(),
            settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Capture program
    #[serde(default = "default_camera_program")]
    pub program: String,
    /// Arguments; `{output}` is replaced by the snapshot path
    #[serde(default = "default_camera_args")]
    pub args: Vec<String>,
    #[serde(default = "default_snapshot_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_camera_timeout")]
    pub timeout_seconds: u64,
}

fn default_true() -> bool {
    true
}
fn default_camera_program() -> String {
    "ffmpeg".to_string()
}
fn default_camera_args() -> Vec<String> {
    [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "v4l2",
        "-i",
        "/dev/video0",
        "-frames:v",
        "1",
        "-y",
        "{output}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_snapshot_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".homesentry").join("snapshots"))
        .unwrap_or_else(|| PathBuf::from("."))
}
fn default_camera_timeout() -> u64 {
    10
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_camera_program(),
            args: default_camera_args(),
            output_dir: default_snapshot_dir(),
            timeout_seconds: default_camera_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
    #[serde(default = "default_mail_api_base")]
    pub api_base: String,
    pub domain: Option<String>,
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn default_mail_api_base() -> String {
    "https://api.mailgun.net".to_string()
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            api_base: default_mail_api_base(),
            domain: None,
            api_key: None,
            from: None,
            to: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsSettings {
    #[serde(default = "default_sms_api_base")]
    pub api_base: String,
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn default_sms_api_base() -> String {
    "https://api.twilio.com".to_string()
}

impl Default for SmsSettings {
    fn default() -> Self {
        Self {
            api_base: default_sms_api_base(),
            account_sid: None,
            auth_token: None,
            from: None,
            to: None,
        }
    }
}

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Configuration problems that stop startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    #[error("Device endpoint is empty")]
    EmptyEndpoint,

    #[error("No alarm patterns configured")]
    NoAlarmPatterns,
}

/// Resolved configuration with absolute paths and env overrides applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub device: DeviceSettings,
    pub camera: CameraSettings,
    pub mail: MailSettings,
    pub sms: SmsSettings,
    pub alert: AlertTemplate,
    pub patterns: PatternSet,
    pub http_timeout_seconds: u64,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None)
    }
}

impl ResolvedConfig {
    fn from_file(file: ConfigFile, config_file: Option<PathBuf>) -> Self {
        Self {
            device: file.device,
            camera: file.camera,
            mail: file.mail,
            sms: file.sms,
            alert: file.alert,
            patterns: file.patterns,
            http_timeout_seconds: file
                .http_timeout_seconds
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS),
            config_file,
        }
    }

    /// Check the configuration before starting.
    ///
    /// Notifier credentials are only required when alerts will really be
    /// sent (`dry_run == false`).
    pub fn validate(&self, dry_run: bool) -> Result<(), ConfigError> {
        if self.device.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.device.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate(self.device.baud_rate));
        }
        if !self.patterns.alarm.iter().any(|p| !p.is_empty()) {
            return Err(ConfigError::NoAlarmPatterns);
        }

        if dry_run {
            return Ok(());
        }

        let required = [
            ("mail.domain", &self.mail.domain),
            ("mail.api_key", &self.mail.api_key),
            ("mail.from", &self.mail.from),
            ("mail.to", &self.mail.to),
            ("sms.account_sid", &self.sms.account_sid),
            ("sms.auth_token", &self.sms.auth_token),
            ("sms.from", &self.sms.from),
            ("sms.to", &self.sms.to),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    /// Human-readable settings with secrets masked
    pub fn redacted(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "config_file",
                self.config_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string()),
            ),
            ("device.endpoint", self.device.endpoint.clone()),
            ("device.baud_rate", self.device.baud_rate.to_string()),
            ("device.settle_ms", self.device.settle_ms.to_string()),
            ("camera.enabled", self.camera.enabled.to_string()),
            ("camera.program", self.camera.program.clone()),
            ("camera.output_dir", self.camera.output_dir.display().to_string()),
            ("mail.api_base", self.mail.api_base.clone()),
            ("mail.domain", show(&self.mail.domain)),
            ("mail.api_key", redact(&self.mail.api_key)),
            ("mail.from", show(&self.mail.from)),
            ("mail.to", show(&self.mail.to)),
            ("sms.api_base", self.sms.api_base.clone()),
            ("sms.account_sid", show(&self.sms.account_sid)),
            ("sms.auth_token", redact(&self.sms.auth_token)),
            ("sms.from", show(&self.sms.from)),
            ("sms.to", show(&self.sms.to)),
            ("http_timeout_seconds", self.http_timeout_seconds.to_string()),
            ("patterns.alarm", self.patterns.alarm.join(" | ")),
            ("patterns.motion_started", self.patterns.motion_started.join(" | ")),
            ("patterns.motion_stopped", self.patterns.motion_stopped.join(" | ")),
            ("patterns.system_reset", self.patterns.system_reset.join(" | ")),
        ]
    }
}

fn show(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "(unset)".to_string())
}

fn redact(secret: &Option<String>) -> String {
    match secret {
        Some(s) if !s.is_empty() => "********".to_string(),
        _ => "(unset)".to_string(),
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".homesentry").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Apply HOMESENTRY_* overrides using `lookup` to read variables
fn apply_env<F>(file: &mut ConfigFile, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup("HOMESENTRY_DEVICE") {
        file.device.endpoint = endpoint;
    }
    if let Some(baud) = lookup("HOMESENTRY_BAUD_RATE") {
        file.device.baud_rate = baud
            .parse()
            .with_context(|| format!("HOMESENTRY_BAUD_RATE is not a number: {}", baud))?;
    }
    if let Some(dir) = lookup("HOMESENTRY_SNAPSHOT_DIR") {
        file.camera.output_dir = PathBuf::from(dir);
    }

    let overrides: [(&str, &mut Option<String>); 8] = [
        ("HOMESENTRY_MAIL_DOMAIN", &mut file.mail.domain),
        ("HOMESENTRY_MAIL_API_KEY", &mut file.mail.api_key),
        ("HOMESENTRY_MAIL_FROM", &mut file.mail.from),
        ("HOMESENTRY_MAIL_TO", &mut file.mail.to),
        ("HOMESENTRY_TWILIO_ACCOUNT_SID", &mut file.sms.account_sid),
        ("HOMESENTRY_TWILIO_AUTH_TOKEN", &mut file.sms.auth_token),
        ("HOMESENTRY_SMS_FROM", &mut file.sms.from),
        ("HOMESENTRY_SMS_TO", &mut file.sms.to),
    ];

    for (name, slot) in overrides {
        if let Some(value) = lookup(name) {
            *slot = Some(value);
        }
    }

    Ok(())
}

/// Load configuration from all sources
fn load_config_with<F>(explicit: Option<&Path>, start: &Path, lookup: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config_file = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => find_config_file(start),
    };

    let mut file = match config_file {
        Some(ref path) => {
            let mut file = load_config_file(path)?;

            // Base directory is the parent of .homesentry/ (grandparent of config.yaml)
            let base_dir = path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."));
            file.camera.output_dir = resolve_path(base_dir, &file.camera.output_dir);
            file
        }
        None => ConfigFile::default(),
    };

    apply_env(&mut file, lookup)?;

    Ok(ResolvedConfig::from_file(file, config_file))
}

/// Load configuration from the config file, environment and defaults
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_with(explicit, &cwd, |name| std::env::var(name).ok())
}
