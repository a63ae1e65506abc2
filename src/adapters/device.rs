//! Device stream adapter.
//!
//! Reads newline-delimited status lines from the sensor board. The board is
//! usually on a serial port; a serial-over-TCP bridge (ser2net and friends)
//! and stdin are accepted too, which is handy for piping recorded logs.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use super::LineSource;
use crate::error::MonitorError;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Where the device stream comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEndpoint {
    /// Serial port path, e.g. `/dev/ttyUSB0` or `COM12`
    Serial(String),

    /// `host:port` of a serial-over-TCP bridge
    Tcp(String),

    /// Standard input
    Stdin,
}

impl DeviceEndpoint {
    /// Parse an endpoint string.
    ///
    /// `tcp://host:port` selects TCP, `-` or `stdin` selects standard input,
    /// `serial://<path>` or anything else is a serial port path.
    pub fn parse(endpoint: &str) -> Self {
        let endpoint = endpoint.trim();

        if endpoint == "-" || endpoint == "stdin" {
            DeviceEndpoint::Stdin
        } else if let Some(addr) = endpoint.strip_prefix("tcp://") {
            DeviceEndpoint::Tcp(addr.to_string())
        } else if let Some(path) = endpoint.strip_prefix("serial://") {
            DeviceEndpoint::Serial(path.to_string())
        } else {
            DeviceEndpoint::Serial(endpoint.to_string())
        }
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceEndpoint::Serial(path) => f.write_str(path),
            DeviceEndpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
            DeviceEndpoint::Stdin => f.write_str("stdin"),
        }
    }
}

/// Buffered line reader over any byte stream
pub struct DeviceStream {
    name: String,
    reader: BufReader<BoxedReader>,
    /// Bytes of a line still being read; kept across cancelled reads
    pending: Vec<u8>,
}

impl DeviceStream {
    /// Wrap an already open reader
    pub fn from_reader<R>(name: impl Into<String>, reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            name: name.into(),
            reader: BufReader::new(Box::new(reader) as BoxedReader),
            pending: Vec::new(),
        }
    }

    /// Open the endpoint.
    ///
    /// Serial boards reset when the port opens, so reading starts only after
    /// `settle` has elapsed.
    pub async fn open(
        endpoint: &DeviceEndpoint,
        baud_rate: u32,
        settle: Duration,
    ) -> Result<Self, MonitorError> {
        let startup_fatal = |reason: String| MonitorError::StartupFatal {
            endpoint: endpoint.to_string(),
            reason,
        };

        let reader: BoxedReader = match endpoint {
            DeviceEndpoint::Serial(path) => {
                let port = tokio_serial::new(path.as_str(), baud_rate)
                    .open_native_async()
                    .map_err(|e| startup_fatal(e.to_string()))?;

                if !settle.is_zero() {
                    debug!("Waiting {:?} for {} to settle", settle, path);
                    tokio::time::sleep(settle).await;
                }
                Box::new(port)
            }
            DeviceEndpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str())
                    .await
                    .map_err(|e| startup_fatal(e.to_string()))?;
                Box::new(stream)
            }
            DeviceEndpoint::Stdin => Box::new(tokio::io::stdin()),
        };

        info!("Connected to {} ({} baud)", endpoint, baud_rate);
        Ok(Self::from_reader(endpoint.to_string(), reader))
    }
}

#[async_trait]
impl LineSource for DeviceStream {
    fn describe(&self) -> &str {
        &self.name
    }

    async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        let read = self
            .reader
            .read_until(b'\n', &mut self.pending)
            .await
            .with_context(|| format!("Failed to read from {}", self.name))?;

        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }

        let mut line = std::mem::take(&mut self.pending);
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(Some(line))
    }
}
