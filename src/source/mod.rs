//! Log feed ingestion subsystem.
//!
//! # Data Flow
//! ```text
//! varnishlog child process (or stdin)
//!     → LogSource (buffered stdout pipe)
//!     → driver.rs (read loop → decoder → assembler → dispatcher)
//! ```
//!
//! # Design Decisions
//! - Every failure here is fatal: without the feed there is nothing to replay
//! - The child is killed when the source is dropped

pub mod driver;

use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::process::{Child, Command};

use crate::config::SourceConfig;

pub use driver::{DriveSummary, StreamDriver};

/// Ingestion-fatal errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to start {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0:?} has no stdout pipe")]
    MissingPipe(String),

    #[error("failed to read log feed: {0}")]
    Read(#[from] std::io::Error),
}

/// An open log feed.
pub struct LogSource {
    reader: Box<dyn AsyncBufRead + Send + Unpin>,
    child: Option<Child>,
}

impl LogSource {
    /// Open the feed described by the config.
    pub fn open(config: &SourceConfig) -> Result<Self, SourceError> {
        if config.stdin {
            tracing::info!("Reading log feed from stdin");
            Ok(Self::stdin())
        } else {
            Self::spawn(&config.command, &config.args)
        }
    }

    /// Start the log-producing process and take its stdout.
    pub fn spawn(command: &str, args: &[String]) -> Result<Self, SourceError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::MissingPipe(command.to_string()))?;

        tracing::info!(command = %command, args = ?args, pid = ?child.id(), "Log source started");

        Ok(Self {
            reader: Box::new(BufReader::new(stdout)),
            child: Some(child),
        })
    }

    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    /// Wrap any buffered reader, e.g. a file or an in-memory feed.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            child: None,
        }
    }

    /// Split into the reader and the child handle (if any).
    ///
    /// Keep the child alive while reading; dropping it kills the process.
    pub fn into_parts(self) -> (Box<dyn AsyncBufRead + Send + Unpin>, Option<Child>) {
        (self.reader, self.child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;

    #[tokio::test]
    async fn spawn_missing_program_fails() {
        let err = LogSource::spawn("definitely-not-a-real-varnishlog", &[])
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Spawn { .. }));
        assert!(err.to_string().contains("definitely-not-a-real-varnishlog"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawned_stdout_is_readable() {
        let source = LogSource::spawn("echo", &["  270 RxRequest    c GET".to_string()]).unwrap();
        let (mut reader, _child) = source.into_parts();
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim_end(), "  270 RxRequest    c GET");
    }
}
