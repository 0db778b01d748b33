//! The read loop.
//!
//! # Responsibilities
//! - Read the feed line by line until EOF or a read error
//! - Push each line through the decoder and assembler
//! - Hand every completed record to the dispatcher without waiting

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::parser::{decode_line, Assembler};
use crate::replay::Dispatcher;
use crate::source::SourceError;

/// Counters for one run of the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSummary {
    /// Lines read, including skipped ones.
    pub lines: u64,
    /// Records completed by an end tag.
    pub records: u64,
    /// Dispatch tasks spawned.
    pub dispatches: u64,
}

/// Owns the assembler and feeds it from a log stream.
pub struct StreamDriver {
    assembler: Assembler,
    dispatcher: Dispatcher,
}

impl StreamDriver {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            assembler: Assembler::new(),
            dispatcher,
        }
    }

    /// Run until the stream ends. A read error is fatal.
    ///
    /// Returns as soon as the stream ends; dispatches may still be running.
    pub async fn run<R>(&mut self, mut reader: R) -> Result<DriveSummary, SourceError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = DriveSummary::default();
        let mut buf = Vec::with_capacity(256);

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            summary.lines += 1;

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);

            let Some(entry) = decode_line(line) else {
                continue;
            };
            if let Some(record) = self.assembler.push(entry) {
                summary.records += 1;
                // Fire and forget.
                drop(self.dispatcher.spawn(record));
                summary.dispatches += 1;
            }
        }

        tracing::info!(
            lines = summary.lines,
            records = summary.records,
            dispatches = summary.dispatches,
            "Log feed ended"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::replay::{build_client, InFlightTracker};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, ReadBuf};

    fn driver() -> StreamDriver {
        // Nothing listens on the discard port; dispatches fail fast and are ignored.
        let dispatcher = Dispatcher::new(
            build_client(&ClientConfig::default()),
            "127.0.0.1:9",
            InFlightTracker::new(),
        );
        StreamDriver::new(dispatcher)
    }

    #[tokio::test]
    async fn counts_lines_and_records() {
        let feed = "\
  270 SessionOpen  c 109.77.56.26 50315 209.49.145.8:80\r
  270 RxRequest    c GET\r
  270 RxURL        c /a\r
  270 RxProtocol   c HTTP/1.1\r
  270 ReqEnd       c 1 2 3\r
\r
  271 RxRequest    c GET\r
  271 RxURL        c /b\r
  271 RxProtocol   c HTTP/1.1\r
  271 ReqEnd       c 1 2 3";

        let summary = driver().run(feed.as_bytes()).await.unwrap();
        assert_eq!(
            summary,
            DriveSummary {
                lines: 10,
                records: 2,
                dispatches: 2,
            }
        );
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_stop_the_feed() {
        let mut feed = b"  270 RxRequest    c GET\n  270 RxHeader     c X-Bin: \xff\xfe\n".to_vec();
        feed.extend_from_slice(b"  270 ReqEnd       c 1\n");

        let summary = driver().run(&feed[..]).await.unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.dispatches, 1);
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "pipe closed",
            )))
        }
    }

    #[tokio::test]
    async fn read_error_is_fatal() {
        let reader = tokio::io::BufReader::new(FailingReader);
        let err = driver().run(reader).await.unwrap_err();
        assert!(matches!(err, SourceError::Read(_)));
    }
}
