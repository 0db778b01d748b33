//! Concurrent dispatch of replayed requests.
//!
//! # Responsibilities
//! - Spawn one independent task per completed record
//! - Translate, send, and time each request
//! - Emit exactly one result line per replayed request
//! - Record metrics (Prometheus, when enabled)

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::StatusCode;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::observability::metrics;
use crate::parser::RequestRecord;
use crate::replay::client::ReplayClient;
use crate::replay::in_flight::InFlightTracker;
use crate::replay::translator::{translate, OutboundRequest};

/// What the target did with one replayed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// The target answered, possibly with a redirect.
    Status(StatusCode),
    /// The transport failed; full error chain.
    Failed(String),
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchResult::Status(status) => write!(f, "{}", status.as_u16()),
            DispatchResult::Failed(error) => f.write_str(error),
        }
    }
}

/// Report for one replayed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Whole milliseconds, never below 1.
    pub elapsed_ms: u64,
    pub result: DispatchResult,
    pub method: String,
    /// Outbound URL shown with the original virtual host.
    pub display_url: String,
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}ms] [{}] {} {}",
            self.elapsed_ms, self.result, self.method, self.display_url
        )
    }
}

/// Clamp a measured duration to whole milliseconds, at least 1.
pub fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Render an error and all of its sources on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Sends completed records to the replay target.
#[derive(Clone)]
pub struct Dispatcher {
    client: ReplayClient,
    target: Arc<str>,
    in_flight: InFlightTracker,
}

impl Dispatcher {
    pub fn new(client: ReplayClient, target: impl Into<Arc<str>>, in_flight: InFlightTracker) -> Self {
        Self {
            client,
            target: target.into(),
            in_flight,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Replay a record on its own task.
    ///
    /// The caller may drop the handle; the task runs to completion regardless.
    pub fn spawn(&self, record: RequestRecord) -> JoinHandle<Option<DispatchOutcome>> {
        let guard = self.in_flight.track();
        let span = tracing::info_span!("dispatch", id = %guard.id(), xid = ?record.xid);
        let dispatcher = self.clone();

        tokio::spawn(
            async move {
                let _guard = guard;
                dispatcher.replay(record).await
            }
            .instrument(span),
        )
    }

    /// Translate and send one record, logging the result line.
    ///
    /// Returns `None` when the record could not be translated.
    pub async fn replay(&self, record: RequestRecord) -> Option<DispatchOutcome> {
        let request = match translate(record, &self.target) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping record");
                metrics::record_dropped(e.kind());
                return None;
            }
        };

        let outcome = self.send(&request).await;
        tracing::info!("{}", outcome);
        Some(outcome)
    }

    /// Send a translated request and time it. Never retries.
    pub async fn send(&self, request: &OutboundRequest) -> DispatchOutcome {
        let method = request.method.as_str();
        let start = Instant::now();

        let result = match request.to_http_request() {
            Ok(http_request) => match self.client.request(http_request).await {
                // Body is dropped unread.
                Ok(response) => DispatchResult::Status(response.status()),
                Err(e) => DispatchResult::Failed(error_chain(&e)),
            },
            Err(e) => DispatchResult::Failed(error_chain(&e)),
        };

        let elapsed = start.elapsed();
        match &result {
            DispatchResult::Status(status) => {
                metrics::record_response(method, status.as_u16(), elapsed)
            }
            DispatchResult::Failed(_) => metrics::record_transport_error(method, elapsed),
        }

        DispatchOutcome {
            elapsed_ms: elapsed_millis(elapsed),
            result,
            method: method.to_string(),
            display_url: request.display_url(),
        }
    }
}
