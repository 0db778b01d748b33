//! Request replication subsystem.
//!
//! # Data Flow
//! ```text
//! completed RequestRecord (owned)
//!     → dispatcher.rs (spawn one task per record)
//!         → translator.rs (record + target → OutboundRequest)
//!         → client.rs (hyper client, no redirect following)
//!         → one result line + metrics
//!     → in_flight.rs (guard held for the task's lifetime)
//! ```
//!
//! # Design Decisions
//! - Dispatch is fire-and-forget; the parser never waits on a task
//! - Every failure is local to its record: logged, never retried
//! - Redirects are reported as returned, never followed

pub mod client;
pub mod dispatcher;
pub mod in_flight;
pub mod translator;

pub use client::{build_client, ReplayClient};
pub use dispatcher::{DispatchOutcome, DispatchResult, Dispatcher};
pub use in_flight::{DispatchGuard, DispatchId, InFlightTracker};
pub use translator::{translate, OutboundRequest, ProtocolVersion, TranslateError};
