//! Varnish traffic replay library.

pub mod config;
pub mod observability;
pub mod parser;
pub mod replay;
pub mod source;

pub use config::ReplayConfig;
pub use parser::{Assembler, RequestRecord};
pub use replay::{Dispatcher, OutboundRequest};
pub use source::{LogSource, StreamDriver};
