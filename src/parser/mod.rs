//! Log feed parsing subsystem.
//!
//! # Data Flow
//! ```text
//! raw varnishlog line
//!     → decoder.rs (fixed columns → xid, tag, value)
//!     → assembler.rs (fold tagged lines into one RequestRecord)
//!     → completed RequestRecord handed off by value
//! ```
//!
//! # Design Decisions
//! - Column offsets are fixed; lines too short to carry a value are skipped
//! - Tags are an explicit enum, unknown tags map to `Tag::Other` and are ignored
//! - The assembler owns exactly one record at a time and hands it off by value

pub mod assembler;
pub mod decoder;

pub use assembler::{Assembler, RequestRecord};
pub use decoder::{decode_line, LogEntry, Tag};
