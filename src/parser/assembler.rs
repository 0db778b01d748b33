//! Request record assembly.
//!
//! # Responsibilities
//! - Fold a run of tagged lines into one `RequestRecord`
//! - Discard a half-built record when a new request starts
//! - Hand the completed record off by value on `ReqEnd`
//!
//! # Design Decisions
//! - The current record is replaced, never cleared in place
//! - No validation here; translation rejects incomplete records
//! - Header lines without a colon are skipped and logged

use crate::parser::decoder::{LogEntry, Tag};

/// One reconstructed client request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestRecord {
    /// Transaction id of the `RxRequest` line, for log context.
    pub xid: Option<u64>,
    pub method: String,
    /// Raw request target, absolute-path or absolute-URI form.
    pub path: String,
    /// `HTTP/1.1`, `HTTPS/1.1`, ...
    pub protocol: String,
    /// Headers in arrival order, duplicates preserved.
    pub headers: Vec<(String, String)>,
}

impl RequestRecord {
    /// Start a new record for the given method.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Append a header, keeping any earlier values for the same name.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Parse a raw `Name: Value` header line and append it.
    ///
    /// Splits on the first colon only and trims both sides. Returns `false`,
    /// leaving the record untouched, when there is no colon.
    pub fn add_header_line(&mut self, line: &str) -> bool {
        match line.split_once(':') {
            Some((name, value)) => {
                self.append_header(name.trim(), value.trim());
                true
            }
            None => false,
        }
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The original `Host` header value, trimmed. Empty when absent.
    pub fn host(&self) -> &str {
        self.header("host").map(str::trim).unwrap_or("")
    }

    fn is_empty(&self) -> bool {
        self.method.is_empty()
            && self.path.is_empty()
            && self.protocol.is_empty()
            && self.headers.is_empty()
    }
}

/// State machine over a single in-progress record.
#[derive(Debug, Default)]
pub struct Assembler {
    current: RequestRecord,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded line. Returns the record when the line completes it.
    pub fn push(&mut self, entry: LogEntry<'_>) -> Option<RequestRecord> {
        match entry.tag {
            Tag::RequestStart => {
                if !self.current.is_empty() {
                    tracing::debug!(
                        xid = ?self.current.xid,
                        method = %self.current.method,
                        path = %self.current.path,
                        "Discarding unfinished request"
                    );
                }
                self.current = RequestRecord::new(entry.value);
                self.current.xid = entry.xid;
            }
            Tag::RequestTarget => {
                self.current.path = entry.value.to_string();
            }
            Tag::Protocol => {
                self.current.protocol = entry.value.to_string();
            }
            Tag::Header => {
                if !self.current.add_header_line(entry.value) {
                    tracing::warn!(
                        xid = ?entry.xid,
                        line = %entry.value,
                        "Skipping malformed header line"
                    );
                }
            }
            Tag::RequestEnd => {
                return Some(std::mem::take(&mut self.current));
            }
            Tag::Other => {}
        }
        None
    }

    /// The record currently being built.
    pub fn current(&self) -> &RequestRecord {
        &self.current
    }
}
