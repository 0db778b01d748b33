//! Fixed-column decoding of varnishlog lines.
//!
//! A line looks like:
//!
//! ```text
//!   270 RxRequest    c GET
//! ^^^^^^ xid       ^^ client marker
//!       ^^^^^^^^^^^^^ tag   ^^^ value
//! ```

/// End of the transaction id column.
pub const XID_END: usize = 6;
/// Start of the tag column.
pub const TAG_START: usize = 6;
/// End of the tag column (exclusive).
pub const TAG_END: usize = 19;
/// Offset at which the value starts.
pub const VALUE_START: usize = 21;

/// The semantic role of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `RxRequest`: a new request begins, value is the method.
    RequestStart,
    /// `RxURL`: the request target.
    RequestTarget,
    /// `RxProtocol`: `HTTP/major.minor`.
    Protocol,
    /// `RxHeader`: one `Name: Value` header.
    Header,
    /// `ReqEnd`: the request is complete.
    RequestEnd,
    /// Any tag this tool does not replay.
    Other,
}

impl Tag {
    /// Map the trimmed tag column to a `Tag`.
    pub fn from_field(field: &str) -> Self {
        match field {
            "RxRequest" => Tag::RequestStart,
            "RxURL" => Tag::RequestTarget,
            "RxProtocol" => Tag::Protocol,
            "RxHeader" => Tag::Header,
            "ReqEnd" => Tag::RequestEnd,
            _ => Tag::Other,
        }
    }

    /// The varnishlog tag names this tool consumes, in `-i` filter order.
    pub fn varnishlog_filter() -> &'static str {
        "RxRequest,RxURL,RxProtocol,RxHeader,ReqEnd"
    }
}

/// One decoded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry<'a> {
    /// Transaction id, when the first column is numeric.
    pub xid: Option<u64>,
    pub tag: Tag,
    /// Everything after the value offset, untrimmed.
    pub value: &'a str,
}

/// Decode one raw line.
///
/// Returns `None` for lines that are too short to hold a value (blank separator
/// lines between transactions, for instance). Those are not errors.
pub fn decode_line(line: &str) -> Option<LogEntry<'_>> {
    if line.len() <= VALUE_START {
        return None;
    }

    let tag = line.get(TAG_START..TAG_END)?.trim();
    let value = line.get(VALUE_START..)?;
    let xid = line
        .get(..XID_END)
        .and_then(|col| col.trim().parse::<u64>().ok());

    Some(LogEntry {
        xid,
        tag: Tag::from_field(tag),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_request_start() {
        let entry = decode_line("  270 RxRequest    c GET").unwrap();
        assert_eq!(entry.xid, Some(270));
        assert_eq!(entry.tag, Tag::RequestStart);
        assert_eq!(entry.value, "GET");
    }

    #[test]
    fn value_is_not_trimmed() {
        let entry = decode_line("  270 RxHeader     c Host:  www.dogs.com  ").unwrap();
        assert_eq!(entry.tag, Tag::Header);
        assert_eq!(entry.value, "Host:  www.dogs.com  ");
    }

    #[test]
    fn short_lines_are_skipped() {
        assert_eq!(decode_line(""), None);
        assert_eq!(decode_line("  270 ReqEnd       c"), None);
        // Exactly VALUE_START bytes still has no value.
        assert_eq!(decode_line("  270 ReqEnd       c "), None);
    }

    #[test]
    fn unknown_tags_map_to_other() {
        let entry = decode_line("  270 SessionOpen  c 109.77.56.26 50315 :80").unwrap();
        assert_eq!(entry.tag, Tag::Other);
    }

    #[test]
    fn non_numeric_xid_is_absent() {
        let entry = decode_line("    - RxURL        c /index.html").unwrap();
        assert_eq!(entry.xid, None);
        assert_eq!(entry.tag, Tag::RequestTarget);
        assert_eq!(entry.value, "/index.html");
    }

    #[test]
    fn multibyte_column_boundary_is_skipped() {
        // 'é' straddles the tag column end; must not panic.
        assert_eq!(decode_line("  270 RxHeader    é  value"), None);
    }

    #[test]
    fn tag_mapping() {
        assert_eq!(Tag::from_field("RxURL"), Tag::RequestTarget);
        assert_eq!(Tag::from_field("RxProtocol"), Tag::Protocol);
        assert_eq!(Tag::from_field("ReqEnd"), Tag::RequestEnd);
        assert_eq!(Tag::from_field("rxrequest"), Tag::Other);
    }
}
