//! Translation of assembled records into outbound requests.
//!
//! # Responsibilities
//! - Take path and query from the logged request target, as written
//! - Derive scheme and version from the logged protocol
//! - Point the URL at the replay target, keep the original Host aside
//! - Copy headers unchanged; never attach a body

use std::fmt;

use bytes::Bytes;
use http_body_util::Empty;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::http::uri::{Authority, PathAndQuery, Scheme};
use hyper::{Method, Request, Uri, Version};
use thiserror::Error;

use crate::parser::RequestRecord;

/// Largest accepted major or minor protocol version number.
const MAX_VERSION_PART: u32 = 1_000_000;

/// Reasons a record cannot be replayed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Malformed path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Invalid method: {0:?}")]
    InvalidMethod(String),

    #[error("Invalid header {name:?}")]
    InvalidHeader { name: String },

    #[error("Invalid target host: {0:?}")]
    InvalidTarget(String),
}

impl TranslateError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TranslateError::MalformedPath { .. } => "malformed_path",
            TranslateError::UnknownScheme(_) => "unknown_scheme",
            TranslateError::UnknownProtocol(_) => "unknown_protocol",
            TranslateError::InvalidMethod(_) => "invalid_method",
            TranslateError::InvalidHeader { .. } => "invalid_header",
            TranslateError::InvalidTarget(_) => "invalid_target",
        }
    }
}

/// Parsed `major.minor` protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    /// Parse `HTTP/major.minor` or `HTTPS/major.minor`.
    pub fn parse(protocol: &str) -> Option<Self> {
        let rest = protocol
            .strip_prefix("HTTPS/")
            .or_else(|| protocol.strip_prefix("HTTP/"))?;
        let (major, minor) = rest.split_once('.')?;
        Some(Self {
            major: parse_version_part(major)?,
            minor: parse_version_part(minor)?,
        })
    }

    /// The wire version used for the outbound request.
    ///
    /// The client speaks HTTP/1.x only, so anything newer goes out as 1.1.
    pub fn wire_version(&self) -> Version {
        match (self.major, self.minor) {
            (0, _) => Version::HTTP_10,
            (1, 0) => Version::HTTP_10,
            _ => Version::HTTP_11,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn parse_version_part(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u32>().ok().filter(|n| *n <= MAX_VERSION_PART)
}

/// Scheme implied by the logged protocol.
fn scheme_for(protocol: &str) -> Result<Scheme, TranslateError> {
    match protocol.as_bytes() {
        [b'H', b'T', b'T', b'P', b'S', ..] => Ok(Scheme::HTTPS),
        [b'H', b'T', b'T', b'P', ..] => Ok(Scheme::HTTP),
        _ => Err(TranslateError::UnknownScheme(protocol.to_string())),
    }
}

/// A request ready to send. Immutable once built.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Scheme, replay target, original path and query.
    pub url: Uri,
    pub version: ProtocolVersion,
    pub headers: HeaderMap,
    /// Original `Host` header, trimmed. Empty when the record had none.
    pub original_host: String,
    /// Transaction id of the source record.
    pub xid: Option<u64>,
}

impl OutboundRequest {
    /// The outbound URL with the host swapped back to the original virtual host.
    pub fn display_url(&self) -> String {
        let host = if self.original_host.is_empty() {
            self.url.authority().map(Authority::as_str).unwrap_or("")
        } else {
            self.original_host.as_str()
        };
        let path_and_query = self.url.path_and_query().map(PathAndQuery::as_str).unwrap_or("/");

        format!(
            "{}://{}{}",
            self.url.scheme_str().unwrap_or("http"),
            host,
            path_and_query
        )
    }

    /// Build the hyper request. The body is always empty.
    pub fn to_http_request(&self) -> Result<Request<Empty<Bytes>>, hyper::http::Error> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(self.url.clone())
            .version(self.version.wire_version());

        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers.clone();
        }

        builder.body(Empty::new())
    }
}

/// Translate a completed record into an outbound request aimed at `target_host`.
pub fn translate(
    record: RequestRecord,
    target_host: &str,
) -> Result<OutboundRequest, TranslateError> {
    // 1. Request target, origin-form or absolute-form. No dot-segment removal.
    let source: Uri = record
        .path
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| TranslateError::MalformedPath {
            path: record.path.clone(),
            reason: e.to_string(),
        })?;
    let path_and_query = source
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    // 2. Scheme
    let scheme = scheme_for(&record.protocol)?;

    // 3. Version
    let version = ProtocolVersion::parse(&record.protocol)
        .ok_or_else(|| TranslateError::UnknownProtocol(record.protocol.clone()))?;

    // 4. Outbound URL
    let authority: Authority = target_host
        .parse()
        .map_err(|_| TranslateError::InvalidTarget(target_host.to_string()))?;
    if authority.host().is_empty() {
        return Err(TranslateError::InvalidTarget(target_host.to_string()));
    }
    let url = Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|_| TranslateError::InvalidTarget(target_host.to_string()))?;

    let method = Method::from_bytes(record.method.as_bytes())
        .map_err(|_| TranslateError::InvalidMethod(record.method.clone()))?;

    // 5. Original virtual host
    let original_host = record.host().to_string();

    // 6. Headers, unchanged
    let mut headers = HeaderMap::with_capacity(record.headers.len());
    for (name, value) in &record.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TranslateError::InvalidHeader { name: name.clone() })?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| TranslateError::InvalidHeader { name: name.clone() })?;
        headers.append(header_name, header_value);
    }

    Ok(OutboundRequest {
        method,
        url,
        version,
        headers,
        original_host,
        xid: record.xid,
    })
}
