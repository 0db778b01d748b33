//! Outbound HTTP client construction.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Empty;
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::ClientConfig;

/// Client used for every replayed request. Cheap to clone.
///
/// The legacy client never follows redirects, so 3xx responses reach the
/// dispatcher untouched.
pub type ReplayClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Build the shared client for plain HTTP and HTTPS targets.
pub fn build_client(config: &ClientConfig) -> ReplayClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(config.connect_timeout_secs.map(Duration::from_secs));

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    let client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build(https);

    tracing::debug!(
        connect_timeout_secs = ?config.connect_timeout_secs,
        pool_max_idle_per_host = config.pool_max_idle_per_host,
        "Replay client configured"
    );

    client
}
