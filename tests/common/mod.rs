//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request head as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
}

#[allow(dead_code)]
impl ReceivedRequest {
    pub fn path(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or("")
    }

    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

fn parse_head(raw: &str) -> ReceivedRequest {
    let mut lines = raw.split("\r\n");
    let request_line = lines.next().unwrap_or("").to_string();
    let headers = lines
        .filter(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    ReceivedRequest { request_line, headers }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// Every request head is forwarded on the returned channel; `f` decides the
/// status line and extra headers of the response.
pub async fn start_recording_backend<F, Fut>(
    f: F,
) -> (SocketAddr, mpsc::UnboundedReceiver<ReceivedRequest>)
where
    F: Fn(ReceivedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (&'static str, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 4096];
                        loop {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }

                        let received = parse_head(&String::from_utf8_lossy(&buf));
                        let _ = tx.send(received.clone());

                        let (status, extra_headers) = f(received).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\n{}Content-Length: 0\r\nConnection: close\r\n\r\n",
                            status, extra_headers
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// Start a mock backend that answers every request with `status`.
#[allow(dead_code)]
pub async fn start_mock_backend(
    status: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<ReceivedRequest>) {
    start_recording_backend(move |_| async move { (status, String::new()) }).await
}

/// Format one varnishlog line with the fixed column layout.
#[allow(dead_code)]
pub fn log_line(xid: u64, tag: &str, value: &str) -> String {
    format!("{:>5} {:<12} c {}\n", xid, tag, value)
}
