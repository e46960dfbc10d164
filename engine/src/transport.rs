//! HTTP transport.
//!
//! The engine talks to the network through two traits:
//! - `Connector` creates transport handles. One handle is created per worker
//!   and never shared between threads.
//! - `Transport` performs one multipart submission at a time and reports the
//!   status code and body.
//!
//! `HttpConnector` is the production implementation, backed by a blocking
//! `reqwest` client with connection reuse and keep-alive.

use crate::config::UploaderConfig;
use crate::error::EngineError;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// One upload as seen by the transport.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// Full URL including the `key` parameter
    pub url: &'a str,
    /// Local file whose content becomes the `file` part
    pub path: &'a Path,
    /// File name announced in the `file` part
    pub file_name: &'a str,
    /// Server-side subdirectory; no `subdir` part is sent when empty
    pub subdir: &'a str,
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// Local file could not be attached to the request
    #[error("cannot attach file: {0}")]
    File(#[from] io::Error),

    /// No response was obtained (connection, TLS, timeout, redirect loop)
    #[error("{0}")]
    Http(String),
}

/// A reusable client-side handle able to perform one request at a time.
pub trait Transport {
    fn submit(&mut self, request: &UploadRequest<'_>) -> Result<TransportResponse, TransportError>;
}

/// Factory for per-worker transport handles.
pub trait Connector: Send + Sync {
    type Handle: Transport + Send + 'static;

    fn connect(&self) -> Result<Self::Handle, EngineError>;
}

/// Builds `reqwest` blocking clients configured for long uploads.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
    max_redirects: usize,
    user_agent: String,
}

impl HttpConnector {
    pub fn new(config: &UploaderConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_redirects: config.max_redirects,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Connector for HttpConnector {
    type Handle = HttpTransport;

    fn connect(&self) -> Result<HttpTransport, EngineError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(Policy::limited(self.max_redirects))
            .user_agent(self.user_agent.clone())
            .tcp_keepalive(Duration::from_secs(60))
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| EngineError::TransportInit(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

/// Transport handle owned by a single worker.
pub struct HttpTransport {
    client: Client,
}

impl Transport for HttpTransport {
    fn submit(&mut self, request: &UploadRequest<'_>) -> Result<TransportResponse, TransportError> {
        let file_part = Part::file(request.path)?.file_name(request.file_name.to_string());
        let mut form = Form::new().part("file", file_part);
        if !request.subdir.is_empty() {
            form = form.text("subdir", request.subdir.to_string());
        }

        let response = self
            .client
            .post(request.url)
            .multipart(form)
            .send()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        // Body is diagnostic only
        let body = response.text().unwrap_or_default();
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// What a mock handle saw for one submission.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub url: String,
        pub file_name: String,
        pub subdir: String,
    }

    #[derive(Clone)]
    enum Reply {
        Respond(TransportResponse),
        Unreachable,
    }

    /// Connector whose handles answer every request the same way and record
    /// what they were asked to send.
    #[derive(Clone)]
    pub struct MockConnector {
        reply: Reply,
        calls: Arc<AtomicUsize>,
        connections: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl MockConnector {
        pub fn responding(status: u16, body: &str) -> Self {
            Self::with_reply(Reply::Respond(TransportResponse {
                status,
                body: body.to_string(),
            }))
        }

        pub fn ok() -> Self {
            Self::responding(200, r#"{"success":true}"#)
        }

        pub fn unreachable() -> Self {
            Self::with_reply(Reply::Unreachable)
        }

        fn with_reply(reply: Reply) -> Self {
            Self {
                reply,
                calls: Arc::new(AtomicUsize::new(0)),
                connections: Arc::new(AtomicUsize::new(0)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Number of submissions across all handles.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Number of handles created.
        pub fn connections(&self) -> usize {
            self.connections.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().clone()
        }
    }

    pub struct MockTransport {
        shared: MockConnector,
    }

    impl Transport for MockTransport {
        fn submit(&mut self, request: &UploadRequest<'_>) -> Result<TransportResponse, TransportError> {
            self.shared.calls.fetch_add(1, Ordering::SeqCst);
            self.shared.requests.lock().push(RecordedRequest {
                url: request.url.to_string(),
                file_name: request.file_name.to_string(),
                subdir: request.subdir.to_string(),
            });
            match &self.shared.reply {
                Reply::Respond(response) => Ok(response.clone()),
                Reply::Unreachable => Err(TransportError::Http("connection refused".to_string())),
            }
        }
    }

    impl Connector for MockConnector {
        type Handle = MockTransport;

        fn connect(&self) -> Result<MockTransport, EngineError> {
            self.connections.fetch_add(1, Ordering::SeqCst);
            Ok(MockTransport {
                shared: self.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Accept one connection, read the full request and answer with `status_line`.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("Failed to accept connection");
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream
                .write_all(response.as_bytes())
                .expect("Failed to write response");
            request
        });
        (format!("http://{}/upload.php?key=secret", addr), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).expect("Failed to read request");
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let Some(header_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok());
            match content_length {
                Some(len) if data.len() >= header_end + 4 + len => break,
                Some(_) => continue,
                None if headers.contains("transfer-encoding: chunked") => {
                    if data.ends_with(b"0\r\n\r\n") {
                        break;
                    }
                }
                None => break,
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    fn connector() -> HttpConnector {
        HttpConnector::new(&UploaderConfig {
            key: "secret".to_string(),
            timeout: Duration::from_secs(10),
            ..UploaderConfig::default()
        })
    }

    #[test]
    fn test_http_transport_sends_multipart_form() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("hello.txt");
        std::fs::write(&path, "hello uploader").expect("Failed to write file");

        let (url, server) = serve_once("200 OK", r#"{"success":true}"#);
        let mut handle = connector().connect().expect("Failed to build client");
        let response = handle
            .submit(&UploadRequest {
                url: &url,
                path: &path,
                file_name: "hello.txt",
                subdir: "docs/reports",
            })
            .expect("Request should succeed");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"success":true}"#);

        let request = server.join().expect("Server thread panicked");
        assert!(request.starts_with("POST /upload.php?key=secret "));
        assert!(request.to_lowercase().contains("content-type: multipart/form-data"));
        assert!(request.contains(r#"name="file"; filename="hello.txt""#));
        assert!(request.contains("hello uploader"));
        assert!(request.contains(r#"name="subdir""#));
        assert!(request.contains("docs/reports"));
    }

    #[test]
    fn test_http_transport_omits_empty_subdir() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "a").expect("Failed to write file");

        let (url, server) = serve_once("500 Internal Server Error", r#"{"message":"disk full"}"#);
        let mut handle = connector().connect().expect("Failed to build client");
        let response = handle
            .submit(&UploadRequest {
                url: &url,
                path: &path,
                file_name: "a.txt",
                subdir: "",
            })
            .expect("Request should complete");

        assert_eq!(response.status, 500);
        assert!(response.body.contains("disk full"));

        let request = server.join().expect("Server thread panicked");
        assert!(!request.contains(r#"name="subdir""#));
    }

    #[test]
    fn test_http_transport_reports_connection_failure() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "a").expect("Failed to write file");

        // Bind and release a port so nothing is listening on it
        let addr = TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("Failed to reserve port");
        let url = format!("http://{}/upload.php?key=secret", addr);

        let mut handle = connector().connect().expect("Failed to build client");
        let result = handle.submit(&UploadRequest {
            url: &url,
            path: &path,
            file_name: "a.txt",
            subdir: "",
        });
        assert!(matches!(result, Err(TransportError::Http(_))));
    }

    #[test]
    fn test_http_transport_reports_missing_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing.txt");

        let mut handle = connector().connect().expect("Failed to build client");
        let result = handle.submit(&UploadRequest {
            url: "http://127.0.0.1:9/upload.php?key=secret",
            path: &path,
            file_name: "missing.txt",
            subdir: "",
        });
        assert!(matches!(result, Err(TransportError::File(_))));
    }
}
