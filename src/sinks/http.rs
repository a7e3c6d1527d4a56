//! HTTP sink: one request per record

use crate::core::error::{LoggerError, Result};
use crate::core::{LevelSet, Sink};
use reqwest::blocking::Client;
use reqwest::Method;
use std::io;
use std::time::Duration;
use url::Url;

/// Per-request timeout
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(6);

/// Idle keep-alive connections kept per host
pub const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 50;

/// Sends each record as the body of one synchronous HTTP request.
///
/// There is no retry and no buffering. The response status is not inspected;
/// only transport failures are errors.
pub struct HttpSink {
    client: Client,
    method: Method,
    url: Url,
    levels: LevelSet,
}

impl HttpSink {
    /// Create a sink with its own connection pool.
    ///
    /// An empty `method` means `GET`.
    ///
    /// # Errors
    ///
    /// Fails if the method is not a valid HTTP token, or the endpoint does
    /// not parse or has no host.
    pub fn new(method: &str, endpoint: &str, levels: LevelSet) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| LoggerError::config("HttpSink", format!("cannot build client: {}", e)))?;
        Self::with_client(client, method, endpoint, levels)
    }

    /// Create a sink around a prebuilt client
    pub fn with_client(client: Client, method: &str, endpoint: &str, levels: LevelSet) -> Result<Self> {
        let method = if method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(method.as_bytes()).map_err(|e| {
                LoggerError::config("HttpSink", format!("invalid method '{}': {}", method, e))
            })?
        };

        Ok(Self {
            client,
            method,
            url: parse_endpoint(endpoint)?,
            levels,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    fn transport_error(&self, source: reqwest::Error) -> LoggerError {
        LoggerError::Http {
            url: self.url.to_string(),
            source,
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).map_err(|e| LoggerError::invalid_url(endpoint, e.to_string()))?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(LoggerError::invalid_url(endpoint, "missing host")),
    }
}

impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    fn levels(&self) -> &LevelSet {
        &self.levels
    }

    fn write(&self, record: &[u8]) -> Result<usize> {
        let mut response = self
            .client
            .request(self.method.clone(), self.url.clone())
            .body(record.to_vec())
            .send()
            .map_err(|e| self.transport_error(e))?;

        response
            .copy_to(&mut io::sink())
            .map_err(|e| self.transport_error(e))?;
        Ok(record.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    fn local_client() -> Client {
        Client::builder()
            .no_proxy()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap()
    }

    /// Accepts `count` requests and reports `(request line, body)` for each
    fn serve(count: usize, status: &'static str) -> (String, mpsc::Receiver<(String, Vec<u8>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("http://{}/ingest", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for stream in listener.incoming().take(count) {
                let stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                }
                let mut body = vec![0u8; content_length];
                reader.read_exact(&mut body).unwrap();

                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK",
                    status
                )
                .unwrap();
                tx.send((request_line.trim_end().to_string(), body)).unwrap();
            }
        });

        (addr, rx)
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        assert!(matches!(
            HttpSink::new("POST", "not a url", LevelSet::new()),
            Err(LoggerError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpSink::new("POST", "file:///tmp/log", LevelSet::new()),
            Err(LoggerError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_method() {
        assert!(matches!(
            HttpSink::new("PO ST", "http://localhost/", LevelSet::new()),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
        let sink = HttpSink::new("", "http://localhost/", LevelSet::new()).unwrap();
        assert_eq!(*sink.method(), Method::GET);
    }

    #[test]
    fn test_posts_record_body() {
        let (addr, rx) = serve(1, "200 OK");
        let sink = HttpSink::with_client(local_client(), "POST", &addr, LevelSet::new()).unwrap();

        let record = b"{\"level\":\"info\",\"message\":\"msg\"}\n";
        assert_eq!(sink.write_level(LogLevel::Info, record).unwrap(), record.len());

        let (request_line, body) = rx.recv().unwrap();
        assert_eq!(request_line, "POST /ingest HTTP/1.1");
        assert_eq!(body, record);
    }

    #[test]
    fn test_status_is_not_inspected() {
        let (addr, rx) = serve(1, "500 Internal Server Error");
        let sink = HttpSink::with_client(local_client(), "PUT", &addr, LevelSet::new()).unwrap();

        assert!(sink.write(b"{}\n").is_ok());
        assert!(rx.recv().unwrap().0.starts_with("PUT "));
    }

    #[test]
    fn test_filtered_level_sends_nothing() {
        let sink = HttpSink::new("POST", "http://127.0.0.1:9/", LevelSet::of([LogLevel::Error]))
            .unwrap();
        assert_eq!(sink.write_level(LogLevel::Debug, b"{}\n").unwrap(), 3);
    }

    #[test]
    fn test_unreachable_server_fails_fast() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = format!("http://127.0.0.1:{}/", port);
        let sink = HttpSink::with_client(local_client(), "POST", &endpoint, LevelSet::new()).unwrap();

        let started = Instant::now();
        let result = sink.write(b"{}\n");
        assert!(matches!(result, Err(LoggerError::Http { .. })));
        assert!(started.elapsed() < DEFAULT_HTTP_TIMEOUT + Duration::from_secs(1));
    }
}
