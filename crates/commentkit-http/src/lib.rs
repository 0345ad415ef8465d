//! # CommentKit HTTP
//!
//! Minimal fetch-style HTTP/1.1 client used to post comments.
//!
//! Requests carry a [`RequestMode`] like the page's `fetch()` does. In CORS
//! mode a cross-origin request sends `Origin`, is preflighted when it is not a
//! simple request, and its response must grant the origin access.

use std::io::Write;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, ORIGIN};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
use native_tls::TlsConnector as NativeTlsConnector;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_native_tls::TlsConnector;
use tracing::{debug, trace};
use url::{Origin, Url};

pub mod cors;
pub mod scripted;

pub use scripted::ScriptedTransport;

/// HTTP client errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("CORS check failed: {0}")]
    CorsRejected(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Request mode, as in `fetch(url, { mode })`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Cross-origin requests are allowed, subject to CORS checks.
    #[default]
    Cors,
    /// Only simple methods; the response is not checked.
    NoCors,
    /// Cross-origin requests fail.
    SameOrigin,
}

/// A request to send.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub mode: RequestMode,
    /// Origin of the page issuing the request.
    pub origin: Option<Origin>,
}

impl Request {
    /// Create a request in CORS mode without an origin.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            mode: RequestMode::Cors,
            origin: None,
        }
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `Content-Type`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body))
    }

    /// Set the request mode.
    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the issuing page's origin.
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Whether the target lies outside the issuing origin.
    pub fn is_cross_origin(&self) -> bool {
        self.origin
            .as_ref()
            .map(|o| *o != self.url.origin())
            .unwrap_or(false)
    }

    /// Reject requests `fetch()` would refuse before touching the network.
    pub fn validate(&self) -> Result<(), HttpError> {
        if self.body.is_some() && (self.method == Method::GET || self.method == Method::HEAD) {
            return Err(HttpError::InvalidRequest(format!(
                "{} request cannot have a body",
                self.method
            )));
        }
        match self.mode {
            RequestMode::SameOrigin if self.is_cross_origin() => Err(HttpError::CorsRejected(
                format!("{} is not same-origin", self.url),
            )),
            RequestMode::NoCors if !cors::is_simple_method(&self.method) => {
                Err(HttpError::InvalidRequest(format!(
                    "{} is not allowed in no-cors mode",
                    self.method
                )))
            }
            _ => Ok(()),
        }
    }
}

/// HTTP response.
#[derive(Debug)]
pub struct Response {
    /// HTTP status code.
    pub status: StatusCode,
    /// HTTP version.
    pub version: Version,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
    /// Final URL (after redirects).
    pub url: Url,
}

impl Response {
    /// Get a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get content-type from headers.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Check if response is success (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get body as text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Decode the body as JSON, whatever the status code.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Anything that can carry a [`Request`] to a server.
///
/// The submission handler is generic over this so pages can be driven
/// without a network.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn fetch(&self, request: Request) -> Result<Response, HttpError>;
}

impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
    async fn fetch(&self, request: Request) -> Result<Response, HttpError> {
        (**self).fetch(request).await
    }
}

/// Default cap on response bodies (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string.
    pub user_agent: String,
    /// Default request timeout.
    pub timeout: Duration,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Largest response body accepted, in bytes.
    pub max_body_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("CommentKit/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            follow_redirects: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// HTTP client.
pub struct Client {
    config: ClientConfig,
    tls_connector: TlsConnector,
}

impl Client {
    /// Create a new HTTP client with default configuration.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self, HttpError> {
        let native_connector =
            NativeTlsConnector::new().map_err(|e| HttpError::TlsError(e.to_string()))?;

        let tls_connector = TlsConnector::from(native_connector);

        Ok(Self {
            config,
            tls_connector,
        })
    }

    /// Create a client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Send a request, applying its mode's origin rules.
    pub async fn fetch(&self, request: Request) -> Result<Response, HttpError> {
        request.validate()?;

        let cross_origin = request.mode == RequestMode::Cors && request.is_cross_origin();
        let mut headers = request.headers.clone();

        if cross_origin {
            let origin = cors::serialize_origin(request.origin.as_ref());
            let value = HeaderValue::from_str(&origin)
                .map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
            headers.insert(ORIGIN, value);

            if cors::needs_preflight(&request) {
                let preflight = cors::preflight_headers(&request)?;
                debug!(url = %request.url, "CORS preflight");
                let response = self
                    .send(Method::OPTIONS, request.url.clone(), preflight, None, 0)
                    .await?;
                cors::check_preflight(&response, &request)?;
            }
        }

        let response = self
            .send(request.method.clone(), request.url.clone(), headers, request.body.clone(), 0)
            .await?;

        if cross_origin {
            cors::check_response(&response, &request)?;
        }
        Ok(response)
    }

    /// Internal request implementation with redirect counting.
    async fn send(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Bytes>,
        redirect_count: usize,
    ) -> Result<Response, HttpError> {
        if redirect_count > self.config.max_redirects {
            return Err(HttpError::TooManyRedirects);
        }

        let scheme = url.scheme();
        let host = url
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("Missing host".to_string()))?;
        let port = url
            .port_or_known_default()
            .unwrap_or(if scheme == "https" { 443 } else { 80 });

        debug!(method = %method, url = %url, "HTTP request");

        let response = timeout(self.config.timeout, async {
            match scheme {
                "https" => {
                    self.request_https(host, port, &method, &url, &headers, &body)
                        .await
                }
                "http" => {
                    self.request_http(host, port, &method, &url, &headers, &body)
                        .await
                }
                _ => Err(HttpError::UnsupportedScheme(scheme.to_string())),
            }
        })
        .await
        .map_err(|_| HttpError::Timeout)??;

        if self.config.follow_redirects && response.status.is_redirection() {
            if let Some(location) = response.header("location") {
                let redirect_url = url
                    .join(location)
                    .map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
                debug!(from = %url, to = %redirect_url, "Following redirect");

                // 307/308 replay the request; the others turn into a bodiless GET
                let keep_method = matches!(
                    response.status,
                    StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
                );
                let (method, headers, body) = if keep_method || method == Method::HEAD {
                    (method, headers, body)
                } else {
                    let mut headers = headers;
                    headers.remove(CONTENT_TYPE);
                    (Method::GET, headers, None)
                };
                return Box::pin(self.send(method, redirect_url, headers, body, redirect_count + 1))
                    .await;
            }
        }

        Ok(Response {
            status: response.status,
            version: response.version,
            headers: response.headers,
            body: response.body,
            url,
        })
    }

    /// HTTPS request.
    async fn request_https(
        &self,
        host: &str,
        port: u16,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: &Option<Bytes>,
    ) -> Result<RawResponse, HttpError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| HttpError::ConnectionFailed(e.to_string()))?;

        let tls_stream = self
            .tls_connector
            .connect(host, stream)
            .await
            .map_err(|e| HttpError::TlsError(e.to_string()))?;

        self.send_request(tls_stream, method, url, headers, body)
            .await
    }

    /// HTTP request.
    async fn request_http(
        &self,
        host: &str,
        port: u16,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: &Option<Bytes>,
    ) -> Result<RawResponse, HttpError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| HttpError::ConnectionFailed(e.to_string()))?;

        self.send_request(stream, method, url, headers, body).await
    }

    /// Send HTTP request and read response.
    async fn send_request<S>(
        &self,
        stream: S,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: &Option<Bytes>,
    ) -> Result<RawResponse, HttpError>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        let path = if let Some(query) = url.query() {
            format!("{}?{}", url.path(), query)
        } else {
            url.path().to_string()
        };
        let path = if path.is_empty() { "/" } else { &path };
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        let mut request = Vec::new();
        writeln!(request, "{} {} HTTP/1.1\r", method, path)?;
        writeln!(request, "Host: {}\r", host)?;
        writeln!(request, "User-Agent: {}\r", self.config.user_agent)?;
        writeln!(request, "Accept: */*\r")?;
        writeln!(request, "Connection: close\r")?;

        for (name, value) in headers.iter() {
            if let Ok(v) = value.to_str() {
                writeln!(request, "{}: {}\r", name, v)?;
            }
        }

        if let Some(b) = body {
            writeln!(request, "Content-Length: {}\r", b.len())?;
        } else if *method == Method::POST || *method == Method::PUT {
            writeln!(request, "Content-Length: 0\r")?;
        }

        writeln!(request, "\r")?;

        writer.write_all(&request).await?;
        if let Some(b) = body {
            writer.write_all(b).await?;
        }
        writer.flush().await?;

        let mut status_line = String::new();
        reader.read_line(&mut status_line).await?;

        let (version, status) = parse_status_line(&status_line)?;

        let mut response_headers = HeaderMap::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            let line = line.trim();
            if line.is_empty() {
                break;
            }

            if let Some((name, value)) = line.split_once(':') {
                if let (Ok(n), Ok(v)) = (
                    HeaderName::try_from(name.trim()),
                    HeaderValue::try_from(value.trim()),
                ) {
                    response_headers.append(n, v);
                }
            }
        }

        let body = if *method == Method::HEAD
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            Bytes::new()
        } else {
            read_body(&mut reader, &response_headers, self.config.max_body_size).await?
        };

        trace!(status = %status, body_len = body.len(), "Response received");

        Ok(RawResponse {
            status,
            version,
            headers: response_headers,
            body,
        })
    }
}

impl Transport for Client {
    async fn fetch(&self, request: Request) -> Result<Response, HttpError> {
        Client::fetch(self, request).await
    }
}

/// Raw response (before redirect handling).
struct RawResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Client builder for configuring HTTP client.
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set user agent.
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.config.user_agent = user_agent.to_string();
        self
    }

    /// Set timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set redirect policy.
    pub fn redirect(mut self, follow: bool, max: usize) -> Self {
        self.config.follow_redirects = follow;
        self.config.max_redirects = max;
        self
    }

    /// Set the largest response body accepted.
    pub fn max_body_size(mut self, max: usize) -> Self {
        self.config.max_body_size = max;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client, HttpError> {
        Client::with_config(self.config)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse HTTP status line.
fn parse_status_line(line: &str) -> Result<(Version, StatusCode), HttpError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(HttpError::InvalidResponse("Invalid status line".to_string()));
    }

    let version = match parts[0] {
        "HTTP/1.0" => Version::HTTP_10,
        "HTTP/1.1" => Version::HTTP_11,
        "HTTP/2" | "HTTP/2.0" => Version::HTTP_2,
        _ => Version::HTTP_11,
    };

    let status_code: u16 = parts[1]
        .parse()
        .map_err(|_| HttpError::InvalidResponse("Invalid status code".to_string()))?;

    let status = StatusCode::from_u16(status_code)
        .map_err(|_| HttpError::InvalidResponse("Invalid status code".to_string()))?;

    Ok((version, status))
}

/// Read response body based on headers, refusing anything over `limit` bytes.
async fn read_body<R: tokio::io::AsyncBufRead + Unpin>(
    reader: &mut R,
    headers: &HeaderMap,
    limit: usize,
) -> Result<Bytes, HttpError> {
    if let Some(te) = headers.get("transfer-encoding").and_then(|v| v.to_str().ok()) {
        if te.to_lowercase().contains("chunked") {
            return read_chunked_body(reader, limit).await;
        }
    }

    if let Some(len) = headers.get("content-length").and_then(|v| v.to_str().ok()) {
        let len: u64 = len
            .trim()
            .parse()
            .map_err(|_| HttpError::InvalidResponse("Invalid Content-Length".to_string()))?;
        if len > limit as u64 {
            return Err(too_large(limit));
        }
        let mut buf = Vec::with_capacity(len as usize);
        (&mut *reader).take(len).read_to_end(&mut buf).await?;
        if (buf.len() as u64) < len {
            return Err(HttpError::InvalidResponse("Truncated body".to_string()));
        }
        return Ok(Bytes::from(buf));
    }

    // Read until EOF
    let mut buf = Vec::new();
    (&mut *reader).take(limit as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(too_large(limit));
    }
    Ok(Bytes::from(buf))
}

/// Read chunked transfer encoding body.
async fn read_chunked_body<R: tokio::io::AsyncBufRead + Unpin>(
    reader: &mut R,
    limit: usize,
) -> Result<Bytes, HttpError> {
    let mut body = Vec::new();

    loop {
        let mut size_line = String::new();
        if reader.read_line(&mut size_line).await? == 0 {
            return Err(HttpError::InvalidResponse("Truncated chunked body".to_string()));
        }

        // Chunk extensions follow a ';'
        let size_field = size_line.split(';').next().unwrap_or("").trim();
        let size = u64::from_str_radix(size_field, 16)
            .map_err(|_| HttpError::InvalidResponse("Invalid chunk size".to_string()))?;

        if size == 0 {
            let mut trailer = String::new();
            reader.read_line(&mut trailer).await?;
            break;
        }

        if body.len() as u64 + size > limit as u64 {
            return Err(too_large(limit));
        }
        let start = body.len();
        body.resize(start + size as usize, 0);
        reader.read_exact(&mut body[start..]).await?;

        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await?;
        if &crlf != b"\r\n" {
            return Err(HttpError::InvalidResponse("Malformed chunk".to_string()));
        }
    }

    Ok(Bytes::from(body))
}

fn too_large(limit: usize) -> HttpError {
    HttpError::InvalidResponse(format!("Response body exceeds {} bytes", limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_parse_status_line() {
        let (version, status) = parse_status_line("HTTP/1.1 200 OK\r\n").unwrap();
        assert_eq!(version, Version::HTTP_11);
        assert_eq!(status, StatusCode::OK);

        let (version, status) = parse_status_line("HTTP/1.0 404 Not Found").unwrap();
        assert_eq!(version, Version::HTTP_10);
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(parse_status_line("garbage").is_err());
    }

    #[test]
    fn test_client_builder() {
        let client = Client::builder()
            .user_agent("TestAgent/1.0")
            .timeout(Duration::from_secs(10))
            .redirect(true, 5)
            .build()
            .unwrap();

        assert_eq!(client.config.user_agent, "TestAgent/1.0");
        assert_eq!(client.config.timeout, Duration::from_secs(10));
        assert_eq!(client.config.max_redirects, 5);
    }

    #[test]
    fn test_json_request_sets_content_type() {
        let request = Request::new(Method::POST, url("https://api.example/comments"))
            .json(&serde_json::json!({"fields": {"name": "Ada"}}))
            .unwrap();
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            request.body.as_deref(),
            Some(br#"{"fields":{"name":"Ada"}}"#.as_slice())
        );
        assert_eq!(request.mode, RequestMode::Cors);
    }

    #[test]
    fn test_get_with_body_is_invalid() {
        let request = Request::new(Method::GET, url("https://api.example/")).body("x");
        assert!(matches!(
            request.validate(),
            Err(HttpError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_mode_rules() {
        let page = url("https://blog.example/post/").origin();

        let same_origin = Request::new(Method::POST, url("https://api.example/"))
            .origin(page.clone())
            .mode(RequestMode::SameOrigin);
        assert!(same_origin.is_cross_origin());
        assert!(matches!(
            same_origin.validate(),
            Err(HttpError::CorsRejected(_))
        ));

        let no_cors = Request::new(Method::PUT, url("https://api.example/"))
            .mode(RequestMode::NoCors);
        assert!(matches!(no_cors.validate(), Err(HttpError::InvalidRequest(_))));

        let local = Request::new(Method::POST, url("https://blog.example/api")).origin(page);
        assert!(!local.is_cross_origin());
        assert!(local.validate().is_ok());
    }

    #[test]
    fn test_response_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let response = Response {
            status: StatusCode::BAD_REQUEST,
            version: Version::HTTP_11,
            headers,
            body: Bytes::from(r#"{"success":false,"errorCode":"MISSING_FIELD"}"#),
            url: url("https://api.example"),
        };

        assert!(!response.is_success());
        assert_eq!(response.content_type(), Some("application/json"));
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["errorCode"], "MISSING_FIELD");
    }

    #[test]
    fn test_invalid_json_body() {
        let response = Response {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::from("<html>oops</html>"),
            url: url("https://api.example"),
        };
        assert!(matches!(
            response.json::<serde_json::Value>(),
            Err(HttpError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_read_chunked_body() {
        let raw = b"4\r\nWiki\r\n5;ext=1\r\npedia\r\n0\r\n\r\n";
        let mut reader = BufReader::new(&raw[..]);
        let body = read_chunked_body(&mut reader, 1024).await.unwrap();
        assert_eq!(&body[..], b"Wikipedia");
    }

    #[tokio::test]
    async fn test_chunked_body_limits() {
        let raw = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut reader = BufReader::new(&raw[..]);
        assert!(matches!(
            read_chunked_body(&mut reader, 8).await,
            Err(HttpError::InvalidResponse(_))
        ));

        let huge = b"ffffffffffffffff\r\nx";
        let mut reader = BufReader::new(&huge[..]);
        assert!(matches!(
            read_chunked_body(&mut reader, 1024).await,
            Err(HttpError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_chunked_body_is_an_error() {
        let raw = b"4\r\nWiki\r\n5\r\npe";
        let mut reader = BufReader::new(&raw[..]);
        assert!(read_chunked_body(&mut reader, 1024).await.is_err());

        let raw = b"4\r\nWiki";
        let mut reader = BufReader::new(&raw[..]);
        assert!(read_chunked_body(&mut reader, 1024).await.is_err());

        // chunk data running past its declared size
        let raw = b"4\r\nWikipedia\r\n0\r\n\r\n";
        let mut reader = BufReader::new(&raw[..]);
        assert!(matches!(
            read_chunked_body(&mut reader, 1024).await,
            Err(HttpError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_content_length_limits() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("18446744073709551615"));
        let mut reader = BufReader::new(&b"{}"[..]);
        assert!(matches!(
            read_body(&mut reader, &headers, 1024).await,
            Err(HttpError::InvalidResponse(_))
        ));

        headers.insert("content-length", HeaderValue::from_static("10"));
        let mut reader = BufReader::new(&b"{}"[..]);
        assert!(matches!(
            read_body(&mut reader, &headers, 1024).await,
            Err(HttpError::InvalidResponse(_))
        ));

        let mut reader = BufReader::new(&b"0123456789abc"[..]);
        assert_eq!(&read_body(&mut reader, &headers, 1024).await.unwrap()[..], b"0123456789");
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.user_agent.starts_with("CommentKit/"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_redirects, 10);
        assert!(config.follow_redirects);
        assert_eq!(config.max_body_size, DEFAULT_MAX_BODY_SIZE);
    }
}
