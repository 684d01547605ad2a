//! Wire-level transport seam.

use async_trait::async_trait;
use refetch_core::{ClientConfig, ClientError, Method, TransportErrorKind};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

/// One request as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the configured base URL, query string included.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw transport result: status plus the decoded JSON body, if there was one.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub json: Option<Value>,
}

impl HttpResponse {
    pub fn new(status: u16, json: Option<Value>) -> Self {
        Self { status, json }
    }

    pub fn ok(json: Value) -> Self {
        Self::new(200, Some(json))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request over the wire.
///
/// Implementations report connectivity and decoding problems as
/// [`ClientError::Transport`]; any HTTP status, including errors, is a
/// successful transport result.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// Production transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let url = self.url(&request.path);
        let headers = build_headers(&request.headers)?;

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if status == reqwest::StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(HttpResponse::new(status.as_u16(), None));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(json) => Ok(HttpResponse::new(status.as_u16(), Some(json))),
            Err(err) if status.is_success() => Err(ClientError::decode(format!(
                "invalid JSON in {} response: {}",
                status.as_u16(),
                err
            ))),
            // Error pages are often HTML; the status alone carries the failure.
            Err(_) => Ok(HttpResponse::new(status.as_u16(), None)),
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn build_headers(pairs: &[(String, String)]) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidInput(format!("header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidInput(format!("header value for {}: {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else if err.is_decode() || err.is_body() {
        TransportErrorKind::Decode
    } else {
        TransportErrorKind::Other
    };
    ClientError::transport(kind, err.to_string())
}
