use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use async_trait::async_trait;
use crate::common::error::{ArangoError, Result};
use crate::connection::request::HttpMethod;

/// Credentials attached to every request of a connection
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Basic { username: String, password: String },
    /// Pre-issued superuser JWT
    Bearer(String),
    /// Credentials exchanged for a short-lived JWT at `/_open/auth`
    Jwt { username: String, password: String },
}

impl Auth {
    pub fn username(&self) -> Option<&str> {
        match self {
            Auth::Basic { username, .. } | Auth::Jwt { username, .. } => Some(username),
            Auth::Bearer(_) => None,
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
            Auth::Bearer(_) => write!(f, "Bearer(***)"),
            Auth::Jwt { username, .. } => write!(f, "Jwt({username}, ***)"),
        }
    }
}

/// Fully resolved HTTP request handed to the transport
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub auth: Option<Auth>,
}

/// Raw HTTP response returned by the transport
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status_code: u16) -> Self {
        HttpResponse {
            status_code,
            status_text: String::new(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// Transport used by connections.
///
/// Implementations must tolerate concurrent in-flight requests. Connection
/// level failures should be reported as [`ArangoError::Connection`] so that
/// the caller can fail over to another host.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send_request(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest` backed transport
#[derive(Debug, Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl DefaultHttpClient {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new() -> Result<Self> {
        Self::with_timeout(Self::REQUEST_TIMEOUT)
    }

    pub fn with_timeout(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(DefaultHttpClient { client, request_timeout })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::HEAD => reqwest::Method::HEAD,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        }
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn send_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url)
            .query(&request.params);

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder = match &request.auth {
            Some(Auth::Basic { username, password }) => builder.basic_auth(username, Some(password)),
            Some(Auth::Bearer(token)) => builder.header("authorization", format!("bearer {token}")),
            // the connection swaps credentials for a bearer token before sending
            Some(Auth::Jwt { .. }) | None => builder,
        };

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ArangoError::Connection(format!("bad connection to {}: {}", request.url, e))
            } else {
                ArangoError::Http(e)
            }
        })?;

        let status = resp.status();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_lowercase(), v.to_string())))
            .collect();
        let body = resp.text().await?;

        Ok(HttpResponse {
            status_code: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
