use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query parameter value. Booleans are sent as `1`/`0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue(String);

impl ParamValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue(if value { "1" } else { "0" }.to_string())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue(value.clone())
    }
}

macro_rules! numeric_param {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                ParamValue(value.to_string())
            }
        })*
    };
}

numeric_param!(i32, i64, u32, u64, usize, f64);

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
}

impl RequestBody {
    pub fn to_wire(&self) -> String {
        match self {
            RequestBody::Json(value) => value.to_string(),
            RequestBody::Text(text) => text.clone(),
        }
    }
}

/// API request, relative to the database URL prefix
#[derive(Debug, Clone)]
pub struct Request {
    pub method: HttpMethod,
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub data: Option<RequestBody>,
    /// Parse the response body as JSON
    pub deserialize: bool,
    /// Resend to another host when the server is unavailable
    pub failover: bool,
}

impl Request {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("charset".to_string(), "utf-8".to_string());
        headers.insert("content-type".to_string(), "application/json".to_string());

        Request {
            method,
            endpoint: endpoint.into(),
            headers,
            params: BTreeMap::new(),
            data: None,
            deserialize: true,
            failover: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::DELETE, endpoint)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into().0);
        self
    }

    /// Add a parameter only when a value is present
    pub fn with_opt_param<V: Into<ParamValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    pub fn with_json(mut self, data: Value) -> Self {
        self.data = Some(RequestBody::Json(data));
        self
    }

    pub fn with_text(mut self, data: impl Into<String>) -> Self {
        self.data = Some(RequestBody::Text(data.into()));
        self
    }

    pub fn raw_response(mut self) -> Self {
        self.deserialize = false;
        self
    }

    /// Send at most once, for requests the server may act on before
    /// reporting itself unavailable
    pub fn without_failover(mut self) -> Self {
        self.failover = false;
        self
    }

    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers.get(&key.to_lowercase())
    }

    pub fn get_param(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }
}
