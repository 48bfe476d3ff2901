use std::collections::HashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::common::error::Result;
use crate::connection::request::HttpMethod;

/// Decoded API response
#[derive(Debug, Clone)]
pub struct Response {
    pub method: HttpMethod,
    pub url: String,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub status_code: u16,
    pub status_text: String,
    pub raw_body: String,
    pub body: Value,
    pub error_code: Option<u32>,
    pub error_message: Option<String>,
    pub is_success: bool,
}

impl Response {
    /// Build a response from its wire parts. When `deserialize` is set the
    /// body is parsed as JSON; a body that is not JSON is kept as a string.
    pub fn from_parts(
        method: HttpMethod,
        url: String,
        status_code: u16,
        status_text: String,
        headers: HashMap<String, String>,
        raw_body: String,
        deserialize: bool,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        let body = if deserialize {
            serde_json::from_str(&raw_body).unwrap_or_else(|_| Value::String(raw_body.clone()))
        } else {
            Value::String(raw_body.clone())
        };

        let (error_code, error_message) = match &body {
            Value::Object(map) if deserialize => (
                map.get("errorNum").and_then(Value::as_u64).map(|n| n as u32),
                map.get("errorMessage").and_then(Value::as_str).map(str::to_string),
            ),
            _ => (None, None),
        };

        let http_ok = (200..300).contains(&status_code);

        Response {
            method,
            url,
            headers,
            status_code,
            status_text,
            raw_body,
            body,
            error_code,
            error_message,
            is_success: http_ok && error_code.is_none(),
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Deserialize the whole body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Deserialize one top-level field of the body
    pub fn json_field<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.body.get(key).cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Response for one failed item of a bulk request. It keeps the request
    /// details of the parent and takes its error from `body`.
    pub fn bulk_error(&self, body: Value) -> Response {
        Response {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            status_code: self.status_code,
            status_text: self.status_text.clone(),
            raw_body: body.to_string(),
            error_code: body.get("errorNum").and_then(Value::as_u64).map(|n| n as u32),
            error_message: body.get("errorMessage").and_then(Value::as_str).map(str::to_string),
            body,
            is_success: false,
        }
    }

    /// Body as text, for endpoints that do not answer in JSON
    pub fn text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            _ => self.raw_body.clone(),
        }
    }
}
