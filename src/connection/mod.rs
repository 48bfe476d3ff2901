pub mod http;
pub mod request;
pub mod resolver;
pub mod response;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use crate::common::error::{ArangoError, ErrorCode, ErrorKind, Result};

pub use http::{Auth, DefaultHttpClient, HttpClient, HttpRequest, HttpResponse};
pub use request::{HttpMethod, Request, RequestBody};
pub use resolver::{HostResolver, ResolverKind};
pub use response::Response;

/// Issuer ArangoDB puts in the tokens it hands out
const JWT_ISSUER: &str = "arangodb";

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// Token obtained from `/_open/auth`
struct JwtToken {
    token: String,
    exp: i64,
}

/// Read the claims of a server-issued token. The signing secret is unknown
/// to clients, so only the registered claims are checked.
fn decode_claims(token: &str) -> Result<JwtClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.set_issuer(&[JWT_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iat", "iss"]);
    let data = jsonwebtoken::decode::<JwtClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

struct ConnectionInner {
    url_prefixes: Vec<String>,
    resolver: HostResolver,
    http: Arc<dyn HttpClient>,
    db_name: String,
    auth: Option<Auth>,
    token: RwLock<Option<JwtToken>>,
}

/// Connection to one ArangoDB database.
///
/// Cloning is cheap; clones share the transport, the host resolver and the
/// JWT of a [`Auth::Jwt`] connection.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    pub fn new(
        hosts: &[String],
        resolver: HostResolver,
        http: Arc<dyn HttpClient>,
        db_name: impl Into<String>,
        auth: Option<Auth>,
    ) -> Self {
        let db_name = db_name.into();
        let url_prefixes = hosts
            .iter()
            .map(|host| format!("{}/_db/{}", host.trim_end_matches('/'), db_name))
            .collect();

        Connection {
            inner: Arc::new(ConnectionInner {
                url_prefixes,
                resolver,
                http,
                db_name,
                auth,
                token: RwLock::new(None),
            }),
        }
    }

    pub fn db_name(&self) -> &str {
        &self.inner.db_name
    }

    pub fn username(&self) -> Option<&str> {
        self.inner.auth.as_ref().and_then(Auth::username)
    }

    pub fn url_prefixes(&self) -> &[String] {
        &self.inner.url_prefixes
    }

    fn uses_jwt(&self) -> bool {
        matches!(self.inner.auth, Some(Auth::Jwt { .. }))
    }

    /// Expiry (UNIX seconds) of the current JWT, if one was obtained
    pub fn token_expiry(&self) -> Option<i64> {
        self.inner.token.read().as_ref().map(|token| token.exp)
    }

    /// Send a request. A JWT connection whose token the server rejects
    /// (HTTP 401, error 11) fetches a new token and sends the request again.
    pub async fn send_request(&self, request: &Request) -> Result<Response> {
        let resp = self.process_request(request).await?;
        if !self.uses_jwt()
            || resp.status_code != 401
            || resp.error_code != Some(ErrorCode::Forbidden.as_u32())
        {
            return Ok(resp);
        }

        tracing::debug!("token rejected by {}, refreshing", resp.url);
        self.refresh_token().await?;
        self.process_request(request).await
    }

    /// Exchange the connection credentials for a new JWT
    pub async fn refresh_token(&self) -> Result<()> {
        let Some(Auth::Jwt { username, password }) = &self.inner.auth else {
            return Err(ArangoError::client(
                ErrorKind::JwtAuth,
                "connection does not use JWT authentication",
            ));
        };

        let request = Request::post("/_open/auth")
            .with_json(json!({ "username": username, "password": password }));
        let resp = self.process_request(&request).await?;
        if !resp.is_success {
            return Err(ArangoError::server(ErrorKind::JwtAuth, &resp));
        }

        let token: String = resp.json_field("jwt")?;
        let claims = decode_claims(&token)?;
        tracing::debug!("obtained JWT for {} expiring at {}", username, claims.exp);
        *self.inner.token.write() = Some(JwtToken { token, exp: claims.exp });
        Ok(())
    }

    /// Send a request, failing over between hosts on connection errors
    async fn process_request(&self, request: &Request) -> Result<Response> {
        let resolver = &self.inner.resolver;
        let host_count = self.inner.url_prefixes.len();
        if host_count == 0 {
            return Err(ArangoError::Connection("no hosts configured".to_string()));
        }
        let mut filter: HashSet<usize> = HashSet::new();
        let mut host_index = resolver.get_host_index(&filter) % host_count;
        let mut tries = 0;

        while tries < resolver.max_tries() {
            let url = format!("{}{}", self.inner.url_prefixes[host_index], request.endpoint);
            let started = Instant::now();

            let failure = match self.inner.http.send_request(self.http_request(request, &url)).await {
                Ok(raw) => {
                    let resp = Response::from_parts(
                        request.method,
                        url.clone(),
                        raw.status_code,
                        raw.status_text,
                        raw.headers,
                        raw.body,
                        request.deserialize,
                    );
                    tracing::debug!(
                        "{} {} -> {} ({:?})",
                        request.method,
                        url,
                        resp.status_code,
                        started.elapsed()
                    );
                    if resp.status_code == 503 && resp.error_code == Some(503) && request.failover {
                        format!("service unavailable at {}", url)
                    } else {
                        return Ok(resp);
                    }
                }
                Err(ArangoError::Connection(message)) if request.failover => message,
                Err(e) => return Err(e),
            };

            tracing::warn!("request to {} failed: {}", url, failure);

            if host_count > 1 {
                if filter.len() == host_count - 1 {
                    filter.clear();
                }
                filter.insert(host_index);
                host_index = resolver.get_host_index(&filter) % host_count;
            }
            tries += 1;
        }

        Err(ArangoError::Connection(format!(
            "can't connect to host(s) within limit ({})",
            resolver.max_tries()
        )))
    }

    /// Check that the server is reachable and accepts the credentials
    pub async fn ping(&self) -> Result<u16> {
        let request = Request::get("/_api/collection");
        let resp = self.send_request(&request).await?;
        if resp.status_code == 401 || resp.status_code == 403 {
            return Err(ArangoError::client(
                ErrorKind::ServerConnection,
                "bad username and/or password",
            ));
        }
        if !resp.is_success {
            return Err(ArangoError::client(
                ErrorKind::ServerConnection,
                resp.error_message.unwrap_or_else(|| "bad server response".to_string()),
            ));
        }
        Ok(resp.status_code)
    }

    fn http_request(&self, request: &Request, url: &str) -> HttpRequest {
        let auth = match &self.inner.auth {
            Some(Auth::Jwt { .. }) => self
                .inner
                .token
                .read()
                .as_ref()
                .map(|token| Auth::Bearer(token.token.clone())),
            other => other.clone(),
        };
        HttpRequest {
            method: request.method,
            url: url.to_string(),
            params: request.params.clone(),
            headers: request.headers.clone(),
            body: request.data.as_ref().map(RequestBody::to_wire),
            auth,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("db_name", &self.inner.db_name)
            .field("url_prefixes", &self.inner.url_prefixes)
            .field("auth", &self.inner.auth)
            .finish()
    }
}
