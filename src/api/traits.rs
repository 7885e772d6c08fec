//! Transport abstraction for the work item tracking REST API.
//!
//! Clients only ever talk to the server through [`Transport`], which enables:
//! - Mocking for unit tests
//! - Alternative implementations (proxies, recorded sessions)
//! - Testing the async client code without a network

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::credential::PatCredential;
use crate::error::{ConfigError, Result, TfsError};

/// Query string parameters, in the order they are sent.
pub type QueryParams = Vec<(String, String)>;

/// Request/response capability the clients are built on.
///
/// Paths are relative to the server base URL. Implementations return the parsed
/// JSON body, [`Value::Null`] for an empty body, and an error for non-2xx statuses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a GET request.
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value>;

    /// Sends a POST request with a JSON body.
    async fn post(
        &self,
        path: &str,
        body: &Value,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value>;

    /// Sends a PATCH request with a JSON body.
    async fn patch(
        &self,
        path: &str,
        body: &Value,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value>;
}

/// [`Transport`] over HTTPS with PAT authentication.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server URL, e.g. `https://tfs.example.com/tfs`
    /// * `credential` - PAT sent as Basic auth on every request
    /// * `verify_ssl` - When false, invalid certificates are accepted
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: &str,
        credential: &PatCredential,
        verify_ssl: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&credential.authorization_header())
            .map_err(|_| TfsError::validation("PAT contains characters not allowed in a header"))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_ssl)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Base URL every request path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TfsError::validation(format!("invalid request path '{path}': {e}")))?;

        debug!(method = %method, url = %url, "sending request");

        let mut request = self.client.request(method.clone(), url.clone()).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            return Err(TfsError::Transport {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| TfsError::NotJson {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        self.send(Method::GET, path, None, query, headers).await
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        self.send(Method::POST, path, Some(body), query, headers).await
    }

    async fn patch(
        &self,
        path: &str,
        body: &Value,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        self.send(Method::PATCH, path, Some(body), query, headers).await
    }
}

/// Parses the server URL and makes sure it ends with a slash so relative paths
/// are appended rather than replacing the last segment.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    Url::parse(&normalized).map_err(|e| {
        ConfigError::InvalidValue {
            field: "server_url".to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
