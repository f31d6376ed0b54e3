//! REST gateway client for the disaster-response API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every server read and mutation goes through `ApiClient::call`. It resolves
//! the endpoint against the API prefix, stamps the identity header from the
//! live session, serializes the body, and classifies the response.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become `ApiError::Status` carrying the parsed error body
//! (or `{}` when the body is not JSON), so callers always have structured
//! context and never crash on a malformed error page. No retries, no caching.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::rc::Rc;

use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::http::{HttpRequest, HttpTransport};
use crate::error::ApiError;
use crate::state::session::SessionReader;

/// Path prefix of the REST API.
pub const API_PREFIX: &str = "/api";
/// Header carrying the acting user.
pub const USER_HEADER: &str = "X-User-ID";

/// Request body as supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Structured value, serialized to JSON on send.
    Json(Value),
    /// Payload the caller already encoded; sent verbatim.
    Prebuilt(String),
}

/// Per-call options. Defaults to a bodyless `GET`.
#[derive(Clone, Debug, PartialEq)]
pub struct CallOptions {
    pub method: Method,
    pub body: Option<Body>,
    /// Extra headers; these win over the defaults on name collision.
    pub headers: Vec<(String, String)>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self { method: Method::GET, body: None, headers: Vec::new() }
    }
}

impl CallOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn post(body: Value) -> Self {
        Self { method: Method::POST, body: Some(Body::Json(body)), headers: Vec::new() }
    }

    #[must_use]
    pub fn put(body: Value) -> Self {
        Self { method: Method::PUT, body: Some(Body::Json(body)), headers: Vec::new() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Resolve an endpoint to a path under the API prefix.
///
/// `/api/x` is kept verbatim, `/x` becomes `/api/x`, and `x` becomes `/api/x`.
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint == API_PREFIX || endpoint.starts_with("/api/") || endpoint.starts_with("/api?") {
        endpoint.to_owned()
    } else if endpoint.starts_with('/') {
        format!("{API_PREFIX}{endpoint}")
    } else {
        format!("{API_PREFIX}/{endpoint}")
    }
}

/// Gateway to the REST API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Rc<dyn HttpTransport>,
    session: SessionReader,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: &str, transport: Rc<dyn HttpTransport>, session: SessionReader) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), transport, session }
    }

    /// Absolute URL for `endpoint`.
    #[must_use]
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, normalize_endpoint(endpoint))
    }

    /// `GET endpoint`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get(&self, endpoint: &str) -> Result<Option<Value>, ApiError> {
        self.call(endpoint, CallOptions::get()).await
    }

    /// Issue one request and classify the outcome.
    ///
    /// Returns `Ok(None)` for 204 or an empty 2xx body, `Ok(Some(json))` for
    /// any other 2xx.
    ///
    /// # Errors
    ///
    /// `Transport` when the server is unreachable, `Status` for non-2xx,
    /// `InvalidBody` when a 2xx body is not JSON, `Encode` when the body
    /// cannot be serialized.
    pub async fn call(&self, endpoint: &str, options: CallOptions) -> Result<Option<Value>, ApiError> {
        let request = self.build_request(endpoint, options)?;
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(%method, %url, "api call");

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(%method, %url, error = %e, "api call failed");
            ApiError::from(e)
        })?;

        if !(200..300).contains(&response.status) {
            let context = serde_json::from_str::<Value>(&response.body).unwrap_or_else(|_| Value::Object(Map::new()));
            warn!(%method, %url, status = response.status, %context, "api call returned error status");
            return Err(ApiError::Status { status: response.status, context });
        }

        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Value>(&response.body)
            .map(Some)
            .map_err(|e| {
                warn!(%method, %url, error = %e, "api response was not JSON");
                ApiError::InvalidBody(e)
            })
    }

    fn build_request(&self, endpoint: &str, options: CallOptions) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![
            ("Content-Type".to_owned(), "application/json".to_owned()),
            (USER_HEADER.to_owned(), self.session.acting_user()),
        ];
        for (name, value) in options.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        let body = match options.body {
            Some(Body::Json(value)) => Some(serde_json::to_string(&value).map_err(ApiError::Encode)?),
            Some(Body::Prebuilt(raw)) => Some(raw),
            None => None,
        };

        Ok(HttpRequest { method: options.method, url: self.url_for(endpoint), headers, body })
    }
}
