//! The authenticated request pipeline.
//!
//! Every outbound call goes through [`ApiClient::send`]: the current session
//! is fetched, a bearer header is attached when a token exists, and a 401
//! answer triggers a single silent session re-fetch plus exactly one retry
//! of the identical request. A second failure of any kind propagates
//! unchanged.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ApiError;
use crate::session::SessionProvider;

/// An API request as an explicit value.
///
/// The retry path rebuilds the outbound request from this same value, so the
/// reissued call carries the original method, path, query, and body
/// verbatim; only the `Authorization` header differs.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Start a request with an arbitrary method.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Start a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Start a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Start a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body fails to serialize.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request path, relative to the client's base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A successful (2xx) API response.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body is not valid JSON of the
    /// expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Authenticated HTTP client for the storefront API.
///
/// The "already retried" state is a local of each [`Self::send`] call, never
/// shared: concurrent requests each get their own independent one-retry
/// budget. The client imposes no timeout or abort semantics of its own
/// beyond what the transport provides.
pub struct ApiClient<P: SessionProvider> {
    http: reqwest::Client,
    base_url: Url,
    provider: P,
}

impl<P: SessionProvider> ApiClient<P> {
    /// Create a client over a base URL and a session source.
    #[must_use]
    pub fn new(base_url: Url, provider: P) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            provider,
        }
    }

    /// The session provider backing this client.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Send a request through the authenticated pipeline.
    ///
    /// # Errors
    ///
    /// - [`ApiError::SessionLookup`] if the session fetch fails; the request
    ///   is never sent.
    /// - [`ApiError::Status`] for non-success responses, including a 401
    ///   that survives the single retry.
    /// - [`ApiError::Transport`] for connection-level failures.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let session = self
            .provider
            .current_session()
            .await
            .map_err(ApiError::SessionLookup)?;
        let mut token = session.map(|s| s.access_token);

        // Per-request retry budget: at most one reissue, no matter how many
        // times 401 recurs.
        let mut retried = false;

        loop {
            let response = self.dispatch(request, token.as_deref()).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                // Silent session re-fetch; if it fails or yields no token,
                // the 401 below propagates as the original failure.
                match self.provider.current_session().await {
                    Ok(Some(fresh)) => {
                        debug!("Retrying once with refreshed token");
                        token = Some(fresh.access_token);
                        continue;
                    }
                    Ok(None) => debug!("No session after re-fetch, propagating 401"),
                    Err(e) => warn!("Session re-fetch failed, propagating 401: {e}"),
                }
            }

            if status.is_success() {
                let body = response.bytes().await?.to_vec();
                return Ok(ApiResponse { status, body });
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
    }

    /// GET a path and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`]; additionally [`ApiError::Decode`] if the body is
    /// not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(&ApiRequest::get(path)).await?.json()
    }

    /// POST a JSON body to a path and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// See [`Self::send`]; additionally [`ApiError::Decode`] if either body
    /// fails to (de)serialize.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        self.send(&ApiRequest::post(path).json(body)?).await?.json()
    }

    /// Build and fire one attempt from the request value.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.base_url.join(&request.path)?;
        let mut builder = self.http.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.send().await?)
    }
}
