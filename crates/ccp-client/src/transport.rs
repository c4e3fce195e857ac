//! HTTP transport to the control plane.
//!
//! Every request carries a JSON content type and, once logged in, the session
//! token in the `X-Auth-Token` header. A response is successful only when its
//! status is in [`SUCCESS_STATUS_CODES`]; anything else becomes
//! [`Error::Transport`] carrying the raw body, because the control plane
//! reports failures as plain text rather than a structured error schema.
//!
//! The [`Transport`] trait is the seam the rest of the crate is written
//! against. [`HttpTransport`] is the reqwest-backed implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};

/// Header carrying the session token, both on login responses and requests.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Status codes treated as success.
pub const SUCCESS_STATUS_CODES: [u16; 4] = [200, 201, 202, 204];

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How the transport treats the control plane's TLS certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Verify the certificate chain.
    #[default]
    Verify,
    /// Accept any certificate. Control planes are commonly deployed with
    /// self-signed certificates; this must be chosen explicitly.
    AcceptInvalidCerts,
}

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Certificate verification policy.
    pub tls: TlsPolicy,
    /// Timeout applied to each request.
    pub request_timeout: Duration,
    /// Honor `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY`.
    pub proxy_from_env: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            tls: TlsPolicy::Verify,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            proxy_from_env: true,
        }
    }
}

/// A request to the control plane, relative to the endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path including the API version prefix, e.g. `/v3/clusters`.
    pub path: String,
    /// Encoded JSON body.
    pub body: Option<Vec<u8>>,
    /// Session token to attach.
    pub token: Option<String>,
}

impl ApiRequest {
    /// Create a request without a body or token.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            token: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Shorthand for a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Shorthand for a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Encode `body` as the JSON payload.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Use already-encoded bytes as the payload.
    #[must_use]
    pub fn raw_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a session token.
    #[must_use]
    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// A response from the control plane, before status mapping.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `X-Auth-Token` response header, if present.
    pub auth_token: Option<String>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Whether the status is in the success allow-list.
    #[must_use]
    pub fn is_success(&self) -> bool {
        SUCCESS_STATUS_CODES.contains(&self.status)
    }

    /// Return the body on success, otherwise an error wrapping the body.
    pub fn into_body(self, method: &Method, path: &str) -> Result<Vec<u8>> {
        if self.is_success() {
            return Ok(self.body);
        }
        Err(Error::Transport {
            method: method.to_string(),
            path: path.to_string(),
            status: self.status,
            body: String::from_utf8_lossy(&self.body).into_owned(),
        })
    }
}

/// Sends requests to the control plane.
pub trait Transport: Send + Sync {
    /// Send a request and return the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only if the request could not be sent or the
    /// response could not be read.
    fn execute(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse>> + Send;

    /// Send a request and map non-success statuses to [`Error::Transport`].
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let method = request.method.clone();
            let path = request.path.clone();
            let response = self.execute(request).await?;
            response.into_body(&method, &path)
        }
    }
}

/// Parse and check a control-plane endpoint URL.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).map_err(|e| Error::InvalidEndpoint {
        reason: format!("{endpoint}: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidEndpoint {
            reason: format!("{endpoint}: unsupported scheme '{other}', expected http or https"),
        }),
    }
}

/// reqwest-backed transport with a shared cookie store.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: &Url, options: &TransportOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(options.request_timeout)
            .user_agent(concat!("ccp-client/", env!("CARGO_PKG_VERSION")));

        if !options.proxy_from_env {
            builder = builder.no_proxy();
        }
        if options.tls == TlsPolicy::AcceptInvalidCerts {
            warn!(endpoint = %endpoint, "TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let ApiRequest {
            method,
            path,
            body,
            token,
        } = request;
        let url = self.url_for(&path);
        debug!(method = %method, url = %url, "sending request");

        let mut builder = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTH_HEADER, token);
        }
        if let Some(body) = body {
            trace!(payload = %String::from_utf8_lossy(&body), "request body");
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let auth_token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();
        trace!(status, payload = %String::from_utf8_lossy(&body), "response body");

        Ok(ApiResponse {
            status,
            auth_token,
            body,
        })
    }
}
