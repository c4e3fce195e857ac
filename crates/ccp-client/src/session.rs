//! Session lifecycle against the control plane.
//!
//! A [`Session`] is either unauthenticated (no token) or authenticated (a
//! token plus the time it was acquired). [`login`] performs the only
//! transition into the authenticated state: the login POST must succeed *and*
//! the response must carry a non-empty `X-Auth-Token` header. Anything else
//! is an [`Error::Authentication`], and the caller keeps no token.
//!
//! Whether to log in again is decided by [`Session::needs_login`]: no token,
//! or a token older than the configured expiry.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{AUTH_HEADER, ApiRequest, Transport};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/v3/system/login";

/// Default token lifetime before the client logs in again.
pub const DEFAULT_TOKEN_EXPIRY: Duration = Duration::from_secs(180 * 60);

/// Account credentials, serialized as the login payload.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct Credentials {
    /// Control-plane username.
    pub username: String,
    /// Control-plane password.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An opaque session token and when it was obtained.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    value: String,
    acquired_at: DateTime<Utc>,
}

impl SessionToken {
    /// Wrap a token value.
    pub fn new(value: impl Into<String>, acquired_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            acquired_at,
        }
    }

    /// The token value sent in `X-Auth-Token`.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the token was obtained.
    #[must_use]
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Elapsed time since the token was obtained.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.acquired_at)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// Authentication state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token held.
    Unauthenticated,
    /// A token is held (it may still have expired).
    Authenticated,
}

/// Connection identity for one control plane.
#[derive(Debug, Clone)]
pub struct Session {
    endpoint: Url,
    credentials: Credentials,
    token: Option<SessionToken>,
    expiry: Duration,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new(endpoint: Url, credentials: Credentials) -> Self {
        Self {
            endpoint,
            credentials,
            token: None,
            expiry: DEFAULT_TOKEN_EXPIRY,
        }
    }

    /// Restore a previously persisted token.
    #[must_use]
    pub fn with_token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Override the token expiry threshold.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Control-plane endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Account credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Expiry threshold.
    #[must_use]
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Whether the caller should log in before issuing further requests.
    #[must_use]
    pub fn needs_login(&self, now: DateTime<Utc>) -> bool {
        let Some(token) = &self.token else {
            return true;
        };
        let limit = TimeDelta::from_std(self.expiry).unwrap_or(TimeDelta::MAX);
        token.age(now) >= limit
    }

    /// The token value if one is held and has not expired.
    #[must_use]
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        if self.needs_login(now) {
            return None;
        }
        self.token.as_ref().map(SessionToken::value)
    }

    /// Record a freshly obtained token.
    pub fn authenticate(&mut self, token: SessionToken) {
        self.token = Some(token);
    }

    /// Drop the token.
    pub fn invalidate(&mut self) {
        self.token = None;
    }
}

/// Log in and return the session token from the response header.
///
/// # Errors
///
/// Returns the transport error if the request could not be sent, and
/// [`Error::Authentication`] if the control plane rejected the login or
/// returned no token.
pub async fn login<T: Transport>(transport: &T, credentials: &Credentials) -> Result<SessionToken> {
    info!(username = %credentials.username, "logging in to control plane");

    let request = ApiRequest::post(LOGIN_PATH).json(credentials)?;
    let response = match transport.execute(request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(username = %credentials.username, error = %e, "login request failed");
            return Err(e);
        }
    };

    if !response.is_success() {
        warn!(username = %credentials.username, status = response.status, "login rejected");
        return Err(Error::auth(format!(
            "login rejected with status {}: {}",
            response.status,
            String::from_utf8_lossy(&response.body)
        )));
    }

    match response.auth_token.filter(|token| !token.is_empty()) {
        Some(value) => {
            info!(username = %credentials.username, "logged in");
            Ok(SessionToken::new(value, Utc::now()))
        }
        None => {
            warn!(username = %credentials.username, "login response carried no session token");
            Err(Error::auth(format!("login response carried no {AUTH_HEADER} header")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use reqwest::Method;

    fn session() -> Session {
        let endpoint = Url::parse("https://cp.example.com").expect("url");
        Session::new(endpoint, Credentials::new("admin", "secret"))
    }

    fn minutes(m: i64) -> TimeDelta {
        TimeDelta::minutes(m)
    }

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = session();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.needs_login(Utc::now()));
        assert!(session.valid_token(Utc::now()).is_none());
        assert_eq!(session.expiry(), DEFAULT_TOKEN_EXPIRY);
    }

    #[test]
    fn test_token_older_than_expiry_needs_login() {
        let now = Utc::now();
        let session = session().with_token(SessionToken::new("tok", now - minutes(181)));
        assert_eq!(session.state(), SessionState::Authenticated);
        assert!(session.needs_login(now));
        assert!(session.valid_token(now).is_none());
    }

    #[test]
    fn test_token_within_expiry_is_reused() {
        let now = Utc::now();
        let session = session().with_token(SessionToken::new("tok", now - minutes(179)));
        assert!(!session.needs_login(now));
        assert_eq!(session.valid_token(now), Some("tok"));
    }

    #[test]
    fn test_custom_expiry() {
        let now = Utc::now();
        let session = session()
            .with_expiry(Duration::from_secs(30 * 60))
            .with_token(SessionToken::new("tok", now - minutes(45)));
        assert!(session.needs_login(now));
    }

    #[test]
    fn test_invalidate_drops_token() {
        let mut session = session();
        session.authenticate(SessionToken::new("tok", Utc::now()));
        assert_eq!(session.state(), SessionState::Authenticated);
        session.invalidate();
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let session = session().with_token(SessionToken::new("super-token", Utc::now()));
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("super-token"));
        assert!(debug.contains("admin"));
    }

    #[tokio::test]
    async fn test_login_reads_token_header() {
        let transport = FakeTransport::new().respond_with_token(200, "tok-123");
        let token = login(&transport, &Credentials::new("admin", "secret"))
            .await
            .expect("login");
        assert_eq!(token.value(), "tok-123");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, LOGIN_PATH);
        assert!(requests[0].token.is_none());
        let body: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_deref().expect("body")).expect("json");
        assert_eq!(body["username"], "admin");
        assert_eq!(body["password"], "secret");
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let transport = FakeTransport::new().respond(200, "");
        let err = login(&transport, &Credentials::new("admin", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
    }

    #[tokio::test]
    async fn test_login_with_empty_token_fails() {
        let transport = FakeTransport::new().respond_with_token(200, "");
        let err = login(&transport, &Credentials::new("admin", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
    }

    #[tokio::test]
    async fn test_login_rejected_status_fails() {
        let transport = FakeTransport::new().respond(401, "bad credentials");
        let err = login(&transport, &Credentials::new("admin", "wrong"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad credentials"));
    }

    #[tokio::test]
    async fn test_login_network_error_propagates() {
        let transport = FakeTransport::new().fail(Error::InvalidEndpoint {
            reason: "unreachable".into(),
        });
        let err = login(&transport, &Credentials::new("admin", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }
}
