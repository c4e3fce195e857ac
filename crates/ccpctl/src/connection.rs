//! Control-plane connection built from stored defaults.
//!
//! A [`Connection`] owns the client, the defaults it was built from and the
//! store they came from, so a token issued during the run can be written
//! back before the command continues.

use ccp_client::{
    CcpClient, Credentials, HttpTransport, Session, SessionToken, TlsPolicy, Transport,
    TransportOptions, parse_endpoint,
};
use ccp_config::{Defaults, DefaultsStore};
use tracing::{debug, info};

use crate::error::CliError;

/// A client bound to the defaults file it was configured from.
pub struct Connection<T: Transport = HttpTransport> {
    client: CcpClient<T>,
    store: DefaultsStore,
    defaults: Defaults,
}

impl Connection<HttpTransport> {
    /// Build a connection over HTTPS.
    ///
    /// `insecure` forces [`TlsPolicy::AcceptInvalidCerts`] regardless of the
    /// stored setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the control plane is not configured or the
    /// endpoint is unusable.
    pub fn open(store: DefaultsStore, defaults: Defaults, insecure: bool) -> Result<Self, CliError> {
        let session = session_from_defaults(&defaults)?;
        let tls = if insecure || defaults.control_plane.insecure_skip_verify {
            TlsPolicy::AcceptInvalidCerts
        } else {
            TlsPolicy::Verify
        };
        let options = TransportOptions {
            tls,
            ..TransportOptions::default()
        };
        let transport = HttpTransport::new(session.endpoint(), &options)?;
        Ok(Self::assemble(transport, session, store, defaults))
    }
}

impl<T: Transport> Connection<T> {
    /// Build a connection over any transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the control plane is not configured.
    pub fn with_transport(
        transport: T,
        store: DefaultsStore,
        defaults: Defaults,
    ) -> Result<Self, CliError> {
        let session = session_from_defaults(&defaults)?;
        Ok(Self::assemble(transport, session, store, defaults))
    }

    fn assemble(transport: T, session: Session, store: DefaultsStore, defaults: Defaults) -> Self {
        Self {
            client: CcpClient::with_transport(transport, session),
            store,
            defaults,
        }
    }

    /// The client.
    pub fn client(&self) -> &CcpClient<T> {
        &self.client
    }

    /// Defaults the connection was built from, including updates.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Mutable access to the defaults; call [`Connection::save`] to persist.
    pub fn defaults_mut(&mut self) -> &mut Defaults {
        &mut self.defaults
    }

    /// Reuse the stored token while it is fresh, otherwise log in and store
    /// the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if login fails or the new token cannot be saved.
    pub async fn authenticate(&mut self) -> Result<(), CliError> {
        if self.client.ensure_session().await? {
            self.record_token()?;
        } else {
            debug!("stored session token still valid");
        }
        Ok(())
    }

    /// Log in regardless of the stored token and store the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if login fails or the new token cannot be saved.
    pub async fn login(&mut self) -> Result<SessionToken, CliError> {
        let token = self.client.login().await?;
        self.record_token()?;
        Ok(token)
    }

    /// Store the client's token if it differs from the stored one, as after
    /// a re-login while waiting on a cluster. Returns `true` if it was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be written.
    pub fn persist_session(&mut self) -> Result<bool, CliError> {
        let Some(token) = self.client.session_token() else {
            return Ok(false);
        };
        let unchanged = self.defaults.session.as_ref().is_some_and(|stored| {
            stored.token == token.value() && stored.acquired_at == token.acquired_at()
        });
        if unchanged {
            return Ok(false);
        }
        self.record_token()?;
        Ok(true)
    }

    /// Write the defaults back to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<(), CliError> {
        self.store.save(&self.defaults)?;
        Ok(())
    }

    fn record_token(&mut self) -> Result<(), CliError> {
        if let Some(token) = self.client.session_token() {
            self.defaults
                .record_session(token.value(), token.acquired_at());
            self.save()?;
            info!(path = %self.store.path().display(), "stored new session token");
        }
        Ok(())
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("client", &self.client)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Build a session from stored defaults, carrying over a stored token.
fn session_from_defaults(defaults: &Defaults) -> Result<Session, CliError> {
    let cp = defaults.require_control_plane()?;
    let endpoint = parse_endpoint(&cp.url)?;
    let mut session = Session::new(endpoint, Credentials::new(&cp.username, &cp.password))
        .with_expiry(defaults.token_expiry());
    if let Some(stored) = defaults.session.as_ref().filter(|s| !s.token.is_empty()) {
        session = session.with_token(SessionToken::new(stored.token.clone(), stored.acquired_at));
    }
    Ok(session)
}
