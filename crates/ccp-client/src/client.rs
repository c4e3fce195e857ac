//! Authenticated client for the control-plane REST API.

use std::path::Path;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{AciProfile, Cluster, ClusterStatus, NetworkSubnet, ProviderClientConfig, ScaleRequest};
use crate::normalize::{ClusterDefaults, Normalizer, fill_defaults};
use crate::session::{self, Session, SessionToken};
use crate::transport::{ApiRequest, HttpTransport, Transport, TransportOptions};
use crate::validate;
use crate::wait::{self, ClusterApi, WaitConfig};

const CLUSTERS: &str = "/v3/clusters";
const PROVIDERS: &str = "/v3/providers";
const ACI_PROFILES: &str = "/v3/aci-profiles";
const SUBNETS: &str = "/2/network_service/subnets/";

/// Provider looked up by [`CcpClient::create_cluster_basic`].
pub const VSPHERE_PROVIDER: &str = "vsphere";

/// Client for one control plane.
///
/// The session token is shared behind a lock so the client can be used from
/// several tasks; the lock is never held across a request.
pub struct CcpClient<T: Transport = HttpTransport> {
    transport: T,
    session: RwLock<Session>,
    normalizer: Normalizer,
}

impl CcpClient<HttpTransport> {
    /// Build a client with the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(session: Session, options: &TransportOptions) -> Result<Self> {
        let transport = HttpTransport::new(session.endpoint(), options)?;
        Ok(Self::with_transport(transport, session))
    }
}

impl<T: Transport> CcpClient<T> {
    /// Build a client over any transport.
    pub fn with_transport(transport: T, session: Session) -> Self {
        Self {
            transport,
            session: RwLock::new(session),
            normalizer: Normalizer::default(),
        }
    }

    /// Replace the request normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// Current token, expired or not.
    pub fn session_token(&self) -> Option<SessionToken> {
        self.session.read().token().cloned()
    }

    /// Log in unconditionally. On failure the session is left unauthenticated.
    ///
    /// # Errors
    ///
    /// See [`session::login`].
    pub async fn login(&self) -> Result<SessionToken> {
        let credentials = self.session.read().credentials().clone();
        match session::login(&self.transport, &credentials).await {
            Ok(token) => {
                self.session.write().authenticate(token.clone());
                Ok(token)
            }
            Err(e) => {
                self.session.write().invalidate();
                Err(e)
            }
        }
    }

    /// Log in if there is no token or it has expired.
    ///
    /// Returns `true` if a login was performed, so the caller can persist
    /// the new token.
    ///
    /// # Errors
    ///
    /// See [`session::login`].
    pub async fn ensure_session(&self) -> Result<bool> {
        let needs_login = self.session.read().needs_login(Utc::now());
        if !needs_login {
            debug!("reusing session token");
            return Ok(false);
        }
        self.login().await?;
        Ok(true)
    }

    fn current_token(&self) -> Result<String> {
        self.session
            .read()
            .valid_token(Utc::now())
            .map(str::to_owned)
            .ok_or_else(|| Error::auth("no valid session token, log in first"))
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let request = request.token(Some(self.current_token()?));
        self.transport.send(request).await
    }

    pub(crate) async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let body = self.send(ApiRequest::get(path)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn send_json<B, R>(&self, request: ApiRequest, payload: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.send(request.json(payload)?).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    // Clusters

    /// List every cluster.
    pub async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let clusters: Vec<Cluster> = self.get_json(CLUSTERS).await?;
        debug!(count = clusters.len(), "listed clusters");
        Ok(clusters)
    }

    /// Fetch a cluster by UUID.
    pub async fn get_cluster(&self, id: &str) -> Result<Cluster> {
        require_id("cluster id", id)?;
        self.get_json(&format!("{CLUSTERS}/{id}")).await
    }

    /// Find a cluster by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no cluster has that name.
    pub async fn find_cluster(&self, name: &str) -> Result<Cluster> {
        let clusters = self.list_clusters().await?;
        find_named(clusters, "cluster", name, |c| c.name.as_deref())
    }

    /// Status of a cluster found by name. `None` if the record has no status.
    pub async fn cluster_status(&self, name: &str) -> Result<Option<ClusterStatus>> {
        Ok(self.find_cluster(name).await?.status)
    }

    /// Validate, normalize and submit a creation request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] before any request is sent if a required
    /// field is missing.
    pub async fn create_cluster(&self, cluster: Cluster) -> Result<Cluster> {
        let name = cluster.name_or_empty().to_string();
        if let Err(e) = validate::require_fields(&cluster) {
            warn!(cluster = %name, error = %e, "rejecting cluster request");
            return Err(e);
        }
        let cluster = self.normalizer.normalize(cluster);

        info!(cluster = %name, "creating cluster");
        let created: Cluster = self
            .send_json(ApiRequest::post(format!("{CLUSTERS}/")), &cluster)
            .await?;
        info!(cluster = %name, id = ?created.id, "cluster accepted");
        Ok(created)
    }

    /// Create a cluster from a minimal request, filling in the provider,
    /// Kubernetes version, network plugin and pool sizing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a required field is missing or the
    /// Kubernetes version cannot be derived from the master template, and
    /// [`Error::NotFound`] if the control plane has no vSphere provider.
    pub async fn create_cluster_basic(&self, cluster: Cluster) -> Result<Cluster> {
        validate::require_fields(&cluster)?;

        let provider = self.find_provider(VSPHERE_PROVIDER).await?;
        let defaults = ClusterDefaults {
            provider_id: provider.id,
            ..ClusterDefaults::default()
        };
        let cluster = fill_defaults(cluster, &defaults);
        validate::require_kubernetes_version(&cluster)?;

        self.create_cluster(cluster).await
    }

    /// Create a cluster and wait until it leaves `CREATING`.
    ///
    /// # Errors
    ///
    /// See [`wait::create_and_wait`].
    pub async fn create_cluster_and_wait(
        &self,
        cluster: Cluster,
        config: &WaitConfig,
        cancel: &CancellationToken,
    ) -> Result<Cluster> {
        wait::create_and_wait(self, cluster, config, cancel).await
    }

    /// Resize a worker pool.
    pub async fn scale_cluster(&self, id: &str, pool: &str, size: i64) -> Result<Cluster> {
        require_id("cluster id", id)?;
        require_id("node pool", pool)?;
        info!(cluster = %id, pool = %pool, size, "scaling node pool");
        let body = ScaleRequest {
            name: pool.to_string(),
            size,
        };
        self.send_json(
            ApiRequest::patch(format!("{CLUSTERS}/{id}/node-pools/{pool}/")),
            &body,
        )
        .await
    }

    /// Apply a partial update to a cluster.
    pub async fn patch_cluster(&self, id: &str, cluster: &Cluster) -> Result<Cluster> {
        require_id("cluster id", id)?;
        self.send_json(ApiRequest::patch(format!("{CLUSTERS}/{id}/")), cluster)
            .await
    }

    /// Delete a cluster.
    pub async fn delete_cluster(&self, id: &str) -> Result<()> {
        require_id("cluster id", id)?;
        info!(cluster = %id, "deleting cluster");
        self.send(ApiRequest::delete(format!("{CLUSTERS}/{id}/")))
            .await?;
        Ok(())
    }

    // Providers

    /// List infrastructure providers.
    pub async fn list_providers(&self) -> Result<Vec<ProviderClientConfig>> {
        self.get_json(PROVIDERS).await
    }

    /// Fetch a provider by UUID.
    pub async fn get_provider(&self, id: &str) -> Result<ProviderClientConfig> {
        require_id("provider id", id)?;
        self.get_json(&format!("{PROVIDERS}/{id}")).await
    }

    /// Find a provider by name.
    pub async fn find_provider(&self, name: &str) -> Result<ProviderClientConfig> {
        let providers = self.list_providers().await?;
        find_named(providers, "provider", name, |p| p.name.as_deref())
    }

    /// Register a provider.
    pub async fn add_provider(&self, provider: &ProviderClientConfig) -> Result<ProviderClientConfig> {
        self.send_json(ApiRequest::post(format!("{PROVIDERS}/")), provider)
            .await
    }

    /// Update a provider.
    pub async fn patch_provider(
        &self,
        id: &str,
        provider: &ProviderClientConfig,
    ) -> Result<ProviderClientConfig> {
        require_id("provider id", id)?;
        self.send_json(ApiRequest::patch(format!("{PROVIDERS}/{id}/")), provider)
            .await
    }

    /// Remove a provider.
    pub async fn delete_provider(&self, id: &str) -> Result<()> {
        require_id("provider id", id)?;
        self.send(ApiRequest::delete(format!("{PROVIDERS}/{id}/")))
            .await?;
        Ok(())
    }

    // Subnets

    /// List subnets managed by the network service.
    pub async fn list_subnets(&self) -> Result<Vec<NetworkSubnet>> {
        self.get_json(SUBNETS).await
    }

    /// Find a subnet by name.
    pub async fn find_subnet(&self, name: &str) -> Result<NetworkSubnet> {
        let subnets = self.list_subnets().await?;
        find_named(subnets, "subnet", name, |s| s.name.as_deref())
    }

    // ACI profiles

    /// List ACI profiles.
    pub async fn list_aci_profiles(&self) -> Result<Vec<AciProfile>> {
        self.get_json(ACI_PROFILES).await
    }

    /// Find an ACI profile by name.
    pub async fn find_aci_profile(&self, name: &str) -> Result<AciProfile> {
        let profiles = self.list_aci_profiles().await?;
        find_named(profiles, "ACI profile", name, |p| p.name.as_deref())
    }

    /// Create an ACI profile.
    pub async fn add_aci_profile(&self, profile: &AciProfile) -> Result<AciProfile> {
        self.send_json(ApiRequest::post(format!("{ACI_PROFILES}/")), profile)
            .await
    }

    /// Update an ACI profile.
    pub async fn patch_aci_profile(&self, id: &str, profile: &AciProfile) -> Result<AciProfile> {
        require_id("ACI profile id", id)?;
        self.send_json(ApiRequest::patch(format!("{ACI_PROFILES}/{id}/")), profile)
            .await
    }

    /// Delete an ACI profile.
    pub async fn delete_aci_profile(&self, id: &str) -> Result<()> {
        require_id("ACI profile id", id)?;
        self.send(ApiRequest::delete(format!("{ACI_PROFILES}/{id}/")))
            .await?;
        Ok(())
    }
}

impl<T: Transport> ClusterApi for CcpClient<T> {
    async fn create_cluster(&self, cluster: Cluster) -> Result<Cluster> {
        CcpClient::create_cluster(self, cluster).await
    }

    async fn find_cluster(&self, name: &str) -> Result<Cluster> {
        // Polling can outlive the token the wait started with.
        self.ensure_session().await?;
        CcpClient::find_cluster(self, name).await
    }
}

#[cfg(test)]
impl CcpClient<crate::testing::FakeTransport> {
    pub(crate) fn transport_requests(&self) -> Vec<ApiRequest> {
        self.transport.requests()
    }
}

impl<T: Transport> std::fmt::Debug for CcpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CcpClient")
            .field("session", &*self.session.read())
            .finish_non_exhaustive()
    }
}

/// Read a cluster request from a JSON file.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read and a JSON error if it is
/// not a cluster document.
pub async fn cluster_from_file(path: impl AsRef<Path>) -> Result<Cluster> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading cluster request");
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) fn require_id(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Validation {
            field: field.to_string(),
            reason: "is required".to_string(),
        });
    }
    Ok(())
}

fn find_named<R>(
    items: Vec<R>,
    kind: &'static str,
    name: &str,
    name_of: impl Fn(&R) -> Option<&str>,
) -> Result<R> {
    items
        .into_iter()
        .find(|item| name_of(item) == Some(name))
        .ok_or_else(|| Error::NotFound {
            kind,
            name: name.to_string(),
        })
}
