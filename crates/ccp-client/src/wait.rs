//! Synchronous cluster creation: submit, then poll until the cluster leaves
//! `CREATING`.
//!
//! Polling starts after [`WaitConfig::initial_delay`] and re-fetches the
//! cluster by name every [`WaitConfig::poll_interval`]. The first record whose
//! status is anything other than `CREATING` (including no status at all) is
//! returned as-is; the caller decides whether that status is a success. The
//! wait is bounded by [`WaitConfig::timeout`] and can be aborted through a
//! [`CancellationToken`].

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::Cluster;

/// Cluster operations the orchestrator needs.
pub trait ClusterApi: Send + Sync {
    /// Submit a creation request and return the record the control plane accepted.
    fn create_cluster(&self, cluster: Cluster) -> impl Future<Output = Result<Cluster>> + Send;

    /// Fetch the current record for a cluster by name.
    fn find_cluster(&self, name: &str) -> impl Future<Output = Result<Cluster>> + Send;
}

/// Polling cadence and limits.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between submission and the first status check.
    pub initial_delay: Duration,
    /// Delay between status checks.
    pub poll_interval: Duration,
    /// Maximum time spent polling (None = wait forever).
    pub timeout: Option<Duration>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(10),
            poll_interval: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl WaitConfig {
    /// Default cadence with a different timeout.
    #[must_use]
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Submit `cluster` and block until it is no longer creating.
///
/// # Errors
///
/// Returns the submission or fetch error as soon as one occurs,
/// [`Error::Timeout`] when the maximum wait elapses, and [`Error::Cancelled`]
/// when `cancel` fires.
pub async fn create_and_wait<A: ClusterApi>(
    api: &A,
    cluster: Cluster,
    config: &WaitConfig,
    cancel: &CancellationToken,
) -> Result<Cluster> {
    let name = match cluster.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::missing("name")),
    };

    info!(cluster = %name, "submitting cluster");
    let submitted = api.create_cluster(cluster).await?;
    debug!(cluster = %name, id = ?submitted.id, "cluster accepted, waiting for provisioning");

    let poll = poll_until_settled(api, &name, config, cancel);
    match config.timeout {
        Some(limit) => tokio::time::timeout(limit, poll).await.map_err(|_| {
            warn!(cluster = %name, waited = ?limit, "gave up waiting for cluster");
            Error::Timeout {
                cluster: name.clone(),
                waited: limit,
            }
        })?,
        None => poll.await,
    }
}

async fn poll_until_settled<A: ClusterApi>(
    api: &A,
    name: &str,
    config: &WaitConfig,
    cancel: &CancellationToken,
) -> Result<Cluster> {
    pause(config.initial_delay, name, cancel).await?;

    let mut checks: u32 = 0;
    loop {
        let cluster = api.find_cluster(name).await?;
        checks += 1;

        if !cluster.is_creating() {
            info!(
                cluster = %name,
                status = cluster.status.as_ref().map_or("<none>", |s| s.as_str()),
                checks,
                "cluster provisioning finished"
            );
            return Ok(cluster);
        }

        debug!(cluster = %name, checks, "cluster still creating");
        pause(config.poll_interval, name, cancel).await?;
    }
}

async fn pause(duration: Duration, name: &str, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        () = cancel.cancelled() => {
            info!(cluster = %name, "wait cancelled");
            Err(Error::Cancelled { cluster: name.to_string() })
        }
        () = tokio::time::sleep(duration) => Ok(()),
    }
}
