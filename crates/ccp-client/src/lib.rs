//! # ccp-client
//!
//! Client for the cluster control-plane REST API.
//!
//! ## Features
//!
//! - [`Session`] and [`login`]: token acquisition and expiry tracking
//! - [`Normalizer`] and [`fill_defaults`]: creation requests shaped the way
//!   the control plane accepts them
//! - [`create_and_wait`]: submit a cluster and poll until it leaves `CREATING`
//! - [`CcpClient`]: clusters, providers, subnets, ACI profiles and add-ons
//!
//! ## Example
//!
//! ```rust,no_run
//! use ccp_client::{CcpClient, Credentials, Session, TransportOptions, parse_endpoint};
//!
//! # async fn run() -> ccp_client::Result<()> {
//! let endpoint = parse_endpoint("https://10.10.20.110")?;
//! let session = Session::new(endpoint, Credentials::new("admin", "password"));
//! let client = CcpClient::connect(session, &TransportOptions::default())?;
//! client.ensure_session().await?;
//!
//! for cluster in client.list_clusters().await? {
//!     println!("{}", cluster.name_or_empty());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod addon;
pub mod client;
pub mod error;
pub mod model;
pub mod normalize;
pub mod session;
pub mod transport;
pub mod validate;
pub mod wait;

#[cfg(test)]
mod testing;

pub use addon::Addon;
pub use client::{CcpClient, VSPHERE_PROVIDER, cluster_from_file};
pub use error::{Error, Result};
pub use model::{
    AciProfile, AddonCatalogue, AddonChart, Cluster, ClusterStatus, Infra, InstalledAddons,
    NetworkPlugin, NetworkSubnet, NodePool, ProviderClientConfig,
};
pub use normalize::{
    ClusterDefaults, Normalizer, PluginCorrection, derive_kubernetes_version, fill_defaults,
    normalize,
};
pub use session::{Credentials, Session, SessionState, SessionToken, login};
pub use transport::{HttpTransport, TlsPolicy, Transport, TransportOptions, parse_endpoint};
pub use wait::{ClusterApi, WaitConfig, create_and_wait};

/// Cancellation handle accepted by [`create_and_wait`].
pub use tokio_util::sync::CancellationToken;
