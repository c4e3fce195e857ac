//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`login`] - Session token acquisition
//! - [`config`] - Stored defaults
//! - [`cluster`] - Cluster lifecycle
//! - [`lookup`] - Providers, subnets and ACI profiles
//! - [`addon`] - Cluster add-ons

pub mod addon;
pub mod cluster;
pub mod config;
pub mod login;
pub mod lookup;

pub use addon::AddonCommand;
pub use cluster::ClusterCommand;
pub use config::ConfigCommand;
pub use login::LoginCommand;
pub use lookup::{LookupCommand, Resource};

use ccp_client::{CcpClient, Transport};
use ccp_config::Defaults;

use crate::error::CliError;

/// The named cluster, or the stored default cluster.
pub(crate) fn cluster_name(explicit: Option<&str>, defaults: &Defaults) -> Result<String, CliError> {
    match explicit {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ if !defaults.infra.cluster.is_empty() => Ok(defaults.infra.cluster.clone()),
        _ => Err(CliError::invalid(
            "no cluster named and no default cluster set (ccpctl config set --cluster <name>)",
        )),
    }
}

/// Look a cluster up by name and return its id.
pub(crate) async fn cluster_id<T: Transport>(
    client: &CcpClient<T>,
    name: &str,
) -> Result<String, CliError> {
    client
        .find_cluster(name)
        .await?
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CliError::invalid(format!("cluster {name} has no id")))
}
