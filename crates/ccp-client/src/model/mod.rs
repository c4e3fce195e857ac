//! Wire models for the control-plane API.

mod aci;
mod addon;
mod cluster;
mod provider;

pub use aci::AciProfile;
pub use addon::{AddonCatalogue, AddonChart, AddonStatus, InstalledAddon, InstalledAddons};
pub use cluster::{
    Cluster, ClusterStatus, Infra, NetworkPlugin, NetworkPluginDetails, Node, NodePool,
    ScaleRequest, SelfSignedRegistries,
};
pub use provider::{NetworkSubnet, ProviderClientConfig};
