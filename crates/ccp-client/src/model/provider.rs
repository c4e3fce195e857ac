//! Infrastructure providers and network subnets.

use serde::{Deserialize, Serialize};

/// An infrastructure provider registered with the control plane.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderClientConfig {
    /// Provider UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Provider type, e.g. `vsphere`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    /// Provider name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// vCenter address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// vCenter port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    /// vCenter username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// vCenter password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Skip vCenter certificate verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_skip_verify: Option<bool>,
}

impl std::fmt::Debug for ProviderClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClientConfig")
            .field("id", &self.id)
            .field("provider_type", &self.provider_type)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// A subnet managed by the control plane's network service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSubnet {
    /// Subnet UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// 4 or 6.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<i64>,
    /// Gateway address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
    /// Subnet CIDR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    /// Allocation pools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pools: Option<Vec<String>>,
    /// Network UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// DNS servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
    /// Subnet name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Total addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ips: Option<i64>,
    /// Unallocated addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_ips: Option<i64>,
}
