//! ACI profiles used by clusters running the `contiv-aci` plugin.

use serde::{Deserialize, Serialize};

/// An ACI fabric profile.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AciProfile {
    /// Profile UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Profile name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// APIC hosts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apic_hosts: Option<String>,
    /// APIC username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apic_username: Option<String>,
    /// APIC password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apic_password: Option<String>,
    /// VMM domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aci_vmm_domain_name: Option<String>,
    /// Infra VLAN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aci_infra_vlan_id: Option<i64>,
    /// VRF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_name: Option<String>,
    /// L3Out policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l3_outside_policy_name: Option<String>,
    /// L3Out network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l3_outside_network_name: Option<String>,
    /// Attachable entity profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aaep_name: Option<String>,
    /// DNS servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
    /// Contract for control-plane traffic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_contract_name: Option<String>,
    /// First node VLAN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_vlan_start: Option<i64>,
    /// Last node VLAN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_vlan_end: Option<i64>,
    /// First pod subnet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_subnet_start: Option<String>,
    /// First service subnet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_subnet_start: Option<String>,
    /// Multicast range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast_range: Option<String>,
    /// ACI tenant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aci_tenant: Option<String>,
}

impl std::fmt::Debug for AciProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AciProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("apic_hosts", &self.apic_hosts)
            .field("apic_username", &self.apic_username)
            .field("apic_password", &self.apic_password.as_ref().map(|_| "<redacted>"))
            .field("aci_tenant", &self.aci_tenant)
            .finish_non_exhaustive()
    }
}
