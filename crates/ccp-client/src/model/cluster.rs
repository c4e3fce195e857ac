//! Cluster records, shared by creation requests and API responses.
//!
//! Every field is optional and skipped when `None`. `Some(vec![])` still
//! serializes as `[]`; turning empty collections into absent fields is the
//! normalizer's job, not serde's.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status string reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterStatus(String);

impl ClusterStatus {
    /// Status reported while provisioning is still in progress.
    pub const CREATING: &'static str = "CREATING";

    /// Wrap a status string.
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// The raw status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the cluster is still being provisioned.
    #[must_use]
    pub fn is_creating(&self) -> bool {
        self.0 == Self::CREATING
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClusterStatus {
    fn from(status: &str) -> Self {
        Self::new(status)
    }
}

/// A cluster as submitted to or returned by `/v3/clusters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster UUID, assigned by the control plane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Cluster type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub cluster_type: Option<String>,
    /// Cluster name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Infrastructure provider UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Provisioning status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClusterStatus>,
    /// Kubernetes version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    /// Admin kubeconfig, only present on fetched records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,
    /// IP allocation method, `ccpnet` for the built-in IPAM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_allocation_method: Option<String>,
    /// Virtual IP of the API server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_vip: Option<String>,
    /// Number of load-balancer IPs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_num: Option<i64>,
    /// Subnet UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    /// NTP pools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntp_pools: Option<Vec<String>>,
    /// NTP servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntp_servers: Option<Vec<String>>,
    /// Registries trusted through the root CA bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_ca_registries: Option<Vec<String>>,
    /// Self-signed registry CA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_signed_registries: Option<SelfSignedRegistries>,
    /// Registries reached without TLS verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_registries: Option<Vec<String>>,
    /// Docker HTTP proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_http_proxy: Option<String>,
    /// Docker HTTPS proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_https_proxy: Option<String>,
    /// Docker bridge IP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_bip: Option<String>,
    /// vSphere placement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vsphere_infra: Option<Infra>,
    /// Master node pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_group: Option<NodePool>,
    /// Worker node pools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_groups: Option<Vec<NodePool>>,
    /// CNI plugin selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_plugin_profile: Option<NetworkPlugin>,
    /// Use the ingress controller as a load balancer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_as_lb: Option<bool>,
    /// Ingress class for the nginx controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nginx_ingress_class: Option<String>,
    /// Encrypt etcd at rest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etcd_encrypted: Option<bool>,
    /// Skip installing management components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_management: Option<bool>,
    /// Docker no-proxy list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_no_proxy: Option<Vec<String>>,
    /// Routable CIDR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routable_cidr: Option<String>,
    /// Image prefix for system containers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prefix: Option<String>,
    /// ACI profile UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aci_profile: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enable AWS IAM authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_iam_enabled: Option<bool>,
}

impl Cluster {
    /// An otherwise empty record with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Cluster name, or `""` if absent.
    #[must_use]
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Name of the selected network plugin.
    #[must_use]
    pub fn network_plugin_name(&self) -> Option<&str> {
        self.network_plugin_profile.as_ref()?.name.as_deref()
    }

    /// Whether the control plane still reports the cluster as creating.
    #[must_use]
    pub fn is_creating(&self) -> bool {
        self.status.as_ref().is_some_and(ClusterStatus::is_creating)
    }

    /// Total nodes across the master and worker pools.
    #[must_use]
    pub fn node_count(&self) -> i64 {
        let master = self.master_group.as_ref().and_then(|p| p.size).unwrap_or(0);
        let workers: i64 = self
            .node_groups
            .iter()
            .flatten()
            .filter_map(|p| p.size)
            .sum();
        master + workers
    }
}

/// vSphere placement for a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infra {
    /// Datacenter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    /// Datastore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,
    /// vSphere compute cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    /// Port groups the nodes attach to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<String>>,
    /// Resource pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<String>,
}

/// A master or worker node pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePool {
    /// Pool name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Node count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// VM template (image) name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// vCPUs per node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<i64>,
    /// Memory per node in MiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<i64>,
    /// GPU devices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpus: Option<Vec<String>>,
    /// SSH user provisioned on the nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    /// SSH public key provisioned on the nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
    /// Nodes, only present on fetched records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
    /// Kubernetes version of the pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
}

/// A node inside a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Node status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Detail for the status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    /// Reason for the status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    /// Public IP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    /// Private IP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    /// Lifecycle phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// CNI plugin selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlugin {
    /// Plugin name, e.g. `calico` or `contiv-aci`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Plugin settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<NetworkPluginDetails>,
}

impl NetworkPlugin {
    /// A plugin with a pod CIDR.
    pub fn new(name: impl Into<String>, pod_cidr: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            details: Some(NetworkPluginDetails {
                pod_cidr: Some(pod_cidr.into()),
            }),
        }
    }
}

/// Network plugin settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPluginDetails {
    /// Pod network CIDR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<String>,
}

/// CA for self-signed registries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfSignedRegistries {
    /// PEM-encoded CA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selfsignedca: Option<String>,
}

/// Body of a node-pool scale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleRequest {
    /// Pool name.
    pub name: String,
    /// Desired node count.
    pub size: i64,
}
