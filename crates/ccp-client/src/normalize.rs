//! Cluster request normalization.
//!
//! The control plane distinguishes an omitted field from one sent as `[]` or
//! `null`, and rejects the latter for several optional collections. Before a
//! request is sent, [`Normalizer::normalize`] rewrites those empty
//! collections to absent fields and applies any correction registered for the
//! selected network plugin. [`fill_defaults`] completes a minimal request the
//! way the control plane's own UI does.

use tracing::debug;

use crate::model::{Cluster, Infra, NetworkPlugin, NodePool};

/// Network plugin selected when the request names none.
pub const DEFAULT_NETWORK_PLUGIN: &str = "calico";
/// Pod CIDR used with the default plugin.
pub const DEFAULT_POD_CIDR: &str = "192.168.0.0/16";
/// Load-balancer IP count used when the request names none.
pub const DEFAULT_LOAD_BALANCER_NUM: i64 = 2;
/// IP allocation method used when the request names none.
pub const DEFAULT_IP_ALLOCATION_METHOD: &str = "ccpnet";
/// Name of the worker pool created when the request has none.
pub const DEFAULT_WORKER_POOL: &str = "node-group";
/// Plugin whose requests need the ACI corrections.
pub const CONTIV_ACI: &str = "contiv-aci";

const VERSION_PREFIX: &str = "image-";
const VERSION_SUFFIX: &str = "-ubuntu18";

/// Extract the Kubernetes version from a template name such as
/// `ccp-tenant-image-1.16.3-ubuntu18-6.1.1-pre`.
///
/// Returns `""` when either delimiter is missing or they are out of order.
/// An empty result means "unknown", not an error.
#[must_use]
pub fn derive_kubernetes_version(image: &str) -> &str {
    let Some(prefix) = image.find(VERSION_PREFIX) else {
        return "";
    };
    let Some(end) = image.find(VERSION_SUFFIX) else {
        return "";
    };
    let start = prefix + VERSION_PREFIX.len();
    if start >= end {
        return "";
    }
    &image[start..end]
}

/// A rewrite applied to requests that select a given network plugin.
#[derive(Debug, Clone, Copy)]
pub struct PluginCorrection {
    /// Plugin name the correction applies to.
    pub plugin: &'static str,
    /// The rewrite.
    pub apply: fn(&mut Cluster),
}

/// `contiv-aci` needs an explicit empty network list and a single
/// load-balancer IP, whatever the request said.
fn correct_contiv_aci(cluster: &mut Cluster) {
    cluster.vsphere_infra.get_or_insert_with(Infra::default).networks = Some(Vec::new());
    cluster.load_balancer_num = Some(1);
}

/// Cleans cluster requests before transmission.
#[derive(Debug, Clone)]
pub struct Normalizer {
    corrections: Vec<PluginCorrection>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::empty().with_correction(PluginCorrection {
            plugin: CONTIV_ACI,
            apply: correct_contiv_aci,
        })
    }
}

impl Normalizer {
    /// A normalizer with no plugin corrections.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            corrections: Vec::new(),
        }
    }

    /// Register an additional plugin correction.
    #[must_use]
    pub fn with_correction(mut self, correction: PluginCorrection) -> Self {
        self.corrections.push(correction);
        self
    }

    /// Plugins with a registered correction.
    pub fn corrected_plugins(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.corrections.iter().map(|c| c.plugin)
    }

    /// Strip empty optional collections and apply plugin corrections.
    ///
    /// Idempotent: normalizing twice gives the same request.
    #[must_use]
    pub fn normalize(&self, mut cluster: Cluster) -> Cluster {
        strip_empty_collections(&mut cluster);

        let Some(plugin) = cluster.network_plugin_name().map(str::to_owned) else {
            return cluster;
        };
        for correction in self.corrections.iter().filter(|c| c.plugin == plugin) {
            debug!(plugin = %plugin, "applying network plugin correction");
            (correction.apply)(&mut cluster);
        }
        cluster
    }
}

/// Normalize with the built-in corrections.
#[must_use]
pub fn normalize(cluster: Cluster) -> Cluster {
    Normalizer::default().normalize(cluster)
}

fn clear_if_empty<T>(field: &mut Option<Vec<T>>) {
    if field.as_ref().is_some_and(Vec::is_empty) {
        *field = None;
    }
}

fn strip_empty_collections(cluster: &mut Cluster) {
    if let Some(master) = cluster.master_group.as_mut() {
        clear_if_empty(&mut master.nodes);
    }
    for pool in cluster.node_groups.iter_mut().flatten() {
        clear_if_empty(&mut pool.nodes);
    }
    clear_if_empty(&mut cluster.ntp_pools);
    clear_if_empty(&mut cluster.ntp_servers);
    clear_if_empty(&mut cluster.docker_no_proxy);
    clear_if_empty(&mut cluster.root_ca_registries);
    clear_if_empty(&mut cluster.insecure_registries);
}

/// Sizing applied to a pool when the request leaves it unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSizing {
    /// Node count.
    pub size: i64,
    /// vCPUs per node.
    pub vcpus: i64,
    /// Memory per node in MiB.
    pub memory_mb: i64,
}

impl PoolSizing {
    fn fill(self, pool: &mut NodePool) {
        pool.size.get_or_insert(self.size);
        pool.vcpus.get_or_insert(self.vcpus);
        pool.memory_mb.get_or_insert(self.memory_mb);
    }
}

/// Values used by [`fill_defaults`].
#[derive(Debug, Clone)]
pub struct ClusterDefaults {
    /// Infrastructure provider UUID.
    pub provider_id: Option<String>,
    /// Network plugin.
    pub network_plugin: NetworkPlugin,
    /// Load-balancer IP count.
    pub load_balancer_num: i64,
    /// IP allocation method.
    pub ip_allocation_method: String,
    /// Master pool sizing.
    pub master: PoolSizing,
    /// Worker pool sizing.
    pub worker: PoolSizing,
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        Self {
            provider_id: None,
            network_plugin: NetworkPlugin::new(DEFAULT_NETWORK_PLUGIN, DEFAULT_POD_CIDR),
            load_balancer_num: DEFAULT_LOAD_BALANCER_NUM,
            ip_allocation_method: DEFAULT_IP_ALLOCATION_METHOD.to_string(),
            master: PoolSizing {
                size: 1,
                vcpus: 2,
                memory_mb: 16384,
            },
            worker: PoolSizing {
                size: 1,
                vcpus: 2,
                memory_mb: 32768,
            },
        }
    }
}

impl ClusterDefaults {
    /// Defaults pointing at a provider.
    pub fn for_provider(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
            ..Self::default()
        }
    }
}

/// Fill required fields the request left out. Fields already set are kept.
///
/// The Kubernetes version is derived from the master template and only set
/// when derivation succeeds. Worker pools inherit the master template and
/// SSH settings; if there is no worker pool, one is created.
#[must_use]
pub fn fill_defaults(mut cluster: Cluster, defaults: &ClusterDefaults) -> Cluster {
    if cluster.provider.is_none() {
        cluster.provider.clone_from(&defaults.provider_id);
    }

    let master = cluster.master_group.get_or_insert_with(NodePool::default);
    defaults.master.fill(master);
    let master = master.clone();

    if cluster.kubernetes_version.is_none() {
        let derived = master
            .template
            .as_deref()
            .map(derive_kubernetes_version)
            .unwrap_or_default();
        if derived.is_empty() {
            debug!(template = ?master.template, "could not derive kubernetes version");
        } else {
            cluster.kubernetes_version = Some(derived.to_string());
        }
    }

    if cluster.network_plugin_profile.is_none() {
        cluster.network_plugin_profile = Some(defaults.network_plugin.clone());
    }
    cluster.load_balancer_num.get_or_insert(defaults.load_balancer_num);
    if cluster.ip_allocation_method.is_none() {
        cluster.ip_allocation_method = Some(defaults.ip_allocation_method.clone());
    }

    let pools = cluster.node_groups.get_or_insert_with(Vec::new);
    if pools.is_empty() {
        pools.push(NodePool {
            name: Some(DEFAULT_WORKER_POOL.to_string()),
            ..NodePool::default()
        });
    }
    for pool in pools.iter_mut() {
        defaults.worker.fill(pool);
        if pool.template.is_none() {
            pool.template.clone_from(&master.template);
        }
        if pool.ssh_user.is_none() {
            pool.ssh_user.clone_from(&master.ssh_user);
        }
        if pool.ssh_key.is_none() {
            pool.ssh_key.clone_from(&master.ssh_key);
        }
        if pool.kubernetes_version.is_none() {
            pool.kubernetes_version.clone_from(&cluster.kubernetes_version);
        }
    }

    if let Some(master) = cluster.master_group.as_mut() {
        if master.kubernetes_version.is_none() {
            master.kubernetes_version.clone_from(&cluster.kubernetes_version);
        }
    }

    cluster
}
