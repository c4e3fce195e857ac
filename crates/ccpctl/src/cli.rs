//! Command-line argument parsing with clap.

use std::path::PathBuf;

use ccp_client::normalize::DEFAULT_WORKER_POOL;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// ccpctl - manage Kubernetes clusters on a CCP control plane.
#[derive(Parser, Debug, Clone)]
#[command(name = "ccpctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Defaults file (default: ~/.ccpctl.json).
    #[arg(short, long, env = "CCPCTL_CONF", global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Log verbosity when `RUST_LOG` is unset: 0 warn, 1 info, 2 debug, 3 trace.
    #[arg(
        short,
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=3),
        global = true
    )]
    pub debug: u8,

    /// Accept any TLS certificate from the control plane.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the session token.
    Login,

    /// Show or change stored defaults.
    Config {
        /// Config subcommand to execute.
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Tenant cluster management.
    Cluster {
        /// Cluster subcommand to execute.
        #[command(subcommand)]
        command: ClusterCommands,
    },

    /// Infrastructure providers.
    Provider {
        /// Provider subcommand to execute.
        #[command(subcommand)]
        command: LookupCommands,
    },

    /// IP pool subnets.
    Subnet {
        /// Subnet subcommand to execute.
        #[command(subcommand)]
        command: LookupCommands,
    },

    /// ACI fabric profiles.
    AciProfile {
        /// ACI profile subcommand to execute.
        #[command(subcommand)]
        command: LookupCommands,
    },

    /// Cluster add-ons.
    Addon {
        /// Add-on subcommand to execute.
        #[command(subcommand)]
        command: AddonCommands,
    },
}

impl Commands {
    /// Whether the command talks to the control plane.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        match self {
            Self::Config { command } => match command {
                ConfigCommands::Show => false,
                ConfigCommands::Set(args) => args.needs_lookup(),
            },
            _ => true,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print stored defaults with secrets masked.
    Show,

    /// Change stored defaults. Only the given flags are updated.
    Set(ConfigSetArgs),
}

/// Arguments for `config set`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSetArgs {
    /// Control-plane display name.
    #[arg(long)]
    pub name: Option<String>,

    /// Control-plane URL, e.g. https://10.10.20.110.
    #[arg(long)]
    pub url: Option<String>,

    /// Login user.
    #[arg(long)]
    pub username: Option<String>,

    /// Login password.
    #[arg(long)]
    pub password: Option<String>,

    /// Skip TLS verification for this control plane.
    #[arg(long)]
    pub insecure_skip_verify: Option<bool>,

    /// Minutes a session token is reused before logging in again.
    #[arg(long)]
    pub token_expiry_minutes: Option<u64>,

    /// SSH user installed on cluster nodes.
    #[arg(long)]
    pub ssh_user: Option<String>,

    /// SSH public key installed on cluster nodes.
    #[arg(long)]
    pub ssh_key: Option<String>,

    /// Default cluster.
    #[arg(long)]
    pub cluster: Option<String>,

    /// vSphere compute cluster.
    #[arg(long)]
    pub vsphere_cluster: Option<String>,

    /// vSphere datacenter.
    #[arg(long)]
    pub datacenter: Option<String>,

    /// vSphere datastore.
    #[arg(long)]
    pub datastore: Option<String>,

    /// Port group for node interfaces.
    #[arg(long)]
    pub network: Option<String>,

    /// Node VM template.
    #[arg(long)]
    pub image: Option<String>,

    /// Provider name, resolved to its id on the control plane.
    #[arg(long)]
    pub provider: Option<String>,

    /// Subnet name, resolved to its id on the control plane.
    #[arg(long)]
    pub subnet: Option<String>,
}

impl ConfigSetArgs {
    /// Whether a name must be resolved against the control plane.
    #[must_use]
    pub fn needs_lookup(&self) -> bool {
        self.provider.is_some() || self.subnet.is_some()
    }
}

/// Cluster subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ClusterCommands {
    /// List clusters.
    List,

    /// Show a cluster.
    Get {
        /// Cluster name (default: the stored default cluster).
        name: Option<String>,

        /// Print only the admin kubeconfig.
        #[arg(long)]
        kubeconfig: bool,
    },

    /// Create a cluster from flags and stored defaults.
    Create(CreateArgs),

    /// Create a cluster from a JSON request document.
    CreateFromFile {
        /// Path to the request.
        path: PathBuf,

        /// Wait settings.
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete a cluster.
    Delete {
        /// Cluster name.
        name: String,
    },

    /// Resize a worker pool.
    Scale {
        /// Cluster name (default: the stored default cluster).
        name: Option<String>,

        /// New worker count.
        #[arg(long)]
        workers: i64,

        /// Worker pool to resize.
        #[arg(long, default_value = DEFAULT_WORKER_POOL)]
        pool: String,
    },
}

/// Whether and how long to wait for a new cluster.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitArgs {
    /// Block until the cluster leaves CREATING.
    #[arg(long)]
    pub wait: bool,

    /// Give up waiting after this many minutes (0 waits forever).
    #[arg(long, default_value_t = 60)]
    pub timeout_minutes: u64,
}

/// Arguments for `cluster create`. Unset values come from stored defaults.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateArgs {
    /// Cluster name.
    pub name: String,

    /// Node VM template; the Kubernetes version is derived from it.
    #[arg(long)]
    pub image: Option<String>,

    /// Worker count.
    #[arg(long)]
    pub workers: Option<i64>,

    /// Master count.
    #[arg(long, value_parser = master_count)]
    pub masters: Option<i64>,

    /// Load-balancer IP count.
    #[arg(long)]
    pub load_balancers: Option<i64>,

    /// vSphere datacenter.
    #[arg(long)]
    pub datacenter: Option<String>,

    /// vSphere datastore.
    #[arg(long)]
    pub datastore: Option<String>,

    /// Port group; repeat for several.
    #[arg(long = "network")]
    pub networks: Vec<String>,

    /// vSphere compute cluster.
    #[arg(long)]
    pub vsphere_cluster: Option<String>,

    /// Provider id.
    #[arg(long)]
    pub provider_id: Option<String>,

    /// Subnet id.
    #[arg(long)]
    pub subnet_id: Option<String>,

    /// CNI plugin.
    #[arg(long)]
    pub network_plugin: Option<String>,

    /// Pod CIDR for the CNI plugin.
    #[arg(long)]
    pub pod_cidr: Option<String>,

    /// Kubernetes version, when it cannot be derived from the image.
    #[arg(long)]
    pub kubernetes_version: Option<String>,

    /// Wait settings.
    #[command(flatten)]
    pub wait: WaitArgs,
}

impl Default for WaitArgs {
    fn default() -> Self {
        Self {
            wait: false,
            timeout_minutes: 60,
        }
    }
}

fn master_count(value: &str) -> Result<i64, String> {
    match value {
        "1" => Ok(1),
        "3" => Ok(3),
        _ => Err(format!("master count must be 1 or 3, got {value}")),
    }
}

/// List and lookup subcommands shared by providers, subnets and ACI profiles.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LookupCommands {
    /// List all entries.
    List,

    /// Show one entry by name.
    Get {
        /// Entry name.
        name: String,
    },
}

/// Add-on subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AddonCommands {
    /// List add-ons installed on a cluster.
    List {
        /// Cluster name.
        cluster: String,
    },

    /// List add-ons the control plane can install on a cluster.
    Catalogue {
        /// Cluster name.
        cluster: String,
    },

    /// Install an add-on, or `all`.
    Install {
        /// Cluster name.
        cluster: String,
        /// Add-on name.
        addon: String,
    },

    /// Remove an add-on, or `all`.
    Delete {
        /// Cluster name.
        cluster: String,
        /// Add-on name.
        addon: String,
    },
}
