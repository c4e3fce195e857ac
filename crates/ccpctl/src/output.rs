//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Records returned
//! by the control plane are printed as-is in JSON mode; secrets are masked by
//! the commands before they reach the formatter.

use std::io::Write;

use ccp_client::{
    AciProfile, AddonCatalogue, Cluster, ClusterStatus, InstalledAddons, NetworkSubnet,
    NodePool, ProviderClientConfig,
};
use ccp_config::Defaults;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay + ?Sized,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay + ?Sized,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Placeholder for absent values in tables.
const NONE: &str = "-";

fn dash(value: &str) -> &str {
    if value.is_empty() { NONE } else { value }
}

fn or_dash(value: Option<&str>) -> &str {
    dash(value.unwrap_or_default())
}

fn num_or_dash(value: Option<i64>) -> String {
    value.map_or_else(|| NONE.to_string(), |v| v.to_string())
}

// Clusters

impl TableDisplay for Vec<Cluster> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No clusters")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<24}  {:<10}  {:<10}  {:>5}  {:<12}  {:<36}",
            "NAME", "STATUS", "K8S", "NODES", "CNI", "ID"
        )?;
        writeln!(writer, "{}", "─".repeat(106))?;

        for cluster in self {
            writeln!(
                writer,
                "{:<24}  {:<10}  {:<10}  {:>5}  {:<12}  {:<36}",
                truncate(cluster.name_or_empty(), 24),
                or_dash(cluster.status.as_ref().map(ClusterStatus::as_str)),
                or_dash(cluster.kubernetes_version.as_deref()),
                cluster.node_count(),
                or_dash(cluster.network_plugin_name()),
                or_dash(cluster.id.as_deref()),
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} cluster(s)", self.len())?;
        Ok(())
    }
}

impl TableDisplay for Cluster {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Cluster: {}", self.name_or_empty())?;
        writeln!(writer, "══════════════════════════════════════════════════")?;
        writeln!(writer, "ID:              {}", or_dash(self.id.as_deref()))?;
        writeln!(
            writer,
            "Status:          {}",
            or_dash(self.status.as_ref().map(ClusterStatus::as_str))
        )?;
        writeln!(writer, "Kubernetes:      {}", or_dash(self.kubernetes_version.as_deref()))?;
        writeln!(writer, "Provider:        {}", or_dash(self.provider.as_deref()))?;
        writeln!(writer, "Master VIP:      {}", or_dash(self.master_vip.as_deref()))?;
        writeln!(writer, "Load balancers:  {}", num_or_dash(self.load_balancer_num))?;
        writeln!(writer, "Network plugin:  {}", or_dash(self.network_plugin_name()))?;
        writeln!(writer)?;

        if let Some(infra) = &self.vsphere_infra {
            writeln!(writer, "vSphere")?;
            writeln!(writer, "  Datacenter:    {}", or_dash(infra.datacenter.as_deref()))?;
            writeln!(writer, "  Datastore:     {}", or_dash(infra.datastore.as_deref()))?;
            writeln!(writer, "  Cluster:       {}", or_dash(infra.cluster.as_deref()))?;
            let networks = infra.networks.as_deref().unwrap_or_default().join(", ");
            writeln!(writer, "  Networks:      {}", dash(&networks))?;
            writeln!(writer)?;
        }

        writeln!(writer, "Node pools")?;
        if let Some(master) = &self.master_group {
            write_pool(writer, "master", master)?;
        }
        for pool in self.node_groups.iter().flatten() {
            write_pool(writer, "worker", pool)?;
        }
        Ok(())
    }
}

fn write_pool<W: Write>(writer: &mut W, role: &str, pool: &NodePool) -> Result<(), CliError> {
    writeln!(
        writer,
        "  {:<16} {:<7} size={:<3} template={}",
        or_dash(pool.name.as_deref()),
        role,
        num_or_dash(pool.size),
        or_dash(pool.template.as_deref()),
    )?;
    for node in pool.nodes.iter().flatten() {
        writeln!(
            writer,
            "    {} ({})",
            or_dash(node.name.as_deref()),
            or_dash(node.status.as_deref())
        )?;
    }
    Ok(())
}

/// Admin kubeconfig of a cluster.
#[derive(Debug, Clone, Serialize)]
pub struct Kubeconfig {
    /// Cluster name.
    pub cluster: String,
    /// Kubeconfig document.
    pub kubeconfig: String,
}

impl TableDisplay for Kubeconfig {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        // Printed bare so the output can be redirected into a file.
        write!(writer, "{}", self.kubeconfig)?;
        if !self.kubeconfig.ends_with('\n') {
            writeln!(writer)?;
        }
        Ok(())
    }
}

// Providers, subnets, ACI profiles

impl TableDisplay for Vec<ProviderClientConfig> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No providers")?;
            return Ok(());
        }
        writeln!(writer, "{:<20}  {:<10}  {:<24}  {:<36}", "NAME", "TYPE", "ADDRESS", "ID")?;
        writeln!(writer, "{}", "─".repeat(96))?;
        for p in self {
            writeln!(
                writer,
                "{:<20}  {:<10}  {:<24}  {:<36}",
                truncate(or_dash(p.name.as_deref()), 20),
                or_dash(p.provider_type.as_deref()),
                truncate(or_dash(p.address.as_deref()), 24),
                or_dash(p.id.as_deref()),
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for ProviderClientConfig {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Provider: {}", or_dash(self.name.as_deref()))?;
        writeln!(writer, "  ID:        {}", or_dash(self.id.as_deref()))?;
        writeln!(writer, "  Type:      {}", or_dash(self.provider_type.as_deref()))?;
        writeln!(writer, "  Address:   {}", or_dash(self.address.as_deref()))?;
        writeln!(writer, "  Port:      {}", num_or_dash(self.port))?;
        writeln!(writer, "  Username:  {}", or_dash(self.username.as_deref()))?;
        Ok(())
    }
}

impl TableDisplay for Vec<NetworkSubnet> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No subnets")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<20}  {:<18}  {:<15}  {:>6}  {:<36}",
            "NAME", "CIDR", "GATEWAY", "FREE", "ID"
        )?;
        writeln!(writer, "{}", "─".repeat(103))?;
        for s in self {
            writeln!(
                writer,
                "{:<20}  {:<18}  {:<15}  {:>6}  {:<36}",
                truncate(or_dash(s.name.as_deref()), 20),
                or_dash(s.cidr.as_deref()),
                or_dash(s.gateway_ip.as_deref()),
                num_or_dash(s.free_ips),
                or_dash(s.uuid.as_deref()),
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for NetworkSubnet {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Subnet: {}", or_dash(self.name.as_deref()))?;
        writeln!(writer, "  ID:           {}", or_dash(self.uuid.as_deref()))?;
        writeln!(writer, "  CIDR:         {}", or_dash(self.cidr.as_deref()))?;
        writeln!(writer, "  Gateway:      {}", or_dash(self.gateway_ip.as_deref()))?;
        let nameservers = self.nameservers.as_deref().unwrap_or_default().join(", ");
        writeln!(writer, "  Nameservers:  {}", dash(&nameservers))?;
        writeln!(
            writer,
            "  Addresses:    {} free of {}",
            num_or_dash(self.free_ips),
            num_or_dash(self.total_ips)
        )?;
        Ok(())
    }
}

impl TableDisplay for Vec<AciProfile> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No ACI profiles")?;
            return Ok(());
        }
        writeln!(writer, "{:<20}  {:<24}  {:<16}  {:<36}", "NAME", "APIC HOSTS", "TENANT", "ID")?;
        writeln!(writer, "{}", "─".repeat(102))?;
        for p in self {
            writeln!(
                writer,
                "{:<20}  {:<24}  {:<16}  {:<36}",
                truncate(or_dash(p.name.as_deref()), 20),
                truncate(or_dash(p.apic_hosts.as_deref()), 24),
                or_dash(p.aci_tenant.as_deref()),
                or_dash(p.id.as_deref()),
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for AciProfile {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "ACI profile: {}", or_dash(self.name.as_deref()))?;
        writeln!(writer, "  ID:          {}", or_dash(self.id.as_deref()))?;
        writeln!(writer, "  APIC hosts:  {}", or_dash(self.apic_hosts.as_deref()))?;
        writeln!(writer, "  Username:    {}", or_dash(self.apic_username.as_deref()))?;
        writeln!(writer, "  Tenant:      {}", or_dash(self.aci_tenant.as_deref()))?;
        writeln!(writer, "  VMM domain:  {}", or_dash(self.aci_vmm_domain_name.as_deref()))?;
        writeln!(writer, "  VRF:         {}", or_dash(self.vrf_name.as_deref()))?;
        writeln!(writer, "  AAEP:        {}", or_dash(self.aaep_name.as_deref()))?;
        Ok(())
    }
}

// Add-ons

impl TableDisplay for InstalledAddons {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.results.is_empty() {
            writeln!(writer, "No add-ons installed")?;
            return Ok(());
        }
        writeln!(writer, "{:<28}  {:<12}  {:<12}  {:<12}", "NAME", "NAMESPACE", "HELM", "STATUS")?;
        writeln!(writer, "{}", "─".repeat(70))?;
        for addon in &self.results {
            writeln!(
                writer,
                "{:<28}  {:<12}  {:<12}  {:<12}",
                truncate(&addon.name, 28),
                dash(&addon.namespace),
                dash(&addon.status.helm_status),
                dash(&addon.status.status),
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} add-on(s)", self.count)?;
        Ok(())
    }
}

impl TableDisplay for AddonCatalogue {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "Catalogue is empty")?;
            return Ok(());
        }
        writeln!(writer, "{:<20}  {:<28}  {:<40}", "KEY", "CHART", "DESCRIPTION")?;
        writeln!(writer, "{}", "─".repeat(92))?;
        for (key, chart) in self {
            writeln!(
                writer,
                "{:<20}  {:<28}  {:<40}",
                key,
                truncate(&chart.name, 28),
                truncate(&chart.description, 40),
            )?;
        }
        Ok(())
    }
}

// Defaults

impl TableDisplay for Defaults {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let cp = &self.control_plane;
        writeln!(writer, "Control plane")?;
        writeln!(writer, "  Name:             {}", dash(&cp.name))?;
        writeln!(writer, "  URL:              {}", dash(&cp.url))?;
        writeln!(writer, "  Username:         {}", dash(&cp.username))?;
        writeln!(writer, "  Password:         {}", dash(&cp.password))?;
        writeln!(writer, "  Skip TLS verify:  {}", cp.insecure_skip_verify)?;
        writeln!(writer)?;

        writeln!(writer, "Session")?;
        match &self.session {
            Some(session) => {
                writeln!(writer, "  Token:            {}", session.token)?;
                writeln!(writer, "  Acquired:         {}", session.acquired_at.to_rfc3339())?;
            }
            None => writeln!(writer, "  Token:            {NONE}")?,
        }
        writeln!(writer, "  Expiry:           {} min", self.token_expiry_minutes)?;
        writeln!(writer)?;

        let infra = &self.infra;
        writeln!(writer, "Defaults")?;
        writeln!(writer, "  Cluster:          {}", dash(&infra.cluster))?;
        writeln!(writer, "  SSH user:         {}", dash(&self.ssh.user))?;
        writeln!(
            writer,
            "  SSH key:          {}",
            truncate(dash(&self.ssh.key), 40)
        )?;
        writeln!(writer, "  Datacenter:       {}", dash(&infra.datacenter))?;
        writeln!(writer, "  Datastore:        {}", dash(&infra.datastore))?;
        writeln!(writer, "  vSphere cluster:  {}", dash(&infra.vsphere_cluster))?;
        writeln!(writer, "  Network:          {}", dash(&infra.network))?;
        writeln!(writer, "  Image:            {}", dash(&infra.image))?;
        writeln!(
            writer,
            "  Provider:         {} ({})",
            dash(&infra.provider.name),
            dash(&infra.provider.id)
        )?;
        writeln!(
            writer,
            "  Subnet:           {} ({})",
            dash(&infra.subnet.name),
            dash(&infra.subnet.id)
        )?;
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
