//! Cluster add-ons.
//!
//! Each [`Addon`] maps to one or more Helm charts served by the control
//! plane. Most charts are installed from a fixed definition; hx-csi and
//! kubeflow are installed from the definition published in the cluster's
//! catalogue. Istio and Harbor are an operator plus an instance: install
//! runs operator then instance, delete runs instance then operator, with a
//! short pause between steps. A failed step is returned as-is and earlier
//! steps are not rolled back.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::{CcpClient, require_id};
use crate::error::{Error, Result};
use crate::model::{AddonCatalogue, AddonChart, InstalledAddons};
use crate::transport::{ApiRequest, Transport};

/// Pause between the steps of a two-chart add-on.
pub const STEP_PAUSE: Duration = Duration::from_secs(2);

const CHART_NAMESPACE: &str = "ccp";

/// An add-on that can be installed on a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addon {
    /// Prometheus and Grafana.
    Monitoring,
    /// Elasticsearch, Fluentd and Kibana.
    Logging,
    /// Istio operator and control plane.
    Istio,
    /// Harbor operator and registry.
    Harbor,
    /// HyperFlex CSI driver.
    HxCsi,
    /// Kubeflow.
    Kubeflow,
    /// Kubernetes dashboard.
    Dashboard,
}

/// Where an install step gets its chart definition.
#[derive(Debug, Clone)]
enum ChartSource {
    Fixed(AddonChart),
    Catalogue {
        key: &'static str,
        namespace: Option<&'static str>,
    },
}

fn chart(display_name: &str, name: &str, description: &str) -> AddonChart {
    AddonChart {
        display_name: display_name.to_string(),
        name: name.to_string(),
        namespace: CHART_NAMESPACE.to_string(),
        description: description.to_string(),
        url: format!("/opt/ccp/charts/{name}.tgz"),
        ..AddonChart::default()
    }
}

fn istio_instance() -> AddonChart {
    chart("Istio", "ccp-istio-cr", "Istio (REQUIRES ISTIO OPERATOR)")
}

fn istio_operator() -> AddonChart {
    let mut operator = chart("Istio Operator", "ccp-istio-operator", "Istio Operator");
    operator.conflicts = vec!["ccp-kubeflow".into(), "ccp-harbor-operator".into()];
    operator
        .dependencies
        .insert("_ccp-istio".into(), istio_instance());
    operator
}

fn harbor_operator() -> AddonChart {
    let mut operator = chart("Harbor Operator", "ccp-harbor-operator", "Harbor Operator");
    operator.conflicts = vec!["ccp-istio-operator".into()];
    operator
}

fn dashboard() -> AddonChart {
    let mut dashboard = chart("Dashboard", "kubernetes-dashboard", "Dashboard");
    dashboard.override_files = vec!["/opt/ccp/charts/kubernetes-dashboard.yaml".into()];
    dashboard
}

impl Addon {
    /// Every add-on, in the order `all` installs them.
    pub const ALL: [Self; 7] = [
        Self::Monitoring,
        Self::Logging,
        Self::Dashboard,
        Self::Istio,
        Self::Harbor,
        Self::HxCsi,
        Self::Kubeflow,
    ];

    /// Name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Monitoring => "monitoring",
            Self::Logging => "logging",
            Self::Istio => "istio",
            Self::Harbor => "harbor",
            Self::HxCsi => "hx-csi",
            Self::Kubeflow => "kubeflow",
            Self::Dashboard => "dashboard",
        }
    }

    /// Charts removed by [`CcpClient::delete_addon`], in order.
    #[must_use]
    pub const fn charts(self) -> &'static [&'static str] {
        match self {
            Self::Monitoring => &["ccp-monitor"],
            Self::Logging => &["ccp-efk"],
            Self::Istio => &["ccp-istio-cr", "ccp-istio-operator"],
            Self::Harbor => &["ccp-harbor-cr", "ccp-harbor-operator"],
            Self::HxCsi => &["ccp-hxcsi"],
            Self::Kubeflow => &["ccp-kubeflow"],
            Self::Dashboard => &["kubernetes-dashboard"],
        }
    }

    fn install_steps(self) -> Vec<ChartSource> {
        match self {
            Self::Monitoring => vec![ChartSource::Fixed(chart(
                "Monitoring",
                "ccp-monitor",
                "Monitoring",
            ))],
            Self::Logging => vec![ChartSource::Fixed(chart("Logging", "ccp-efk", "Logging"))],
            Self::Istio => vec![
                ChartSource::Fixed(istio_operator()),
                ChartSource::Fixed(istio_instance()),
            ],
            Self::Harbor => vec![
                ChartSource::Fixed(harbor_operator()),
                ChartSource::Fixed(chart("Harbor", "ccp-harbor-cr", "Harbor registry")),
            ],
            Self::HxCsi => vec![ChartSource::Catalogue {
                key: "_ccp-hxcsi",
                namespace: Some(CHART_NAMESPACE),
            }],
            Self::Kubeflow => vec![ChartSource::Catalogue {
                key: "_ccp-kubeflow",
                namespace: None,
            }],
            Self::Dashboard => vec![ChartSource::Fixed(dashboard())],
        }
    }
}

impl fmt::Display for Addon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Addon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "monitoring" | "monitor" => Ok(Self::Monitoring),
            "logging" | "efk" => Ok(Self::Logging),
            "istio" => Ok(Self::Istio),
            "harbor" => Ok(Self::Harbor),
            "hx-csi" | "hxcsi" => Ok(Self::HxCsi),
            "kubeflow" => Ok(Self::Kubeflow),
            "dashboard" => Ok(Self::Dashboard),
            other => Err(Error::NotFound {
                kind: "addon",
                name: other.to_string(),
            }),
        }
    }
}

impl<T: Transport> CcpClient<T> {
    /// Charts the cluster offers, keyed by catalogue key.
    pub async fn addon_catalogue(&self, cluster_id: &str) -> Result<AddonCatalogue> {
        require_id("cluster id", cluster_id)?;
        self.get_json(&format!("/v3/clusters/{cluster_id}/catalog"))
            .await
    }

    /// Add-ons installed on the cluster.
    pub async fn installed_addons(&self, cluster_id: &str) -> Result<InstalledAddons> {
        require_id("cluster id", cluster_id)?;
        self.get_json(&format!("/v3/clusters/{cluster_id}/addons/"))
            .await
    }

    /// Install an add-on.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. Steps already applied stay
    /// applied.
    pub async fn install_addon(&self, cluster_id: &str, addon: Addon) -> Result<()> {
        require_id("cluster id", cluster_id)?;
        info!(cluster = %cluster_id, addon = %addon, "installing add-on");

        for (step, source) in addon.install_steps().into_iter().enumerate() {
            if step > 0 {
                tokio::time::sleep(STEP_PAUSE).await;
            }
            let chart = self.resolve_chart(cluster_id, source).await?;
            debug!(cluster = %cluster_id, chart = %chart.name, "installing chart");
            if let Err(e) = self
                .send(ApiRequest::post(format!("/v3/clusters/{cluster_id}/addons/")).json(&chart)?)
                .await
            {
                warn!(cluster = %cluster_id, chart = %chart.name, error = %e, "chart install failed");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove an add-on.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. Charts already removed stay
    /// removed.
    pub async fn delete_addon(&self, cluster_id: &str, addon: Addon) -> Result<()> {
        require_id("cluster id", cluster_id)?;
        info!(cluster = %cluster_id, addon = %addon, "deleting add-on");

        for (step, chart) in addon.charts().iter().enumerate() {
            if step > 0 {
                tokio::time::sleep(STEP_PAUSE).await;
            }
            debug!(cluster = %cluster_id, chart = %chart, "deleting chart");
            if let Err(e) = self
                .send(ApiRequest::delete(format!("/v3/clusters/{cluster_id}/addons/{chart}/")))
                .await
            {
                warn!(cluster = %cluster_id, chart = %chart, error = %e, "chart delete failed");
                return Err(e);
            }
        }
        Ok(())
    }

    async fn resolve_chart(&self, cluster_id: &str, source: ChartSource) -> Result<AddonChart> {
        match source {
            ChartSource::Fixed(chart) => Ok(chart),
            ChartSource::Catalogue { key, namespace } => {
                let mut catalogue = self.addon_catalogue(cluster_id).await?;
                let mut chart = catalogue.remove(key).ok_or_else(|| Error::NotFound {
                    kind: "catalogue entry",
                    name: key.to_string(),
                })?;
                if let Some(namespace) = namespace {
                    chart.namespace = namespace.to_string();
                }
                Ok(chart)
            }
        }
    }
}
