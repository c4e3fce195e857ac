//! Add-on charts, the per-cluster catalogue, and installed add-ons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A Helm chart offered as an add-on. Also the body of an install request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonChart {
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
    /// Chart name, also the path segment used to delete it.
    #[serde(default)]
    pub name: String,
    /// Target namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Chart location on the control plane.
    #[serde(default)]
    pub url: String,
    /// Charts that cannot be installed alongside this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
    /// Charts installed on top of this one, keyed by catalogue key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, AddonChart>,
    /// Values files applied on install.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub override_files: Vec<String>,
    /// Inline values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<String>,
}

/// Catalogue published at `/v3/clusters/{id}/catalog`, keyed by `_ccp-*`.
pub type AddonCatalogue = BTreeMap<String, AddonChart>;

/// Page of installed add-ons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstalledAddons {
    /// Total installed add-ons.
    #[serde(default)]
    pub count: i64,
    /// Next page marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<serde_json::Value>,
    /// Previous page marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<serde_json::Value>,
    /// Installed add-ons.
    #[serde(default)]
    pub results: Vec<InstalledAddon>,
}

/// An add-on installed on a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledAddon {
    /// Chart name.
    #[serde(default)]
    pub name: String,
    /// Namespace.
    #[serde(default)]
    pub namespace: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Deployment status.
    #[serde(default)]
    pub status: AddonStatus,
}

/// Deployment status of an installed add-on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonStatus {
    /// Release name.
    #[serde(default)]
    pub name: String,
    /// Helm release status.
    #[serde(default)]
    pub helm_status: String,
    /// Overall status.
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_deserialize() {
        let body = r#"{
            "_ccp-hxcsi": {
                "name": "ccp-hxcsi",
                "displayName": "HyperFlex CSI",
                "description": "HX CSI",
                "url": "/opt/ccp/charts/ccp-hxcsi.tgz",
                "overrides": "hx: {}"
            },
            "_ccp-istio-operator": {
                "name": "ccp-istio-operator",
                "displayName": "Istio Operator",
                "namespace": "ccp",
                "conflicts": ["ccp-kubeflow"],
                "dependencies": {
                    "_ccp-istio": {"name": "ccp-istio-cr", "namespace": "ccp"}
                }
            }
        }"#;
        let catalogue: AddonCatalogue = serde_json::from_str(body).expect("deserialize");
        let hx = &catalogue["_ccp-hxcsi"];
        assert!(hx.namespace.is_empty());
        assert_eq!(hx.overrides.as_deref(), Some("hx: {}"));
        let istio = &catalogue["_ccp-istio-operator"];
        assert_eq!(istio.dependencies["_ccp-istio"].name, "ccp-istio-cr");
    }

    #[test]
    fn test_chart_serializes_camel_case() {
        let chart = AddonChart {
            display_name: "Dashboard".into(),
            name: "kubernetes-dashboard".into(),
            override_files: vec!["/opt/ccp/charts/kubernetes-dashboard.yaml".into()],
            ..AddonChart::default()
        };
        let json = serde_json::to_value(&chart).expect("serialize");
        assert_eq!(json["displayName"], "Dashboard");
        assert_eq!(json["overrideFiles"][0], "/opt/ccp/charts/kubernetes-dashboard.yaml");
        assert!(json.get("namespace").is_none());
        assert!(json.get("conflicts").is_none());
    }

    #[test]
    fn test_installed_addons_deserialize() {
        let body = r#"{
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "name": "ccp-monitor",
                "namespace": "ccp",
                "displayName": "Monitoring",
                "description": "Monitoring",
                "status": {"name": "ccp-monitor", "helmStatus": "DEPLOYED", "status": "OK"}
            }]
        }"#;
        let installed: InstalledAddons = serde_json::from_str(body).expect("deserialize");
        assert_eq!(installed.count, 1);
        assert_eq!(installed.results[0].status.helm_status, "DEPLOYED");
    }
}
