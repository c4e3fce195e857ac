//! Required-field checks for cluster creation requests.
//!
//! Checks run in a fixed order and stop at the first missing field, so the
//! error always names the same field for the same request.

use crate::error::{Error, Result};
use crate::model::{Cluster, NodePool};

type ClusterCheck = (&'static str, fn(&Cluster) -> bool);
type PoolCheck = (&'static str, fn(&NodePool) -> bool);

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn master(cluster: &Cluster) -> Option<&NodePool> {
    cluster.master_group.as_ref()
}

const CLUSTER_CHECKS: &[ClusterCheck] = &[
    ("name", |c| present(c.name.as_deref())),
    ("vsphere_infra.datacenter", |c| {
        present(c.vsphere_infra.as_ref().and_then(|i| i.datacenter.as_deref()))
    }),
    ("master_group.ssh_user", |c| {
        present(master(c).and_then(|m| m.ssh_user.as_deref()))
    }),
    ("master_group.ssh_key", |c| {
        present(master(c).and_then(|m| m.ssh_key.as_deref()))
    }),
    ("node_groups", |c| c.node_groups.as_ref().is_some_and(|g| !g.is_empty())),
];

const WORKER_CHECKS: &[PoolCheck] = &[
    ("ssh_user", |p| present(p.ssh_user.as_deref())),
    ("ssh_key", |p| present(p.ssh_key.as_deref())),
    ("size", |p| p.size.is_some_and(|s| s > 0)),
    ("template", |p| present(p.template.as_deref())),
];

const MASTER_CHECKS: &[ClusterCheck] = &[
    ("master_group.size", |c| master(c).and_then(|m| m.size).is_some_and(|s| s > 0)),
    ("master_group.template", |c| {
        present(master(c).and_then(|m| m.template.as_deref()))
    }),
];

/// Check that a creation request carries every required field.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first missing field.
pub fn require_fields(cluster: &Cluster) -> Result<()> {
    for (field, check) in CLUSTER_CHECKS {
        if !check(cluster) {
            return Err(Error::missing(*field));
        }
    }
    for (index, pool) in cluster.node_groups.iter().flatten().enumerate() {
        for (field, check) in WORKER_CHECKS {
            if !check(pool) {
                return Err(Error::missing(format!("node_groups[{index}].{field}")));
            }
        }
    }
    for (field, check) in MASTER_CHECKS {
        if !check(cluster) {
            return Err(Error::missing(*field));
        }
    }
    Ok(())
}

/// Check that a Kubernetes version is set, typically after defaults were filled.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the version is absent or empty.
pub fn require_kubernetes_version(cluster: &Cluster) -> Result<()> {
    if present(cluster.kubernetes_version.as_deref()) {
        return Ok(());
    }
    Err(Error::Validation {
        field: "kubernetes_version".to_string(),
        reason: "is missing and could not be derived from master_group.template".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Infra;
    use test_case::test_case;

    fn pool() -> NodePool {
        NodePool {
            name: Some("node-group".into()),
            size: Some(1),
            template: Some("ccp-tenant-image-1.16.3-ubuntu18-6.1.1".into()),
            ssh_user: Some("ccpuser".into()),
            ssh_key: Some("ssh-ed25519 AAAA".into()),
            ..NodePool::default()
        }
    }

    fn complete() -> Cluster {
        Cluster {
            name: Some("tenant-01".into()),
            vsphere_infra: Some(Infra {
                datacenter: Some("dc1".into()),
                ..Infra::default()
            }),
            master_group: Some(pool()),
            node_groups: Some(vec![pool()]),
            ..Cluster::default()
        }
    }

    fn field_of(err: Error) -> String {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_complete_request_passes() {
        assert!(require_fields(&complete()).is_ok());
    }

    #[test_case(|c: &mut Cluster| c.name = None, "name" ; "name")]
    #[test_case(|c: &mut Cluster| c.name = Some(String::new()), "name" ; "empty name")]
    #[test_case(|c: &mut Cluster| c.vsphere_infra = None, "vsphere_infra.datacenter" ; "no infra")]
    #[test_case(|c: &mut Cluster| { if let Some(m) = c.master_group.as_mut() { m.ssh_user = None } }, "master_group.ssh_user" ; "master ssh user")]
    #[test_case(|c: &mut Cluster| { if let Some(m) = c.master_group.as_mut() { m.ssh_key = None } }, "master_group.ssh_key" ; "master ssh key")]
    #[test_case(|c: &mut Cluster| c.node_groups = Some(vec![]), "node_groups" ; "no workers")]
    #[test_case(|c: &mut Cluster| { if let Some(g) = c.node_groups.as_mut() { g[0].size = None } }, "node_groups[0].size" ; "worker size")]
    #[test_case(|c: &mut Cluster| { if let Some(g) = c.node_groups.as_mut() { g[0].template = None } }, "node_groups[0].template" ; "worker template")]
    #[test_case(|c: &mut Cluster| { if let Some(m) = c.master_group.as_mut() { m.size = None } }, "master_group.size" ; "master size")]
    #[test_case(|c: &mut Cluster| { if let Some(m) = c.master_group.as_mut() { m.template = None } }, "master_group.template" ; "master template")]
    fn test_missing_field_is_named(mutate: fn(&mut Cluster), field: &str) {
        let mut cluster = complete();
        mutate(&mut cluster);
        assert_eq!(field_of(require_fields(&cluster).unwrap_err()), field);
    }

    #[test]
    fn test_first_missing_field_wins() {
        let mut cluster = complete();
        cluster.name = None;
        if let Some(m) = cluster.master_group.as_mut() {
            m.template = None;
        }
        assert_eq!(field_of(require_fields(&cluster).unwrap_err()), "name");
    }

    #[test]
    fn test_second_worker_pool_is_indexed() {
        let mut cluster = complete();
        let mut broken = pool();
        broken.ssh_key = None;
        cluster.node_groups = Some(vec![pool(), broken]);
        assert_eq!(
            field_of(require_fields(&cluster).unwrap_err()),
            "node_groups[1].ssh_key"
        );
    }

    #[test]
    fn test_kubernetes_version_required() {
        let mut cluster = complete();
        assert!(require_kubernetes_version(&cluster).is_err());
        cluster.kubernetes_version = Some("1.16.3".into());
        assert!(require_kubernetes_version(&cluster).is_ok());
    }
}
