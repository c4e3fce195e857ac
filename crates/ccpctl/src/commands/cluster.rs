//! Cluster command implementation.
//!
//! `cluster create` assembles a request from flags and stored defaults, fills
//! the remaining required values the way the control plane expects, and
//! optionally waits for the cluster to leave `CREATING`.

use std::io::Write;
use std::time::Duration;

use ccp_client::normalize::{DEFAULT_NETWORK_PLUGIN, DEFAULT_POD_CIDR, DEFAULT_WORKER_POOL};
use ccp_client::{
    CancellationToken, Cluster, ClusterDefaults, Infra, NetworkPlugin, NodePool, Transport,
    VSPHERE_PROVIDER, WaitConfig, cluster_from_file, fill_defaults, validate,
};
use ccp_config::Defaults;
use tracing::{info, warn};

use crate::cli::{ClusterCommands, CreateArgs, WaitArgs};
use crate::commands::{cluster_id, cluster_name};
use crate::connection::Connection;
use crate::error::CliError;
use crate::output::{Kubeconfig, Message, OutputFormat};

/// Name given to the master pool of clusters created from flags.
pub const MASTER_POOL: &str = "master-group";

/// Cluster command executor.
pub struct ClusterCommand<'a, T: Transport> {
    conn: &'a Connection<T>,
}

impl<'a, T: Transport> ClusterCommand<'a, T> {
    /// Create a new cluster command.
    pub const fn new(conn: &'a Connection<T>) -> Self {
        Self { conn }
    }

    /// Execute a cluster subcommand. `cancel` interrupts `--wait`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or any control-plane call fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ClusterCommands,
        cancel: &CancellationToken,
    ) -> Result<(), CliError> {
        let client = self.conn.client();
        match command {
            ClusterCommands::List => {
                let clusters = client.list_clusters().await?;
                format.write(writer, &clusters)?;
            }
            ClusterCommands::Get { name, kubeconfig } => {
                let name = cluster_name(name.as_deref(), self.conn.defaults())?;
                if *kubeconfig {
                    let doc = self.kubeconfig(&name).await?;
                    format.write(writer, &doc)?;
                } else {
                    let cluster = client.find_cluster(&name).await?;
                    format.write(writer, &cluster)?;
                }
            }
            ClusterCommands::Create(args) => {
                let cluster = self.create(args, cancel).await?;
                format.write(writer, &cluster)?;
            }
            ClusterCommands::CreateFromFile { path, wait } => {
                let request = cluster_from_file(path).await?;
                let cluster = self.submit(request, wait, cancel).await?;
                format.write(writer, &cluster)?;
            }
            ClusterCommands::Delete { name } => {
                let id = cluster_id(client, name).await?;
                client.delete_cluster(&id).await?;
                let msg = Message::success(format!("Cluster {name} deleted"));
                format.write(writer, &msg)?;
            }
            ClusterCommands::Scale {
                name,
                workers,
                pool,
            } => {
                if *workers < 0 {
                    return Err(CliError::invalid("--workers cannot be negative"));
                }
                let name = cluster_name(name.as_deref(), self.conn.defaults())?;
                let id = cluster_id(client, &name).await?;
                client.scale_cluster(&id, pool, *workers).await?;
                let msg = Message::success(format!(
                    "Pool {pool} of cluster {name} scaled to {workers} node(s)"
                ));
                format.write(writer, &msg)?;
            }
        }
        Ok(())
    }

    async fn kubeconfig(&self, name: &str) -> Result<Kubeconfig, CliError> {
        let client = self.conn.client();
        let id = cluster_id(client, name).await?;
        let cluster = client.get_cluster(&id).await?;
        let kubeconfig = cluster
            .kubeconfig
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CliError::invalid(format!("cluster {name} has no kubeconfig yet")))?;
        Ok(Kubeconfig {
            cluster: name.to_string(),
            kubeconfig,
        })
    }

    async fn create(&self, args: &CreateArgs, cancel: &CancellationToken) -> Result<Cluster, CliError> {
        let request = build_request(args, self.conn.defaults());
        validate::require_fields(&request)?;

        let provider_id = match &request.provider {
            Some(id) => Some(id.clone()),
            None => {
                info!(provider = VSPHERE_PROVIDER, "no provider configured, looking it up");
                self.conn.client().find_provider(VSPHERE_PROVIDER).await?.id
            }
        };
        let defaults = ClusterDefaults {
            provider_id,
            ..ClusterDefaults::default()
        };
        let request = fill_defaults(request, &defaults);
        validate::require_kubernetes_version(&request)?;

        self.submit(request, &args.wait, cancel).await
    }

    async fn submit(
        &self,
        request: Cluster,
        wait: &WaitArgs,
        cancel: &CancellationToken,
    ) -> Result<Cluster, CliError> {
        let client = self.conn.client();
        if !wait.wait {
            return Ok(client.create_cluster(request).await?);
        }

        let config = WaitConfig::with_timeout(wait_timeout(wait.timeout_minutes));
        let cluster = client.create_cluster_and_wait(request, &config, cancel).await?;
        match cluster.status.as_ref() {
            Some(status) if status.as_str() == "READY" => {
                info!(cluster = %cluster.name_or_empty(), "cluster ready");
            }
            status => {
                warn!(cluster = %cluster.name_or_empty(), status = ?status, "cluster finished creating without becoming ready");
            }
        }
        Ok(cluster)
    }
}

/// Maximum wait for `--timeout-minutes`; zero waits forever.
#[must_use]
pub fn wait_timeout(minutes: u64) -> Option<Duration> {
    (minutes > 0).then(|| Duration::from_secs(minutes.saturating_mul(60)))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Assemble a creation request from flags, falling back to stored defaults.
///
/// Pools get one node unless sized by flag. Other values the user and the
/// defaults leave out are left for [`fill_defaults`].
#[must_use]
pub fn build_request(args: &CreateArgs, defaults: &Defaults) -> Cluster {
    let infra = &defaults.infra;
    let image = args.image.clone().or_else(|| non_empty(&infra.image));
    let ssh_user = non_empty(&defaults.ssh.user);
    let ssh_key = non_empty(&defaults.ssh.key);

    let pool = |name: &str, size: Option<i64>| NodePool {
        name: Some(name.to_string()),
        size: Some(size.unwrap_or(1)),
        template: image.clone(),
        ssh_user: ssh_user.clone(),
        ssh_key: ssh_key.clone(),
        ..NodePool::default()
    };

    let networks = if args.networks.is_empty() {
        non_empty(&infra.network).map(|n| vec![n])
    } else {
        Some(args.networks.clone())
    };

    let network_plugin_profile = if args.network_plugin.is_some() || args.pod_cidr.is_some() {
        Some(NetworkPlugin::new(
            args.network_plugin.as_deref().unwrap_or(DEFAULT_NETWORK_PLUGIN),
            args.pod_cidr.as_deref().unwrap_or(DEFAULT_POD_CIDR),
        ))
    } else {
        None
    };

    Cluster {
        provider: args.provider_id.clone().or_else(|| non_empty(&infra.provider.id)),
        subnet_id: args.subnet_id.clone().or_else(|| non_empty(&infra.subnet.id)),
        kubernetes_version: args.kubernetes_version.clone(),
        load_balancer_num: args.load_balancers,
        network_plugin_profile,
        vsphere_infra: Some(Infra {
            datacenter: args.datacenter.clone().or_else(|| non_empty(&infra.datacenter)),
            datastore: args.datastore.clone().or_else(|| non_empty(&infra.datastore)),
            cluster: args
                .vsphere_cluster
                .clone()
                .or_else(|| non_empty(&infra.vsphere_cluster)),
            networks,
            resource_pool: None,
        }),
        master_group: Some(pool(MASTER_POOL, args.masters)),
        node_groups: Some(vec![pool(DEFAULT_WORKER_POOL, args.workers)]),
        ..Cluster::named(&args.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::testing::{StubTransport, configured_defaults};
    use ccp_client::Error;
    use ccp_config::DefaultsStore;
    use serde_json::json;
    use test_case::test_case;

    fn connect(stub: &StubTransport, defaults: Defaults) -> Connection<StubTransport> {
        let mut defaults = defaults;
        defaults.record_session("tok", chrono::Utc::now());
        Connection::with_transport(
            stub.clone(),
            DefaultsStore::at("/nonexistent/ccpctl.json"),
            defaults,
        )
        .unwrap()
    }

    fn create_args(name: &str) -> CreateArgs {
        CreateArgs {
            name: name.into(),
            ..CreateArgs::default()
        }
    }

    async fn run(
        conn: &Connection<StubTransport>,
        format: Format,
        command: ClusterCommands,
    ) -> Result<String, CliError> {
        let mut out = Vec::new();
        ClusterCommand::new(conn)
            .execute(
                &mut out,
                &OutputFormat::new(format),
                &command,
                &CancellationToken::new(),
            )
            .await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn build_request_uses_stored_defaults() {
        let request = build_request(&create_args("tenant-02"), &configured_defaults());

        assert_eq!(request.name.as_deref(), Some("tenant-02"));
        assert_eq!(request.provider.as_deref(), Some("p-1"));
        assert_eq!(request.subnet_id.as_deref(), Some("s-1"));
        let infra = request.vsphere_infra.as_ref().unwrap();
        assert_eq!(infra.datacenter.as_deref(), Some("dc1"));
        assert_eq!(infra.cluster.as_deref(), Some("hx-cluster"));
        assert_eq!(infra.networks, Some(vec!["VM Network".to_string()]));

        let master = request.master_group.as_ref().unwrap();
        assert_eq!(master.name.as_deref(), Some(MASTER_POOL));
        assert_eq!(master.ssh_user.as_deref(), Some("ccpuser"));
        assert_eq!(master.size, Some(1));
        assert!(request.network_plugin_profile.is_none());
        assert!(request.kubernetes_version.is_none());
    }

    #[test]
    fn build_request_flags_override_defaults() {
        let args = CreateArgs {
            image: Some("ccp-tenant-image-1.15.3-ubuntu18-5.0.0".into()),
            workers: Some(4),
            masters: Some(3),
            datacenter: Some("dc2".into()),
            networks: vec!["a".into(), "b".into()],
            provider_id: Some("p-2".into()),
            pod_cidr: Some("10.0.0.0/16".into()),
            ..create_args("tenant-02")
        };
        let request = build_request(&args, &configured_defaults());

        assert_eq!(request.provider.as_deref(), Some("p-2"));
        let infra = request.vsphere_infra.as_ref().unwrap();
        assert_eq!(infra.datacenter.as_deref(), Some("dc2"));
        assert_eq!(infra.networks.as_deref().unwrap(), ["a", "b"]);
        assert_eq!(request.master_group.as_ref().unwrap().size, Some(3));
        let workers = &request.node_groups.as_ref().unwrap()[0];
        assert_eq!(workers.size, Some(4));
        assert_eq!(
            workers.template.as_deref(),
            Some("ccp-tenant-image-1.15.3-ubuntu18-5.0.0")
        );
        assert_eq!(request.network_plugin_name(), Some(DEFAULT_NETWORK_PLUGIN));
    }

    #[test_case(0 => None; "zero waits forever")]
    #[test_case(1 => Some(Duration::from_secs(60)); "one minute")]
    #[test_case(90 => Some(Duration::from_secs(5400)); "ninety minutes")]
    fn wait_timeout_minutes(minutes: u64) -> Option<Duration> {
        wait_timeout(minutes)
    }

    #[tokio::test]
    async fn create_fills_and_submits() {
        let stub = StubTransport::new().route_json(
            "POST",
            "/v3/clusters/",
            201,
            &json!({"id": "c-2", "name": "tenant-02", "status": "CREATING"}),
        );
        let conn = connect(&stub, configured_defaults());

        let args = CreateArgs {
            workers: Some(2),
            ..create_args("tenant-02")
        };
        let output = run(&conn, Format::Json, ClusterCommands::Create(args))
            .await
            .unwrap();
        let created: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(created["status"], "CREATING");

        assert_eq!(stub.paths(), vec!["POST /v3/clusters/"]);
        let body = stub.body_of("POST /v3/clusters/").unwrap();
        assert_eq!(body["provider"], "p-1");
        assert_eq!(body["kubernetes_version"], "1.16.3");
        assert_eq!(body["node_groups"][0]["size"], 2);
        assert_eq!(body["node_groups"][0]["kubernetes_version"], "1.16.3");
        assert_eq!(body["master_group"]["size"], 1);
        assert_eq!(body["network_plugin_profile"]["name"], "calico");
        assert_eq!(body["load_balancer_num"], 2);
        assert_eq!(body["ip_allocation_method"], "ccpnet");
    }

    #[tokio::test]
    async fn create_looks_up_vsphere_provider_when_unset() {
        let stub = StubTransport::new()
            .route_json(
                "GET",
                "/v3/providers",
                200,
                &json!([{"id": "p-7", "name": "vsphere", "type": "vsphere"}]),
            )
            .route_json("POST", "/v3/clusters/", 201, &json!({"id": "c-2", "name": "tenant-02"}));
        let mut defaults = configured_defaults();
        defaults.infra.provider = ccp_config::NamedRef::default();
        let conn = connect(&stub, defaults);

        run(&conn, Format::Table, ClusterCommands::Create(create_args("tenant-02")))
            .await
            .unwrap();

        assert_eq!(stub.paths(), vec!["GET /v3/providers", "POST /v3/clusters/"]);
        assert_eq!(stub.body_of("POST /v3/clusters/").unwrap()["provider"], "p-7");
    }

    #[tokio::test]
    async fn create_without_ssh_fails_before_any_request() {
        let stub = StubTransport::new();
        let mut defaults = configured_defaults();
        defaults.ssh.key.clear();
        let conn = connect(&stub, defaults);

        let err = run(&conn, Format::Table, ClusterCommands::Create(create_args("tenant-02")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid request: master_group.ssh_key is missing");
        assert!(stub.paths().is_empty());
    }

    #[tokio::test]
    async fn create_with_underivable_version_is_rejected() {
        let stub = StubTransport::new();
        let conn = connect(&stub, configured_defaults());
        let args = CreateArgs {
            image: Some("custom-template".into()),
            ..create_args("tenant-02")
        };

        let err = run(&conn, Format::Table, ClusterCommands::Create(args))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Client(Error::Validation { ref field, .. }) if field == "kubernetes_version"
        ));
        assert!(stub.paths().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn create_and_wait_polls_until_ready() {
        let stub = StubTransport::new()
            .route_json(
                "POST",
                "/v3/clusters/",
                201,
                &json!({"id": "c-2", "name": "tenant-02", "status": "CREATING"}),
            )
            .route_json(
                "GET",
                "/v3/clusters",
                200,
                &json!([{"id": "c-2", "name": "tenant-02", "status": "CREATING"}]),
            )
            .route_json(
                "GET",
                "/v3/clusters",
                200,
                &json!([{"id": "c-2", "name": "tenant-02", "status": "READY"}]),
            );
        let conn = connect(&stub, configured_defaults());
        let args = CreateArgs {
            wait: WaitArgs {
                wait: true,
                timeout_minutes: 5,
            },
            ..create_args("tenant-02")
        };

        let output = run(&conn, Format::Json, ClusterCommands::Create(args))
            .await
            .unwrap();
        let cluster: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(cluster["status"], "READY");
        assert_eq!(
            stub.paths(),
            vec!["POST /v3/clusters/", "GET /v3/clusters", "GET /v3/clusters"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_cancelled_by_token() {
        let stub = StubTransport::new()
            .route_json(
                "POST",
                "/v3/clusters/",
                201,
                &json!({"id": "c-2", "name": "tenant-02", "status": "CREATING"}),
            )
            .route_json(
                "GET",
                "/v3/clusters",
                200,
                &json!([{"id": "c-2", "name": "tenant-02", "status": "CREATING"}]),
            );
        let conn = connect(&stub, configured_defaults());
        let args = CreateArgs {
            wait: WaitArgs {
                wait: true,
                timeout_minutes: 0,
            },
            ..create_args("tenant-02")
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut out = Vec::new();
        let err = ClusterCommand::new(&conn)
            .execute(
                &mut out,
                &OutputFormat::default(),
                &ClusterCommands::Create(args),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Client(Error::Cancelled { .. })));
    }

    #[tokio::test]
    async fn get_kubeconfig_fetches_by_id() {
        let stub = StubTransport::new()
            .route_json("GET", "/v3/clusters", 200, &json!([{"id": "c-1", "name": "tenant-01"}]))
            .route_json(
                "GET",
                "/v3/clusters/c-1",
                200,
                &json!({"id": "c-1", "name": "tenant-01", "kubeconfig": "apiVersion: v1\n"}),
            );
        let conn = connect(&stub, configured_defaults());

        let output = run(
            &conn,
            Format::Table,
            ClusterCommands::Get {
                name: None,
                kubeconfig: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(output, "apiVersion: v1\n");
    }

    #[tokio::test]
    async fn delete_resolves_name() {
        let stub = StubTransport::new()
            .route_json("GET", "/v3/clusters", 200, &json!([{"id": "c-1", "name": "tenant-01"}]))
            .route("DELETE", "/v3/clusters/c-1/", 204, "");
        let conn = connect(&stub, configured_defaults());

        let output = run(
            &conn,
            Format::Table,
            ClusterCommands::Delete {
                name: "tenant-01".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(output, "✓ Cluster tenant-01 deleted\n");
        assert_eq!(stub.paths(), vec!["GET /v3/clusters", "DELETE /v3/clusters/c-1/"]);
    }

    #[tokio::test]
    async fn scale_patches_pool() {
        let stub = StubTransport::new()
            .route_json("GET", "/v3/clusters", 200, &json!([{"id": "c-1", "name": "tenant-01"}]))
            .route_json(
                "PATCH",
                "/v3/clusters/c-1/node-pools/node-group/",
                200,
                &json!({"id": "c-1", "name": "tenant-01"}),
            );
        let conn = connect(&stub, configured_defaults());

        run(
            &conn,
            Format::Table,
            ClusterCommands::Scale {
                name: Some("tenant-01".into()),
                workers: 5,
                pool: DEFAULT_WORKER_POOL.into(),
            },
        )
        .await
        .unwrap();

        let body = stub
            .body_of("PATCH /v3/clusters/c-1/node-pools/node-group/")
            .unwrap();
        assert_eq!(body, json!({"name": "node-group", "size": 5}));
    }

    #[tokio::test]
    async fn scale_rejects_negative_workers() {
        let stub = StubTransport::new();
        let conn = connect(&stub, configured_defaults());
        let err = run(
            &conn,
            Format::Table,
            ClusterCommands::Scale {
                name: None,
                workers: -1,
                pool: DEFAULT_WORKER_POOL.into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
        assert!(stub.paths().is_empty());
    }

    #[tokio::test]
    async fn list_reports_transport_errors() {
        let stub = StubTransport::new().route("GET", "/v3/clusters", 500, "database unavailable");
        let conn = connect(&stub, configured_defaults());

        let err = run(&conn, Format::Table, ClusterCommands::List)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database unavailable"));
    }
}
