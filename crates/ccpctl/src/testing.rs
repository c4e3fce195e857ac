//! Routed in-memory transport for command tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use ccp_client::transport::{ApiRequest, ApiResponse, Transport};
use ccp_config::{ControlPlane, Defaults, InfraDefaults, NamedRef, SshDefaults};
use parking_lot::Mutex;

#[derive(Default)]
struct Inner {
    routes: HashMap<String, VecDeque<ApiResponse>>,
    requests: Vec<ApiRequest>,
}

/// Answers by `"METHOD path"`. Each route replays its responses in order and
/// keeps repeating the last one. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct StubTransport {
    inner: Arc<Mutex<Inner>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn login(self, token: &str) -> Self {
        self.push(
            "POST",
            "/v3/system/login",
            ApiResponse {
                status: 200,
                auth_token: Some(token.to_string()),
                body: Vec::new(),
            },
        )
    }

    pub(crate) fn route(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.push(
            method,
            path,
            ApiResponse {
                status,
                auth_token: None,
                body: body.as_bytes().to_vec(),
            },
        )
    }

    pub(crate) fn route_json(
        self,
        method: &str,
        path: &str,
        status: u16,
        body: &serde_json::Value,
    ) -> Self {
        self.route(method, path, status, &body.to_string())
    }

    fn push(self, method: &str, path: &str, response: ApiResponse) -> Self {
        self.inner
            .lock()
            .routes
            .entry(format!("{method} {path}"))
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.inner.lock().requests.clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.inner
            .lock()
            .requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    /// Decoded JSON body of the first request to `"METHOD path"`.
    pub(crate) fn body_of(&self, route: &str) -> Option<serde_json::Value> {
        self.inner
            .lock()
            .requests
            .iter()
            .find(|r| format!("{} {}", r.method, r.path) == route)
            .and_then(|r| r.body.as_deref())
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

impl Transport for StubTransport {
    async fn execute(&self, request: ApiRequest) -> ccp_client::Result<ApiResponse> {
        let key = format!("{} {}", request.method, request.path);
        let mut inner = self.inner.lock();
        inner.requests.push(request);
        let response = match inner.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| ApiResponse {
            status: 404,
            auth_token: None,
            body: format!("no route for {key}").into_bytes(),
        }))
    }
}

/// Defaults with a complete control plane and infrastructure.
pub(crate) fn configured_defaults() -> Defaults {
    Defaults {
        control_plane: ControlPlane {
            name: "lab".into(),
            url: "https://10.10.20.110".into(),
            username: "admin".into(),
            password: "C1sco12345".into(),
            insecure_skip_verify: true,
        },
        ssh: SshDefaults {
            user: "ccpuser".into(),
            key: "ssh-ed25519 AAAA".into(),
        },
        infra: InfraDefaults {
            cluster: "tenant-01".into(),
            vsphere_cluster: "hx-cluster".into(),
            datacenter: "dc1".into(),
            datastore: "ds1".into(),
            network: "VM Network".into(),
            image: "ccp-tenant-image-1.16.3-ubuntu18-6.1.1".into(),
            provider: NamedRef {
                name: "vsphere".into(),
                id: "p-1".into(),
            },
            subnet: NamedRef {
                name: "default-network-subnet".into(),
                id: "s-1".into(),
            },
        },
        ..Defaults::default()
    }
}
