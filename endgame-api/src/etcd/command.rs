use endgame_config::shared::EtcdctlConfig;
use std::collections::BTreeMap;

use crate::k8s::ContainerSnapshot;

/// Env var holding the number of replicas the cluster was bootstrapped with.
pub const INITIAL_CLUSTER_SIZE_ENV: &str = "INITIAL_CLUSTER_SIZE";

/// Env var holding the StatefulSet (and headless service) name.
pub const SET_NAME_ENV: &str = "SET_NAME";

/// Builds the `etcdctl` invocations run inside the role container.
#[derive(Debug, Clone)]
pub struct EtcdctlCommand {
    config: EtcdctlConfig,
}

impl EtcdctlCommand {
    pub fn new(config: EtcdctlConfig) -> Self {
        Self { config }
    }

    /// `etcdctl [--endpoints ...] member list`
    pub fn member_list(&self, container: &ContainerSnapshot) -> Vec<String> {
        let mut command = self.base(container);
        command.extend(["member".to_string(), "list".to_string()]);
        command
    }

    /// `etcdctl [--endpoints ...] member remove <id>`
    pub fn member_remove(&self, container: &ContainerSnapshot, member_id: &str) -> Vec<String> {
        let mut command = self.base(container);
        command.extend([
            "member".to_string(),
            "remove".to_string(),
            member_id.to_string(),
        ]);
        command
    }

    fn base(&self, container: &ContainerSnapshot) -> Vec<String> {
        let mut command = vec![self.config.binary.clone()];
        if let Some(endpoints) = cluster_endpoints(&container.env, &self.config) {
            command.extend(["--endpoints".to_string(), endpoints]);
        }
        command
    }
}

/// Derives the client endpoints of every member from the StatefulSet layout
/// advertised in the container environment.
///
/// With `INITIAL_CLUSTER_SIZE=3` and `SET_NAME=etcd` this yields
/// `http://etcd-0.etcd:2379,http://etcd-1.etcd:2379,http://etcd-2.etcd:2379`.
/// Returns `None` when either variable is missing or the size is not a positive
/// integer, in which case `etcdctl` falls back to its local default endpoint.
pub fn cluster_endpoints(
    env: &BTreeMap<String, String>,
    config: &EtcdctlConfig,
) -> Option<String> {
    let size: usize = env.get(INITIAL_CLUSTER_SIZE_ENV)?.trim().parse().ok()?;
    let set_name = env.get(SET_NAME_ENV)?.trim();
    if size == 0 || set_name.is_empty() {
        return None;
    }

    let endpoints = (0..size)
        .map(|ordinal| {
            format!(
                "{}://{set_name}-{ordinal}.{set_name}:{}",
                config.endpoint_scheme, config.client_port
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    Some(endpoints)
}
