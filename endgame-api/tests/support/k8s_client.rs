use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use endgame_api::k8s::{ContainerSnapshot, ExecOutput, K8sClient, K8sError, PodSnapshot};

/// Member list of a healthy three member cluster, in `etcdctl member list` format.
pub const THREE_MEMBERS: [&str; 3] = [
    "2e80f96756a54ca9: name=etcd-0 peerURLs=http://etcd-0.etcd:2380 clientURLs=http://etcd-0.etcd:2379 isLeader=false",
    "7fd61f3f79d97779: name=etcd-1 peerURLs=http://etcd-1.etcd:2380 clientURLs=http://etcd-1.etcd:2379 isLeader=true",
    "b429c86e3cd4e077: name=etcd-2 peerURLs=http://etcd-2.etcd:2380 clientURLs=http://etcd-2.etcd:2379 isLeader=false",
];

/// One command executed through [`FakeK8sClient::exec_in_container`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub command: Vec<String>,
}

impl ExecCall {
    pub fn is_member_list(&self) -> bool {
        self.command.ends_with(&["member".to_string(), "list".to_string()])
    }

    /// The member id of a `member remove` call.
    pub fn removed_member(&self) -> Option<&str> {
        match self.command.as_slice() {
            [.., member, remove, id] if member == "member" && remove == "remove" => {
                Some(id.as_str())
            }
            _ => None,
        }
    }
}

/// In-memory stand-in for the cluster.
///
/// Pods are served from a map and `etcdctl` is simulated: `member list` prints
/// the current lines and `member remove` deletes the matching line, failing with
/// etcd's "member not found" error when there is none.
#[derive(Default)]
pub struct FakeK8sClient {
    pods: Mutex<BTreeMap<(String, String), PodSnapshot>>,
    member_lines: Mutex<Vec<String>>,
    member_list_error: Mutex<Option<String>>,
    remove_error: Mutex<Option<String>>,
    ignore_removals: AtomicBool,
    hang_member_list: AtomicBool,
    hang_member_remove: AtomicBool,
    panic_on_pod_lookup: AtomicBool,
    pod_lookups: AtomicUsize,
    exec_calls: Mutex<Vec<ExecCall>>,
}

impl FakeK8sClient {
    pub fn with_members(lines: &[&str]) -> Self {
        let client = Self::default();
        client.set_member_lines(lines);
        client
    }

    pub fn add_pod(&self, pod: PodSnapshot) {
        self.pods
            .lock()
            .unwrap()
            .insert((pod.namespace.clone(), pod.name.clone()), pod);
    }

    pub fn set_member_lines(&self, lines: &[&str]) {
        *self.member_lines.lock().unwrap() = lines.iter().map(|l| l.to_string()).collect();
    }

    pub fn fail_member_list(&self, message: &str) {
        *self.member_list_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_member_remove(&self, message: &str) {
        *self.remove_error.lock().unwrap() = Some(message.to_string());
    }

    /// Makes `member remove` report success without changing the member list,
    /// like a removal that has not propagated yet.
    pub fn ignore_removals(&self) {
        self.ignore_removals.store(true, Ordering::SeqCst);
    }

    /// Makes `member list` never return, like an etcd container that stopped
    /// answering.
    pub fn hang_member_list(&self) {
        self.hang_member_list.store(true, Ordering::SeqCst);
    }

    /// Makes `member remove` never return.
    pub fn hang_member_remove(&self) {
        self.hang_member_remove.store(true, Ordering::SeqCst);
    }

    pub fn panic_on_pod_lookup(&self) {
        self.panic_on_pod_lookup.store(true, Ordering::SeqCst);
    }

    pub fn pod_lookups(&self) -> usize {
        self.pod_lookups.load(Ordering::SeqCst)
    }

    pub fn exec_calls(&self) -> Vec<ExecCall> {
        self.exec_calls.lock().unwrap().clone()
    }

    pub fn member_list_calls(&self) -> usize {
        self.exec_calls()
            .iter()
            .filter(|call| call.is_member_list())
            .count()
    }

    pub fn removed_members(&self) -> Vec<String> {
        self.exec_calls()
            .iter()
            .filter_map(|call| call.removed_member().map(str::to_string))
            .collect()
    }

    fn remove_member(&self, member_id: &str) -> Result<ExecOutput, K8sError> {
        if let Some(message) = self.remove_error.lock().unwrap().clone() {
            return Err(K8sError::ExecFailed { message });
        }

        let mut lines = self.member_lines.lock().unwrap();
        let prefix = format!("{member_id}:");
        let Some(index) = lines.iter().position(|line| line.starts_with(&prefix)) else {
            return Err(K8sError::ExecFailed {
                message: "command terminated with non-zero exit code: Error: etcdserver: member not found".to_string(),
            });
        };

        if !self.ignore_removals.load(Ordering::SeqCst) {
            lines.remove(index);
        }

        Ok(ExecOutput::from_streams(
            &format!("Removed member {member_id} from cluster\n"),
            "",
        ))
    }
}

#[async_trait]
impl K8sClient for FakeK8sClient {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, K8sError> {
        self.pod_lookups.fetch_add(1, Ordering::SeqCst);

        if self.panic_on_pod_lookup.load(Ordering::SeqCst) {
            panic!("pod lookup exploded");
        }

        self.pods
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| K8sError::PodNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn exec_in_container(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, K8sError> {
        let call = ExecCall {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            container: container.to_string(),
            command: command.to_vec(),
        };
        self.exec_calls.lock().unwrap().push(call.clone());

        let hangs = if call.is_member_list() {
            self.hang_member_list.load(Ordering::SeqCst)
        } else {
            self.hang_member_remove.load(Ordering::SeqCst)
        };
        if hangs {
            futures::future::pending::<()>().await;
        }

        if call.is_member_list() {
            if let Some(message) = self.member_list_error.lock().unwrap().clone() {
                return Err(K8sError::ExecFailed { message });
            }
            let stdout = self.member_lines.lock().unwrap().join("\n");
            return Ok(ExecOutput::from_streams(&stdout, ""));
        }

        if let Some(member_id) = call.removed_member() {
            return self.remove_member(member_id);
        }

        Err(K8sError::ExecFailed {
            message: format!("unexpected command {command:?}"),
        })
    }
}

/// A StatefulSet pod in namespace `storage`, optionally running the etcd
/// container with the cluster layout env vars.
pub fn etcd_pod(name: &str, with_etcd_container: bool, terminating: bool) -> PodSnapshot {
    let mut containers = vec![ContainerSnapshot {
        name: "metrics-sidecar".to_string(),
        env: BTreeMap::new(),
    }];

    if with_etcd_container {
        containers.push(ContainerSnapshot {
            name: "etcd".to_string(),
            env: BTreeMap::from([
                ("INITIAL_CLUSTER_SIZE".to_string(), "3".to_string()),
                ("SET_NAME".to_string(), "etcd".to_string()),
            ]),
        });
    }

    PodSnapshot {
        namespace: "storage".to_string(),
        name: name.to_string(),
        containers,
        deletion_timestamp: terminating.then(|| "2024-05-01T10:00:00Z".to_string()),
    }
}
