use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

use crate::etcd::{EtcdctlCommand, MemberTarget, MembershipSnapshot, parse_member_list};
use crate::k8s::{K8sClient, K8sError};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to list etcd members from {namespace}/{pod}: {source}")]
    Exec {
        namespace: String,
        pod: String,
        #[source]
        source: K8sError,
    },
}

/// Reads the live etcd membership list from inside the role container.
///
/// There is no retry here: a failed probe is reported to the caller, and the
/// API server retrying the deletion is what drives the next attempt.
#[derive(Clone)]
pub struct MembershipProber {
    k8s_client: Arc<dyn K8sClient>,
    etcdctl: EtcdctlCommand,
    exec_timeout: Duration,
}

impl MembershipProber {
    pub fn new(
        k8s_client: Arc<dyn K8sClient>,
        etcdctl: EtcdctlCommand,
        exec_timeout: Duration,
    ) -> Self {
        Self {
            k8s_client,
            etcdctl,
            exec_timeout,
        }
    }

    pub async fn probe(&self, target: MemberTarget<'_>) -> Result<MembershipSnapshot, ProbeError> {
        let command = self.etcdctl.member_list(target.container);

        let output = target
            .exec(self.k8s_client.as_ref(), &command, self.exec_timeout)
            .await
            .map_err(|source| ProbeError::Exec {
                namespace: target.namespace.to_string(),
                pod: target.pod.to_string(),
                source,
            })?;

        trace!(
            namespace = target.namespace,
            pod = target.pod,
            stdout = ?output.stdout,
            stderr = ?output.stderr,
            "member list output"
        );

        let snapshot = parse_member_list(&output.stdout);
        debug!(
            pod = target.pod,
            members = snapshot.len(),
            "probed etcd membership"
        );

        Ok(snapshot)
    }
}
