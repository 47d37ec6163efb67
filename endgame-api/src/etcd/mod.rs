//! Interaction with the etcd process running inside the role container.
//!
//! Everything here goes through `etcdctl` executed over the Kubernetes exec
//! subresource: [`MembershipProber`] reads the member list and
//! [`MemberRemediator`] removes a single member.

mod command;
mod members;
mod prober;
mod remediator;

pub use command::*;
pub use members::*;
pub use prober::*;
pub use remediator::*;

use std::time::Duration;

use crate::k8s::{ContainerSnapshot, ExecOutput, K8sClient, K8sError};

/// The container a command is executed in.
#[derive(Debug, Clone, Copy)]
pub struct MemberTarget<'a> {
    pub namespace: &'a str,
    pub pod: &'a str,
    pub container: &'a ContainerSnapshot,
}

impl MemberTarget<'_> {
    /// Runs `command` in the target container, giving up after `timeout`.
    async fn exec(
        &self,
        k8s_client: &dyn K8sClient,
        command: &[String],
        timeout: Duration,
    ) -> Result<ExecOutput, K8sError> {
        tokio::time::timeout(
            timeout,
            k8s_client.exec_in_container(self.namespace, self.pod, &self.container.name, command),
        )
        .await
        .map_err(|_| K8sError::ExecTimeout { timeout })?
    }
}
