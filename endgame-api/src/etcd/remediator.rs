use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::etcd::{EtcdctlCommand, MemberTarget};
use crate::k8s::{K8sClient, K8sError};

/// Fragments of `etcdctl` errors meaning the member is already gone.
const MEMBER_ABSENT_MARKERS: [&str; 2] = ["member not found", "couldn't find a member"];

/// What happened to a `member remove` call.
///
/// The outcome is only logged and counted. The verdict of the call that
/// triggered the removal is already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    /// etcd did not know the member. Removing twice is harmless.
    AlreadyAbsent,
    Failed(String),
}

impl RemovalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalOutcome::Removed => "removed",
            RemovalOutcome::AlreadyAbsent => "already_absent",
            RemovalOutcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for RemovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            outcome => f.write_str(outcome.as_str()),
        }
    }
}

/// Removes a single member from the etcd cluster from inside the role container.
#[derive(Clone)]
pub struct MemberRemediator {
    k8s_client: Arc<dyn K8sClient>,
    etcdctl: EtcdctlCommand,
    exec_timeout: Duration,
}

impl MemberRemediator {
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

    /// Runs `member remove` for `member_id`. Never fails: errors are folded into
    /// [`RemovalOutcome::Failed`] since the next admission call re-probes anyway.
    pub async fn remove(&self, target: MemberTarget<'_>, member_id: &str) -> RemovalOutcome {
        let command = self.etcdctl.member_remove(target.container, member_id);

        let result = target
            .exec(self.k8s_client.as_ref(), &command, self.exec_timeout)
            .await;

        let outcome = match result {
            Ok(output) if mentions_absent_member(&output.stderr) => RemovalOutcome::AlreadyAbsent,
            Ok(_) => RemovalOutcome::Removed,
            Err(K8sError::ExecFailed { message }) if mentions_absent_member([&message]) => {
                RemovalOutcome::AlreadyAbsent
            }
            Err(err) => RemovalOutcome::Failed(err.to_string()),
        };

        match &outcome {
            RemovalOutcome::Failed(reason) => warn!(
                namespace = target.namespace,
                pod = target.pod,
                member_id,
                reason = %reason,
                "failed to remove etcd member"
            ),
            outcome => info!(
                namespace = target.namespace,
                pod = target.pod,
                member_id,
                outcome = outcome.as_str(),
                "etcd member removal finished"
            ),
        }

        outcome
    }
}

fn mentions_absent_member<I, S>(lines: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines.into_iter().any(|line| {
        let line = line.as_ref().to_lowercase();
        MEMBER_ABSENT_MARKERS
            .iter()
            .any(|marker| line.contains(marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_absent_member_errors() {
        assert!(mentions_absent_member([
            "Error: etcdserver: member not found"
        ]));
        assert!(mentions_absent_member([
            "Couldn't find a member in the cluster with an ID of b429c86e3cd4e077."
        ]));
        assert!(!mentions_absent_member([
            "Error: context deadline exceeded"
        ]));
        assert!(!mentions_absent_member(Vec::<String>::new()));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(RemovalOutcome::Removed.to_string(), "removed");
        assert_eq!(RemovalOutcome::AlreadyAbsent.to_string(), "already_absent");
        assert_eq!(
            RemovalOutcome::Failed("timeout".to_string()).to_string(),
            "failed: timeout"
        );
    }
}
