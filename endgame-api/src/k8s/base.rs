use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Errors emitted by the Kubernetes integration.
#[derive(Debug, Error)]
pub enum K8sError {
    /// The pod named in the admission request does not exist (anymore).
    #[error("pod {namespace}/{name} was not found")]
    PodNotFound { namespace: String, name: String },

    /// The kubeconfig file could not be read or resolved.
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// An error returned by the [`kube`] client when talking to the API server.
    #[error("An error occurred with kube when dealing with K8s: {0}")]
    Kube(#[from] kube::Error),

    /// Reading the output streams of a remote command failed.
    #[error("An io error occurred while reading remote command output: {0}")]
    Io(#[from] std::io::Error),

    /// The remote command did not finish within the configured bound.
    #[error("remote command did not complete within {timeout:?}")]
    ExecTimeout { timeout: Duration },

    /// The remote command ran but reported a non-success status, e.g. a
    /// non-zero exit code.
    #[error("remote command failed: {message}")]
    ExecFailed { message: String },
}

/// The subset of a pod the gate reasons about.
///
/// Built fresh from the API server on every admission call and dropped at the
/// end of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodSnapshot {
    pub namespace: String,
    pub name: String,
    pub containers: Vec<ContainerSnapshot>,
    /// Set once the pod is terminating. Its presence tells the final purge
    /// call apart from the first delete request.
    pub deletion_timestamp: Option<String>,
}

impl PodSnapshot {
    /// Returns the container called `name`, if the pod has one.
    pub fn container(&self, name: &str) -> Option<&ContainerSnapshot> {
        self.containers.iter().find(|c| c.name == name)
    }

    pub fn is_terminating(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}

/// A container of a [`PodSnapshot`] with its literal environment variables.
///
/// Variables sourced from config maps, secrets or field references have no
/// literal value and are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSnapshot {
    pub name: String,
    pub env: BTreeMap<String, String>,
}

/// Captured output of a command executed inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ExecOutput {
    /// Splits raw stream contents into non-empty lines.
    pub fn from_streams(stdout: &str, stderr: &str) -> Self {
        Self {
            stdout: split_lines(stdout),
            stderr: split_lines(stderr),
        }
    }
}

fn split_lines(stream: &str) -> Vec<String> {
    stream
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The Kubernetes operations the webhook depends on.
#[async_trait]
pub trait K8sClient: Send + Sync {
    /// Retrieves the pod `namespace/name`.
    ///
    /// Returns [`K8sError::PodNotFound`] when the API server answers with a 404.
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, K8sError>;

    /// Runs `command` in `container` of pod `namespace/pod` and waits for it to
    /// finish.
    ///
    /// Implementations report a non-zero exit as [`K8sError::ExecFailed`].
    /// Callers in [`crate::etcd`] bound every call with the gate's exec timeout.
    async fn exec_in_container(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, K8sError>;
}
