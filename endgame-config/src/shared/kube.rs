use serde::{Deserialize, Serialize};

/// How the webhook reaches the Kubernetes API server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubeConfig {
    /// Path to a kubeconfig file.
    ///
    /// When unset the in-cluster service account or the `KUBECONFIG` environment
    /// variable is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig_path: Option<String>,
}
