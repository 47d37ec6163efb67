use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// How `etcdctl` is invoked inside the etcd container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtcdctlConfig {
    /// Binary name or absolute path of `etcdctl` in the container image.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// URL scheme used when endpoints are derived from the StatefulSet layout.
    #[serde(default = "default_endpoint_scheme")]
    pub endpoint_scheme: String,
    /// Client port of every member.
    #[serde(default = "default_client_port")]
    pub client_port: u16,
}

impl EtcdctlConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.binary.trim().is_empty() {
            return Err(ValidationError::EmptyEtcdctlBinary);
        }

        Ok(())
    }
}

impl Default for EtcdctlConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            endpoint_scheme: default_endpoint_scheme(),
            client_port: default_client_port(),
        }
    }
}

fn default_binary() -> String {
    "etcdctl".to_string()
}

fn default_endpoint_scheme() -> String {
    "http".to_string()
}

fn default_client_port() -> u16 {
    2379
}
