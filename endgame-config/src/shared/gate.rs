use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::ValidationError;

/// Default name of the container running the etcd process.
pub const DEFAULT_CONTAINER_NAME: &str = "etcd";

/// Default upper bound for a single remote exec call, in seconds.
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 10;

/// Behaviour of the termination gate itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Name of the container that identifies a pod as an etcd member.
    #[serde(default = "default_container_name")]
    pub container_name: String,
    /// Upper bound for each `etcdctl` invocation inside the container.
    ///
    /// The API server waits on the webhook while this runs, so it must stay well
    /// below the webhook's own `timeoutSeconds`.
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,
}

impl GateConfig {
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.container_name.trim().is_empty() {
            return Err(ValidationError::EmptyContainerName);
        }

        if self.exec_timeout_secs == 0 {
            return Err(ValidationError::ExecTimeoutZero);
        }

        Ok(())
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            container_name: default_container_name(),
            exec_timeout_secs: default_exec_timeout_secs(),
        }
    }
}

fn default_container_name() -> String {
    DEFAULT_CONTAINER_NAME.to_string()
}

fn default_exec_timeout_secs() -> u64 {
    DEFAULT_EXEC_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: GateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.container_name, "etcd");
        assert_eq!(config.exec_timeout(), Duration::from_secs(10));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_blank_container_name_and_zero_timeout() {
        let config = GateConfig {
            container_name: "  ".to_string(),
            ..GateConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyContainerName));

        let config = GateConfig {
            exec_timeout_secs: 0,
            ..GateConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::ExecTimeoutZero));
    }
}
