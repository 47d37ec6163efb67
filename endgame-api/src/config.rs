use endgame_config::Config;
use endgame_config::shared::{
    EtcdctlConfig, GateConfig, KubeConfig, SentryConfig, TlsConfig, ValidationError,
};
use serde::Deserialize;
use std::fmt;

/// Complete configuration of the webhook service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// HTTP server settings.
    pub application: ApplicationSettings,
    /// Gate behaviour.
    #[serde(default)]
    pub gate: GateConfig,
    /// How `etcdctl` is run inside the etcd container.
    #[serde(default)]
    pub etcdctl: EtcdctlConfig,
    /// Kubernetes client settings.
    #[serde(default)]
    pub kube: KubeConfig,
    /// Optional Sentry configuration for error tracking.
    pub sentry: Option<SentryConfig>,
}

impl Config for ApiConfig {}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.application.tls.validate()?;
        self.gate.validate()?;
        self.etcdctl.validate()
    }
}

/// HTTP server configuration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Host address the webhook listens on.
    pub host: String,
    /// Port number the webhook listens on.
    pub port: u16,
    /// Certificate and key served to the API server.
    pub tls: TlsConfig,
}

impl fmt::Display for ApplicationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    host: {}", self.host)?;
        writeln!(f, "    port: {}", self.port)?;
        writeln!(f, "    tls: {}", self.tls.enabled)
    }
}
