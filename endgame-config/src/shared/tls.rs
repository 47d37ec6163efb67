use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// TLS material the webhook server presents to the API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Serve over TLS. The API server only calls webhooks over HTTPS, so this is
    /// disabled only for local development.
    pub enabled: bool,
    /// PEM encoded certificate chain.
    #[serde(default)]
    pub cert_path: String,
    /// PEM encoded private key.
    #[serde(default)]
    pub key_path: String,
}

impl TlsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }

        if self.cert_path.is_empty() {
            return Err(ValidationError::MissingTlsCertPath);
        }

        if self.key_path.is_empty() {
            return Err(ValidationError::MissingTlsKeyPath);
        }

        Ok(())
    }
}
