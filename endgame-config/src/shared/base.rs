use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but the certificate path is empty.
    #[error("Invalid TLS config: `cert_path` must be set when `enabled` is true")]
    MissingTlsCertPath,
    /// TLS is enabled but the private key path is empty.
    #[error("Invalid TLS config: `key_path` must be set when `enabled` is true")]
    MissingTlsKeyPath,
    /// The role container name is empty.
    #[error("`container_name` cannot be empty")]
    EmptyContainerName,
    /// The remote exec timeout is zero.
    #[error("`exec_timeout_secs` cannot be zero")]
    ExecTimeoutZero,
    /// The etcdctl binary name is empty.
    #[error("`etcdctl.binary` cannot be empty")]
    EmptyEtcdctlBinary,
}
