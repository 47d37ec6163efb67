use async_trait::async_trait;
use endgame_config::shared::KubeConfig;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{Api, AttachParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::k8s::{ContainerSnapshot, ExecOutput, K8sClient, K8sError, PodSnapshot};

/// Status string the API server reports for a command that exited with 0.
const EXEC_SUCCESS_STATUS: &str = "Success";

/// [`K8sClient`] implementation talking to the API server through [`kube`].
#[derive(Clone)]
pub struct HttpK8sClient {
    client: Client,
    exec_timeout: Duration,
}

impl HttpK8sClient {
    /// Creates a client from an explicit kubeconfig path when one is configured,
    /// and from the ambient configuration otherwise.
    pub async fn new(config: &KubeConfig, exec_timeout: Duration) -> Result<Self, K8sError> {
        let client = match &config.kubeconfig_path {
            Some(path) => {
                info!(path = %path, "loading kubernetes client from kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path)?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await?;
                Client::try_from(config)?
            }
            None => {
                info!("loading kubernetes client from the ambient configuration");
                Client::try_default().await?
            }
        };

        Ok(Self::from_client(client, exec_timeout))
    }

    pub fn from_client(client: Client, exec_timeout: Duration) -> Self {
        Self {
            client,
            exec_timeout,
        }
    }

    async fn run_exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, K8sError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(true)
            .stderr(true);

        let mut process = pods.exec(pod, command.to_vec(), &params).await?;

        let stdout = process.stdout();
        let stderr = process.stderr();
        let status = process.take_status();

        // Both streams are drained together so a chatty stderr cannot stall stdout.
        let (stdout, stderr) = tokio::try_join!(read_stream(stdout), read_stream(stderr))?;
        let output = ExecOutput::from_streams(&stdout, &stderr);

        let status = match status {
            Some(status) => status.await,
            None => None,
        };
        check_exec_status(status, &output)?;

        Ok(output)
    }
}

#[async_trait]
impl K8sClient for HttpK8sClient {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodSnapshot, K8sError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        match pods.get_opt(name).await? {
            Some(pod) => Ok(pod_snapshot(namespace, pod)),
            None => Err(K8sError::PodNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn exec_in_container(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput, K8sError> {
        debug!(namespace, pod, container, ?command, "executing remote command");

        tokio::time::timeout(
            self.exec_timeout,
            self.run_exec(namespace, pod, container, command),
        )
        .await
        .map_err(|_| K8sError::ExecTimeout {
            timeout: self.exec_timeout,
        })?
    }
}

async fn read_stream<R>(stream: Option<R>) -> Result<String, std::io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf).await?;
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// A missing status means the stream closed before the process reported how it
/// ended, which is treated as a failure like any non-success status.
fn check_exec_status(status: Option<Status>, output: &ExecOutput) -> Result<(), K8sError> {
    let Some(status) = status else {
        return Err(K8sError::ExecFailed {
            message: "remote command ended without reporting a status".to_string(),
        });
    };

    if status.status.as_deref() == Some(EXEC_SUCCESS_STATUS) {
        return Ok(());
    }

    let mut message = status
        .message
        .or(status.reason)
        .unwrap_or_else(|| "unknown failure".to_string());
    if !output.stderr.is_empty() {
        message = format!("{message}: {}", output.stderr.join("; "));
    }

    Err(K8sError::ExecFailed { message })
}

/// Converts the API object into the snapshot the gate works on.
fn pod_snapshot(namespace: &str, pod: Pod) -> PodSnapshot {
    let containers = pod
        .spec
        .map(|spec| {
            spec.containers
                .into_iter()
                .map(|container| ContainerSnapshot {
                    name: container.name,
                    env: container
                        .env
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(|var| var.value.map(|value| (var.name, value)))
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    PodSnapshot {
        namespace: pod
            .metadata
            .namespace
            .unwrap_or_else(|| namespace.to_string()),
        name: pod.metadata.name.unwrap_or_default(),
        containers,
        deletion_timestamp: pod
            .metadata
            .deletion_timestamp
            .map(|timestamp| timestamp.0.to_string()),
    }
}
