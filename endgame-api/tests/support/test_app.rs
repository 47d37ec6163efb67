use std::io;
use std::net::TcpListener;
use std::sync::Arc;

use endgame_api::admission::AdmissionGate;
use endgame_api::k8s::K8sClient;
use endgame_api::startup::run;
use endgame_config::shared::{EtcdctlConfig, GateConfig};
use endgame_telemetry::metrics::init_metrics_handle;
use serde_json::Value;

use crate::support::k8s_client::FakeK8sClient;

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub k8s_client: Arc<FakeK8sClient>,
    server_handle: tokio::task::JoinHandle<io::Result<()>>,
}

impl TestApp {
    pub async fn post_review_bytes(&self, body: Vec<u8>) -> reqwest::Response {
        self.api_client
            .post(format!("{}/etcd", &self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Posts `review` to the webhook and returns the decoded response review.
    pub async fn post_review(&self, review: &Value) -> Value {
        let body = serde_json::to_vec(review).expect("failed to serialize review");
        let response = self.post_review_bytes(body).await;
        assert!(response.status().is_success());

        response
            .json()
            .await
            .expect("failed to deserialize response")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// Builds a gate with default settings on top of `k8s_client`.
pub fn test_gate(k8s_client: Arc<FakeK8sClient>) -> AdmissionGate {
    test_gate_with(k8s_client, &GateConfig::default())
}

pub fn test_gate_with(k8s_client: Arc<FakeK8sClient>, gate_config: &GateConfig) -> AdmissionGate {
    AdmissionGate::new(
        k8s_client as Arc<dyn K8sClient>,
        gate_config,
        &EtcdctlConfig::default(),
    )
}

pub async fn spawn_test_app(k8s_client: Arc<FakeK8sClient>) -> TestApp {
    let base_address = "127.0.0.1";
    let listener =
        TcpListener::bind(format!("{base_address}:0")).expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let metrics_handle = init_metrics_handle().expect("failed to init metrics");
    let server = run(listener, test_gate(k8s_client.clone()), metrics_handle, None)
        .expect("failed to bind address");

    let server_handle = tokio::spawn(server);

    TestApp {
        address: format!("http://{base_address}:{port}"),
        api_client: reqwest::Client::new(),
        k8s_client,
        server_handle,
    }
}
