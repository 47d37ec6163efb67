use std::sync::Arc;

use endgame_telemetry::tracing::init_test_tracing;

use crate::support::k8s_client::{FakeK8sClient, THREE_MEMBERS, etcd_pod};
use crate::support::reviews::pod_delete_review;
use crate::support::test_app::spawn_test_app;

mod support;

#[tokio::test(flavor = "multi_thread")]
async fn metrics_endpoint_returns_200() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app(Arc::new(FakeK8sClient::default())).await;

    // Act
    let response = app
        .api_client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    // Assert
    assert!(response.status().is_success());
}

#[tokio::test(flavor = "multi_thread")]
async fn reviews_are_counted_by_verdict_and_removal_outcome() {
    init_test_tracing();
    // Arrange
    let k8s_client = Arc::new(FakeK8sClient::with_members(&THREE_MEMBERS));
    k8s_client.add_pod(etcd_pod("etcd-2", true, false));
    let app = spawn_test_app(k8s_client).await;
    app.post_review(&pod_delete_review("etcd-2")).await;

    // Act
    let body = app
        .api_client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request.")
        .text()
        .await
        .expect("failed to read metrics body");

    // Assert
    assert!(body.contains("endgame_admission_verdicts_total{verdict=\"deny\"}"));
    assert!(body.contains("endgame_member_removals_total{outcome=\"removed\"}"));
}
