//! Kubernetes integration for the webhook.
//!
//! The gate only needs two operations from the cluster: reading a pod and
//! running a command inside one of its containers. Both are described by the
//! [`K8sClient`] trait so the admission logic can be exercised against a fake
//! in tests.
//!
//! The production client, [`http::HttpK8sClient`], is backed by the [`kube`]
//! crate and uses either an explicit kubeconfig or the ambient configuration
//! (in-cluster service account or `KUBECONFIG`).

mod base;
pub mod http;

pub use base::*;
