//! Validating admission webhook that holds back the deletion of an etcd pod
//! until the pod has left the etcd membership list.
//!
//! The webhook is called for pod deletions. For pods running an etcd container
//! it lists the cluster members from inside that container, removes the pod's
//! own member when it is still registered and denies the deletion until a later
//! retry observes that the member is gone.

pub mod admission;
pub mod config;
pub mod etcd;
pub mod k8s;
pub mod metrics;
pub mod routes;
pub mod startup;
