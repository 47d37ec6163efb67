//! Admission decision for etcd pod deletions.
//!
//! [`review`] holds the wire types of the `AdmissionReview` exchange,
//! [`decision`] the pure allow/deny logic and [`gate`] the orchestration that
//! fetches the pod, probes etcd and triggers the member removal.

pub mod decision;
pub mod gate;
pub mod review;

pub use decision::{Decision, ProbeState, Remediation, decide, needs_probe};
pub use gate::{AdmissionGate, GateError};
pub use review::{AdmissionRequest, AdmissionVerdict, DecodeError, ReviewContext};
