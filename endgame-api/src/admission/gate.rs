use endgame_config::shared::{EtcdctlConfig, GateConfig};
use futures::FutureExt;
use metrics::counter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::admission::decision::{ProbeState, Remediation, decide, needs_probe};
use crate::admission::review::{
    AdmissionRequest, AdmissionVerdict, DecodeError, ReviewContext, decode_request,
    encode_verdict, error_verdict,
};
use crate::etcd::{EtcdctlCommand, MemberRemediator, MemberTarget, MembershipProber};
use crate::k8s::{K8sClient, K8sError};
use crate::metrics::{
    ADMISSION_VERDICTS_TOTAL, MEMBER_REMOVALS_TOTAL, OUTCOME, PROBE_FAILURES_TOTAL, VERDICT,
};

/// Reason reported when evaluating a request panicked.
pub const INTERNAL_ERROR_REASON: &str = "internal error while evaluating the admission request";

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("not a Pod admission request")]
    NotAPod,

    #[error("get requested pod error: {0}")]
    PodLookup(#[source] K8sError),
}

/// Decides whether an etcd pod may be deleted.
///
/// Holds no state between calls: the pod and the membership list are read
/// fresh for every request, so concurrent calls need no coordination.
#[derive(Clone)]
pub struct AdmissionGate {
    k8s_client: Arc<dyn K8sClient>,
    container_name: String,
    prober: MembershipProber,
    remediator: MemberRemediator,
}

impl AdmissionGate {
    pub fn new(
        k8s_client: Arc<dyn K8sClient>,
        gate_config: &GateConfig,
        etcdctl_config: &EtcdctlConfig,
    ) -> Self {
        let etcdctl = EtcdctlCommand::new(etcdctl_config.clone());
        let exec_timeout = gate_config.exec_timeout();

        Self {
            prober: MembershipProber::new(k8s_client.clone(), etcdctl.clone(), exec_timeout),
            remediator: MemberRemediator::new(k8s_client.clone(), etcdctl, exec_timeout),
            container_name: gate_config.container_name.clone(),
            k8s_client,
        }
    }

    /// Answers a raw `AdmissionReview` request body with a response body.
    ///
    /// Every failure, panics included, ends up as a deny verdict, so the API
    /// server always receives a well formed review.
    pub async fn review(&self, body: &[u8]) -> Vec<u8> {
        let review = match decode_request(body) {
            Ok(review) => review,
            Err(err) => {
                warn!(error = %err, "received an undecodable admission review");
                let verdict = error_verdict(&GateError::from(err));
                record_verdict(&verdict);
                return encode_verdict(&ReviewContext::default(), &verdict);
            }
        };

        let verdict = match AssertUnwindSafe(self.evaluate(&review.request))
            .catch_unwind()
            .await
        {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(err)) => {
                warn!(error = %err, "admission request rejected");
                error_verdict(&err)
            }
            Err(_) => {
                error!(uid = %review.context.uid, "evaluating the admission request panicked");
                AdmissionVerdict::deny(INTERNAL_ERROR_REASON)
            }
        };

        record_verdict(&verdict);
        encode_verdict(&review.context, &verdict)
    }

    /// Evaluates one admission request, running the membership probe and the
    /// member removal when the decision calls for them.
    #[instrument(
        skip_all,
        fields(
            uid = %request.uid,
            namespace = %request.namespace,
            name = %request.name,
            operation = %request.operation,
        )
    )]
    pub async fn evaluate(&self, request: &AdmissionRequest) -> Result<AdmissionVerdict, GateError> {
        if !request.targets_namespaced_pod() {
            return Err(GateError::NotAPod);
        }

        let pod = self
            .k8s_client
            .get_pod(&request.namespace, &request.name)
            .await
            .map_err(GateError::PodLookup)?;

        let container = match pod.container(&self.container_name) {
            Some(container) if needs_probe(&pod, &self.container_name) => container,
            _ => {
                let decision = decide(&pod, &self.container_name, ProbeState::NotProbed);
                log_verdict(&pod.name, &decision.verdict);
                return Ok(decision.verdict);
            }
        };

        let target = MemberTarget {
            namespace: &pod.namespace,
            pod: &pod.name,
            container,
        };

        let probe_result = self.prober.probe(target).await;
        let failure_reason;
        let probe = match &probe_result {
            Ok(snapshot) => ProbeState::Members(snapshot),
            Err(err) => {
                counter!(PROBE_FAILURES_TOTAL).increment(1);
                warn!(error = %err, "etcd membership probe failed");
                failure_reason = err.to_string();
                ProbeState::Failed(&failure_reason)
            }
        };

        let decision = decide(&pod, &self.container_name, probe);

        if let Some(Remediation::RemoveMember { member_id }) = &decision.remediation {
            info!(member_id = %member_id, "pod is still an etcd member, removing it");
            let outcome = self.remediator.remove(target, member_id).await;
            counter!(MEMBER_REMOVALS_TOTAL, OUTCOME => outcome.as_str()).increment(1);
        }

        log_verdict(&pod.name, &decision.verdict);

        Ok(decision.verdict)
    }
}

fn log_verdict(pod: &str, verdict: &AdmissionVerdict) {
    if verdict.allowed {
        info!(pod, reason = %verdict.reason, "pod deletion admitted");
    } else {
        info!(pod, reason = %verdict.reason, "pod deletion denied");
    }
}

fn record_verdict(verdict: &AdmissionVerdict) {
    counter!(ADMISSION_VERDICTS_TOTAL, VERDICT => verdict.as_str()).increment(1);
}
