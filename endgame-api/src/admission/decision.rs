use crate::admission::AdmissionVerdict;
use crate::etcd::MembershipSnapshot;
use crate::k8s::PodSnapshot;

/// What is known about the etcd membership when the decision is taken.
#[derive(Debug, Clone, Copy)]
pub enum ProbeState<'a> {
    /// The member list was not read.
    NotProbed,
    /// The member list read from the role container.
    Members(&'a MembershipSnapshot),
    /// Reading the member list failed.
    Failed(&'a str),
}

/// Side effect requested alongside a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    RemoveMember { member_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: AdmissionVerdict,
    pub remediation: Option<Remediation>,
}

impl Decision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            verdict: AdmissionVerdict::allow(reason),
            remediation: None,
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            verdict: AdmissionVerdict::deny(reason),
            remediation: None,
        }
    }
}

/// Whether [`decide`] needs a membership probe for `pod`.
///
/// Only the first delete request of a pod running the role container is
/// probed. The final purge call, issued once the deletion timestamp is set, is
/// never probed.
pub fn needs_probe(pod: &PodSnapshot, container_name: &str) -> bool {
    pod.container(container_name).is_some() && !pod.is_terminating()
}

/// Maps a pod and the observed etcd membership to a verdict.
///
/// | role container | terminating | member listed | verdict | remediation   |
/// |----------------|-------------|---------------|---------|---------------|
/// | no             | any         | -             | allow   | -             |
/// | yes            | yes         | not probed    | allow   | -             |
/// | yes            | no          | yes           | deny    | remove member |
/// | yes            | no          | no            | allow   | -             |
///
/// When the membership is unknown (not probed or probe failed) for a pod that
/// needs it, the deletion is denied without remediation: an unknown state must
/// not let a live member disappear.
pub fn decide(pod: &PodSnapshot, container_name: &str, probe: ProbeState<'_>) -> Decision {
    if pod.container(container_name).is_none() {
        return Decision::allow(format!(
            "pod {} has no {container_name} container",
            pod.name
        ));
    }

    if pod.is_terminating() {
        return Decision::allow(format!(
            "pod {} is already terminating, membership was settled on the delete request",
            pod.name
        ));
    }

    match probe {
        ProbeState::NotProbed => Decision::deny(format!(
            "etcd membership of pod {} is unknown",
            pod.name
        )),
        ProbeState::Failed(reason) => Decision::deny(format!(
            "cannot determine etcd membership of pod {}: {reason}",
            pod.name
        )),
        ProbeState::Members(snapshot) => match snapshot.find_by_name(&pod.name) {
            Some(member) => Decision {
                verdict: AdmissionVerdict::deny(format!(
                    "pod {} is still etcd member {}, removal requested; retry the deletion once it has left the cluster",
                    pod.name, member.id
                )),
                remediation: Some(Remediation::RemoveMember {
                    member_id: member.id.clone(),
                }),
            },
            None => Decision::allow(format!(
                "pod {} is not an etcd member",
                pod.name
            )),
        },
    }
}
