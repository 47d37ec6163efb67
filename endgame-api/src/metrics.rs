use std::sync::Once;

use metrics::{Unit, describe_counter};

static REGISTER_METRICS: Once = Once::new();

pub const ADMISSION_VERDICTS_TOTAL: &str = "endgame_admission_verdicts_total";
pub const MEMBER_REMOVALS_TOTAL: &str = "endgame_member_removals_total";
pub const PROBE_FAILURES_TOTAL: &str = "endgame_probe_failures_total";
pub const VERDICT: &str = "verdict";
pub const OUTCOME: &str = "outcome";

/// Registers the descriptions of the metrics emitted by the webhook. Safe to
/// call multiple times, the registration happens once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            ADMISSION_VERDICTS_TOTAL,
            Unit::Count,
            "Admission reviews answered, labelled by verdict"
        );

        describe_counter!(
            MEMBER_REMOVALS_TOTAL,
            Unit::Count,
            "etcd member removals attempted, labelled by outcome"
        );

        describe_counter!(
            PROBE_FAILURES_TOTAL,
            Unit::Count,
            "etcd membership probes that could not be completed"
        );
    });
}
