use crate::model::{BufferRule, ConfidenceWindow, MS_PER_MIN, Ms};

/// Buffer arithmetic only: `[requested − early, requested + late]`.
/// Deterministic, independent of load.
///
/// Extension point: historical punctuality or peak-hour weighting would
/// adjust the window here. The current policy is the placeholder the rest
/// of the pipeline treats as informational output.
pub fn confidence_window(requested_at: Ms, rule: &BufferRule) -> ConfidenceWindow {
    ConfidenceWindow {
        start: requested_at - rule.early_min as Ms * MS_PER_MIN,
        end: requested_at + rule.late_min as Ms * MS_PER_MIN,
    }
}
