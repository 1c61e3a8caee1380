use crate::engine::AdmissionError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: bookings admitted.
pub const ADMISSIONS_TOTAL: &str = "maitre_admissions_total";

/// Counter: admissions rejected. Labels: reason.
pub const REJECTIONS_TOTAL: &str = "maitre_rejections_total";

/// Counter: availability assessments served.
pub const ASSESSMENTS_TOTAL: &str = "maitre_assessments_total";

/// Counter: bookings cancelled.
pub const CANCELLATIONS_TOTAL: &str = "maitre_cancellations_total";

/// Histogram: admission decision latency in seconds.
pub const ADMISSION_DURATION_SECONDS: &str = "maitre_admission_duration_seconds";

/// Histogram: certainty scores emitted with accepted bookings.
pub const CERTAINTY_SCORE: &str = "maitre_certainty_score";

/// Counter: conditional inserts that lost a race and moved the scan to the
/// next candidate table.
pub const ALLOCATION_RETRIES_TOTAL: &str = "maitre_allocation_retries_total";

/// Map a rejection to a short label for metrics.
pub fn rejection_label(err: &AdmissionError) -> &'static str {
    match err {
        AdmissionError::InvalidPartySize(_) => "invalid_party_size",
        AdmissionError::RestaurantNotFound(_) => "restaurant_not_found",
        AdmissionError::NoTableAvailable => "no_table_available",
        AdmissionError::BookingNotFound(_) => "booking_not_found",
        AdmissionError::InvalidTransition { .. } => "invalid_transition",
        AdmissionError::LimitExceeded(_) => "limit_exceeded",
        AdmissionError::Unavailable(_) => "unavailable",
    }
}
