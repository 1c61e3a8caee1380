use crate::model::{MS_PER_MIN, Ms, Span};

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Occupancy interval of a request: `[requested, requested + duration)`.
///
/// All conflict detection and scoring runs against this interval. The
/// confidence window never participates in an overlap query.
pub fn occupancy_span(requested_at: Ms, duration_min: u32) -> Span {
    Span::new(requested_at, requested_at + duration_min as Ms * MS_PER_MIN)
}
