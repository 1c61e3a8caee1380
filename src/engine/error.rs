use ulid::Ulid;

use crate::model::BookingStatus;
use crate::ports::{DirectoryError, StoreError};

/// Every rejection carries a discriminated reason; nothing is silently
/// swallowed. A store [`StoreError::Conflict`] never appears here —
/// admission consumes it by retrying the next candidate table.
#[derive(Debug)]
pub enum AdmissionError {
    /// Party size below 1. Caller error, never retried.
    InvalidPartySize(i64),
    RestaurantNotFound(Ulid),
    /// Legitimate business outcome, not an exceptional condition; callers
    /// may retry with a different time.
    NoTableAvailable,
    BookingNotFound(Ulid),
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    LimitExceeded(&'static str),
    /// Directory or store failure. Transient; the engine performs no
    /// implicit retries across that boundary.
    Unavailable(String),
}

impl std::fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionError::InvalidPartySize(n) => write!(f, "invalid party size: {n}"),
            AdmissionError::RestaurantNotFound(id) => write!(f, "restaurant not found: {id}"),
            AdmissionError::NoTableAvailable => {
                write!(f, "no suitable table available for this party size and time")
            }
            AdmissionError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            AdmissionError::InvalidTransition { from, to } => {
                write!(f, "invalid status transition: {from} -> {to}")
            }
            AdmissionError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            AdmissionError::Unavailable(e) => write!(f, "service unavailable: {e}"),
        }
    }
}

impl std::error::Error for AdmissionError {}

impl From<DirectoryError> for AdmissionError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound(id) => AdmissionError::RestaurantNotFound(id),
            DirectoryError::LimitExceeded(msg) => AdmissionError::LimitExceeded(msg),
            DirectoryError::Unavailable(e) => AdmissionError::Unavailable(e),
        }
    }
}

impl From<StoreError> for AdmissionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AdmissionError::BookingNotFound(id),
            // Only reachable outside the allocation retry loop, where a
            // conflict has no candidate left to move to.
            StoreError::Conflict(id) => {
                AdmissionError::Unavailable(format!("store conflict with booking {id}"))
            }
            StoreError::Unavailable(e) => AdmissionError::Unavailable(e),
        }
    }
}
