use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::AdmissionError;
use crate::limits::*;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Milliseconds per minute; durations and buffers are specified in minutes.
pub const MS_PER_MIN: Ms = 60_000;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// The one overlap predicate: half-open, boundary-exclusive. A booking
    /// ending exactly when another begins does not conflict.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[allow(dead_code)]
    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Early/late minute offsets around the requested instant. Owned by the
/// restaurant and mutable only through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferRule {
    pub early_min: u32,
    pub late_min: u32,
}

impl Default for BufferRule {
    /// 15 minutes on both sides.
    fn default() -> Self {
        Self {
            early_min: 15,
            late_min: 15,
        }
    }
}

/// Buffer-adjusted range informationally attached to a booking. Never used
/// for conflict detection; degenerate when both buffers are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceWindow {
    pub start: Ms,
    pub end: Ms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: Ulid,
    /// Seats, at least 1.
    pub capacity: u32,
    /// Tables taken out of service stay in the list but are skipped by
    /// allocation and excluded from scoring capacity.
    pub available: bool,
}

impl Table {
    pub fn new(capacity: u32) -> Self {
        Self {
            id: Ulid::new(),
            capacity,
            available: true,
        }
    }

    /// Eligible to seat a party: in service and big enough.
    pub fn fits(&self, party_size: u32) -> bool {
        self.available && self.capacity >= party_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantState {
    pub id: Ulid,
    pub name: String,
    /// Stored order is allocation order (first fit).
    pub tables: Vec<Table>,
    pub buffer_rule: BufferRule,
}

impl RestaurantState {
    pub fn new(name: impl Into<String>, tables: Vec<Table>) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            tables,
            buffer_rule: BufferRule::default(),
        }
    }

    /// Seat capacity summed over tables currently in service.
    pub fn total_capacity(&self) -> u32 {
        self.tables
            .iter()
            .filter(|t| t.available)
            .map(|t| t.capacity)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Legal status edges. Cancelled and Completed are terminal; the engine
    /// itself only ever produces Confirmed and Cancelled.
    pub fn can_transition(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        })
    }
}

/// The record the engine emits at accept time. The outer persistence layer
/// owns the bytes; this type owns the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub restaurant_id: Ulid,
    /// None until a table has been allocated.
    pub table_id: Option<Ulid>,
    pub requester_id: Ulid,
    pub party_size: u32,
    pub requested_at: Ms,
    /// Estimated occupancy in minutes, always recomputed from party size.
    pub duration_min: u32,
    pub window: ConfidenceWindow,
    /// Capacity-pressure heuristic captured at admission time, 0–100.
    pub certainty: u8,
    pub status: BookingStatus,
    pub created_at: Ms,
}

impl Booking {
    /// Occupancy interval `[requested_at, requested_at + duration)`.
    pub fn occupancy(&self) -> Span {
        Span::new(
            self.requested_at,
            self.requested_at + self.duration_min as Ms * MS_PER_MIN,
        )
    }
}

/// Validated admission input. Construction is the trust boundary: anything
/// past `new` carries a positive, bounded party size and an in-range
/// instant. Transient, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationRequest {
    pub restaurant_id: Ulid,
    pub requested_at: Ms,
    pub party_size: u32,
}

impl ReservationRequest {
    /// Party size is signed at the boundary so that non-positive inputs are
    /// representable and rejected, not silently wrapped.
    pub fn new(
        restaurant_id: Ulid,
        requested_at: Ms,
        party_size: i64,
    ) -> Result<Self, AdmissionError> {
        if party_size < 1 {
            return Err(AdmissionError::InvalidPartySize(party_size));
        }
        if party_size > MAX_PARTY_SIZE as i64 {
            return Err(AdmissionError::LimitExceeded("party too large"));
        }
        if !(MIN_VALID_TIMESTAMP_MS..=MAX_VALID_TIMESTAMP_MS).contains(&requested_at) {
            return Err(AdmissionError::LimitExceeded("timestamp out of range"));
        }
        Ok(Self {
            restaurant_id,
            requested_at,
            party_size: party_size as u32,
        })
    }
}

/// What `check_availability` returns. Pure query output; producing one has
/// no effect on subsequent admissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub duration_min: u32,
    pub window: ConfidenceWindow,
    pub certainty: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEVEN_PM: Ms = 1_735_758_000_000; // 2025-01-01T19:00:00Z

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap_boundary_exclusive() {
        // [19:00, 19:45) and [19:45, 20:00) — adjacent, not overlapping
        let a = Span::new(SEVEN_PM, SEVEN_PM + 45 * MS_PER_MIN);
        let b = Span::new(SEVEN_PM + 45 * MS_PER_MIN, SEVEN_PM + 60 * MS_PER_MIN);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));

        // [19:00, 19:45) and [19:30, 20:00) — overlap
        let c = Span::new(SEVEN_PM + 30 * MS_PER_MIN, SEVEN_PM + 60 * MS_PER_MIN);
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn buffer_rule_default_fifteen_both_sides() {
        let rule = BufferRule::default();
        assert_eq!(rule.early_min, 15);
        assert_eq!(rule.late_min, 15);
    }

    #[test]
    fn table_fits_respects_availability() {
        let mut table = Table::new(4);
        assert!(table.fits(4));
        assert!(!table.fits(5));
        table.available = false;
        assert!(!table.fits(2));
    }

    #[test]
    fn total_capacity_skips_out_of_service_tables() {
        let mut r = RestaurantState::new("Bistro", vec![Table::new(2), Table::new(6)]);
        assert_eq!(r.total_capacity(), 8);
        r.tables[1].available = false;
        assert_eq!(r.total_capacity(), 2);
    }

    #[test]
    fn status_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition(Confirmed));
        assert!(Pending.can_transition(Cancelled));
        assert!(Confirmed.can_transition(Cancelled));
        assert!(Confirmed.can_transition(Completed));

        assert!(!Cancelled.can_transition(Confirmed));
        assert!(!Completed.can_transition(Confirmed));
        assert!(!Confirmed.can_transition(Pending));
        assert!(!Confirmed.can_transition(Confirmed));
    }

    #[test]
    fn request_rejects_non_positive_party() {
        let rid = Ulid::new();
        assert!(matches!(
            ReservationRequest::new(rid, SEVEN_PM, 0),
            Err(AdmissionError::InvalidPartySize(0))
        ));
        assert!(matches!(
            ReservationRequest::new(rid, SEVEN_PM, -1),
            Err(AdmissionError::InvalidPartySize(-1))
        ));
    }

    #[test]
    fn request_rejects_out_of_range_inputs() {
        let rid = Ulid::new();
        assert!(matches!(
            ReservationRequest::new(rid, SEVEN_PM, MAX_PARTY_SIZE as i64 + 1),
            Err(AdmissionError::LimitExceeded(_))
        ));
        assert!(matches!(
            ReservationRequest::new(rid, -1, 2),
            Err(AdmissionError::LimitExceeded(_))
        ));
        assert!(matches!(
            ReservationRequest::new(rid, MAX_VALID_TIMESTAMP_MS + 1, 2),
            Err(AdmissionError::LimitExceeded(_))
        ));
    }

    #[test]
    fn booking_occupancy_derived_from_duration() {
        let booking = Booking {
            id: Ulid::new(),
            restaurant_id: Ulid::new(),
            table_id: Some(Ulid::new()),
            requester_id: Ulid::new(),
            party_size: 2,
            requested_at: SEVEN_PM,
            duration_min: 45,
            window: ConfidenceWindow {
                start: SEVEN_PM - 15 * MS_PER_MIN,
                end: SEVEN_PM + 15 * MS_PER_MIN,
            },
            certainty: 100,
            status: BookingStatus::Confirmed,
            created_at: SEVEN_PM - 3_600_000,
        };
        assert_eq!(
            booking.occupancy(),
            Span::new(SEVEN_PM, SEVEN_PM + 45 * MS_PER_MIN)
        );
    }

    #[test]
    fn booking_serialization_roundtrip() {
        let booking = Booking {
            id: Ulid::new(),
            restaurant_id: Ulid::new(),
            table_id: None,
            requester_id: Ulid::new(),
            party_size: 4,
            requested_at: SEVEN_PM,
            duration_min: 75,
            window: ConfidenceWindow {
                start: SEVEN_PM - 10 * MS_PER_MIN,
                end: SEVEN_PM + 20 * MS_PER_MIN,
            },
            certainty: 40,
            status: BookingStatus::Pending,
            created_at: SEVEN_PM,
        };
        let json = serde_json::to_string(&booking).unwrap();
        let decoded: Booking = serde_json::from_str(&json).unwrap();
        assert_eq!(booking, decoded);
        assert!(json.contains("\"pending\""));
    }
}
