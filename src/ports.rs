//! Repository ports. The engine reads restaurant layout through
//! [`ResourceDirectory`] and reads/writes bookings through [`BookingStore`];
//! everything else about persistence is the embedding service's problem.

use async_trait::async_trait;
use ulid::Ulid;

use crate::model::{Booking, BookingStatus, RestaurantState, Span};

#[derive(Debug)]
pub enum DirectoryError {
    NotFound(Ulid),
    LimitExceeded(&'static str),
    Unavailable(String),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::NotFound(id) => write!(f, "restaurant not found: {id}"),
            DirectoryError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            DirectoryError::Unavailable(e) => write!(f, "directory unavailable: {e}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

#[derive(Debug)]
pub enum StoreError {
    NotFound(Ulid),
    /// A confirmed booking already occupies the table over the interval.
    /// Carries the id of the booking that holds the slot.
    Conflict(Ulid),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "booking not found: {id}"),
            StoreError::Conflict(id) => write!(f, "conflict with booking: {id}"),
            StoreError::Unavailable(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read-only view of restaurants: tables, capacities, buffer rule.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    async fn restaurant(&self, id: Ulid) -> Result<RestaurantState, DirectoryError>;
}

/// Booking reads and writes. Implementations must make `insert` an atomic
/// conditional write; it is the only store-side operation the admission
/// invariant leans on.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Confirmed bookings on a restaurant — or on one of its tables when
    /// `table_id` is given — whose occupancy interval overlaps `span`.
    async fn find_confirmed_overlapping(
        &self,
        restaurant_id: Ulid,
        table_id: Option<Ulid>,
        span: Span,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Conditional insert: fails with [`StoreError::Conflict`] if a
    /// confirmed booking on the same table overlaps the new occupancy.
    /// The check and the write are one atomic step, even under arbitrary
    /// interleaving of concurrent callers.
    async fn insert(&self, booking: Booking) -> Result<Booking, StoreError>;

    async fn booking(&self, booking_id: Ulid) -> Result<Booking, StoreError>;

    /// Writes the status verbatim; transition legality is the engine's
    /// rule. A cancellation must be visible to subsequent
    /// `find_confirmed_overlapping` reads as soon as this returns.
    async fn update_status(
        &self,
        booking_id: Ulid,
        status: BookingStatus,
    ) -> Result<Booking, StoreError>;

    /// Requester history, newest first.
    async fn bookings_for_requester(&self, requester_id: Ulid)
    -> Result<Vec<Booking>, StoreError>;

    /// Restaurant ledger, oldest first.
    async fn bookings_for_restaurant(
        &self,
        restaurant_id: Ulid,
    ) -> Result<Vec<Booking>, StoreError>;
}
