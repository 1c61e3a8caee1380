//! In-memory reference implementations of the repository ports.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::ports::{BookingStore, DirectoryError, ResourceDirectory, StoreError};

// ── Directory ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryDirectory {
    restaurants: DashMap<Ulid, RestaurantState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, restaurant: RestaurantState) -> Result<Ulid, DirectoryError> {
        if restaurant.name.len() > MAX_NAME_LEN {
            return Err(DirectoryError::LimitExceeded("restaurant name too long"));
        }
        if restaurant.tables.len() > MAX_TABLES_PER_RESTAURANT {
            return Err(DirectoryError::LimitExceeded("too many tables"));
        }
        if restaurant.tables.iter().any(|t| t.capacity == 0) {
            return Err(DirectoryError::LimitExceeded("table capacity must be positive"));
        }
        validate_buffer_rule(&restaurant.buffer_rule)?;
        let id = restaurant.id;
        self.restaurants.insert(id, restaurant);
        Ok(id)
    }

    /// The buffer rule is owned by the restaurant; this is its only
    /// mutation path.
    pub fn set_buffer_rule(&self, id: Ulid, rule: BufferRule) -> Result<(), DirectoryError> {
        validate_buffer_rule(&rule)?;
        let mut entry = self
            .restaurants
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound(id))?;
        entry.buffer_rule = rule;
        Ok(())
    }

    /// Flip a table in or out of service.
    pub fn set_table_available(
        &self,
        id: Ulid,
        table_id: Ulid,
        available: bool,
    ) -> Result<(), DirectoryError> {
        let mut entry = self
            .restaurants
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound(id))?;
        let table = entry
            .tables
            .iter_mut()
            .find(|t| t.id == table_id)
            .ok_or(DirectoryError::NotFound(table_id))?;
        table.available = available;
        Ok(())
    }
}

fn validate_buffer_rule(rule: &BufferRule) -> Result<(), DirectoryError> {
    if rule.early_min > MAX_BUFFER_MIN || rule.late_min > MAX_BUFFER_MIN {
        return Err(DirectoryError::LimitExceeded("buffer too wide"));
    }
    Ok(())
}

#[async_trait]
impl ResourceDirectory for MemoryDirectory {
    async fn restaurant(&self, id: Ulid) -> Result<RestaurantState, DirectoryError> {
        self.restaurants
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(DirectoryError::NotFound(id))
    }
}

// ── Booking store ────────────────────────────────────────────────

/// Per-restaurant booking list, sorted by occupancy start. All writes go
/// through the ledger's lock; re-checking for conflicts inside that lock is
/// what makes `insert` an atomic conditional write.
#[derive(Default)]
struct Ledger {
    bookings: Vec<Booking>,
}

impl Ledger {
    /// Insert maintaining sort order by occupancy start.
    fn insert_sorted(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.requested_at, |b| b.requested_at)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Confirmed bookings overlapping the window. Everything at index >=
    /// `right_bound` starts at or after `span.end` and cannot overlap.
    fn confirmed_overlapping<'a>(
        &'a self,
        table_id: Option<Ulid>,
        span: &'a Span,
    ) -> impl Iterator<Item = &'a Booking> {
        let right_bound = self.bookings.partition_point(|b| b.requested_at < span.end);
        self.bookings[..right_bound].iter().filter(move |b| {
            b.status == BookingStatus::Confirmed
                && table_id.is_none_or(|tid| b.table_id == Some(tid))
                && b.occupancy().overlaps(span)
        })
    }
}

type SharedLedger = Arc<RwLock<Ledger>>;

#[derive(Default)]
pub struct MemoryStore {
    ledgers: DashMap<Ulid, SharedLedger>,
    /// Reverse lookup: booking id → restaurant id.
    booking_to_restaurant: DashMap<Ulid, Ulid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, restaurant_id: Ulid) -> SharedLedger {
        self.ledgers
            .entry(restaurant_id)
            .or_default()
            .value()
            .clone()
    }

    fn existing_ledger(&self, restaurant_id: Ulid) -> Option<SharedLedger> {
        self.ledgers.get(&restaurant_id).map(|e| e.value().clone())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_confirmed_overlapping(
        &self,
        restaurant_id: Ulid,
        table_id: Option<Ulid>,
        span: Span,
    ) -> Result<Vec<Booking>, StoreError> {
        let Some(ledger) = self.existing_ledger(restaurant_id) else {
            return Ok(Vec::new());
        };
        let guard = ledger.read().await;
        Ok(guard.confirmed_overlapping(table_id, &span).cloned().collect())
    }

    async fn insert(&self, booking: Booking) -> Result<Booking, StoreError> {
        let ledger = self.ledger(booking.restaurant_id);
        let mut guard = ledger.write().await;
        if booking.status == BookingStatus::Confirmed
            && let Some(table_id) = booking.table_id
        {
            let occupancy = booking.occupancy();
            if let Some(holder) = guard.confirmed_overlapping(Some(table_id), &occupancy).next() {
                return Err(StoreError::Conflict(holder.id));
            }
        }
        self.booking_to_restaurant
            .insert(booking.id, booking.restaurant_id);
        guard.insert_sorted(booking.clone());
        Ok(booking)
    }

    async fn booking(&self, booking_id: Ulid) -> Result<Booking, StoreError> {
        let restaurant_id = self
            .booking_to_restaurant
            .get(&booking_id)
            .map(|e| *e.value())
            .ok_or(StoreError::NotFound(booking_id))?;
        let ledger = self.ledger(restaurant_id);
        let guard = ledger.read().await;
        guard
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or(StoreError::NotFound(booking_id))
    }

    async fn update_status(
        &self,
        booking_id: Ulid,
        status: BookingStatus,
    ) -> Result<Booking, StoreError> {
        let restaurant_id = self
            .booking_to_restaurant
            .get(&booking_id)
            .map(|e| *e.value())
            .ok_or(StoreError::NotFound(booking_id))?;
        let ledger = self.ledger(restaurant_id);
        let mut guard = ledger.write().await;
        let booking = guard
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(StoreError::NotFound(booking_id))?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn bookings_for_requester(
        &self,
        requester_id: Ulid,
    ) -> Result<Vec<Booking>, StoreError> {
        // Clone the ledger handles first; dashmap refs must not be held
        // across an await.
        let ledgers: Vec<SharedLedger> =
            self.ledgers.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::new();
        for ledger in ledgers {
            let guard = ledger.read().await;
            out.extend(
                guard
                    .bookings
                    .iter()
                    .filter(|b| b.requester_id == requester_id)
                    .cloned(),
            );
        }
        out.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(out)
    }

    async fn bookings_for_restaurant(
        &self,
        restaurant_id: Ulid,
    ) -> Result<Vec<Booking>, StoreError> {
        let Some(ledger) = self.existing_ledger(restaurant_id) else {
            return Ok(Vec::new());
        };
        let guard = ledger.read().await;
        // Ledger order is occupancy-start order, oldest first.
        Ok(guard.bookings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    const H: Ms = 3_600_000;

    fn booking_at(restaurant_id: Ulid, table_id: Ulid, start: Ms, duration_min: u32) -> Booking {
        Booking {
            id: Ulid::new(),
            restaurant_id,
            table_id: Some(table_id),
            requester_id: Ulid::new(),
            party_size: 2,
            requested_at: start,
            duration_min,
            window: ConfidenceWindow {
                start: start - 15 * MS_PER_MIN,
                end: start + 15 * MS_PER_MIN,
            },
            certainty: 100,
            status: BookingStatus::Confirmed,
            created_at: start - H,
        }
    }

    #[tokio::test]
    async fn conditional_insert_rejects_overlap_on_same_table() {
        let store = MemoryStore::new();
        let rid = Ulid::new();
        let tid = Ulid::new();

        let first = store.insert(booking_at(rid, tid, 19 * H, 45)).await.unwrap();
        let result = store.insert(booking_at(rid, tid, 19 * H + 30 * MS_PER_MIN, 45)).await;
        match result {
            Err(StoreError::Conflict(holder)) => assert_eq!(holder, first.id),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn adjacent_bookings_share_a_table() {
        let store = MemoryStore::new();
        let rid = Ulid::new();
        let tid = Ulid::new();

        store.insert(booking_at(rid, tid, 19 * H, 45)).await.unwrap();
        // Starts exactly when the first ends — half-open, no conflict.
        assert_ok!(
            store
                .insert(booking_at(rid, tid, 19 * H + 45 * MS_PER_MIN, 45))
                .await
        );
    }

    #[tokio::test]
    async fn overlap_allowed_across_tables() {
        let store = MemoryStore::new();
        let rid = Ulid::new();

        store.insert(booking_at(rid, Ulid::new(), 19 * H, 45)).await.unwrap();
        assert_ok!(store.insert(booking_at(rid, Ulid::new(), 19 * H, 45)).await);
    }

    #[tokio::test]
    async fn cancelled_booking_frees_the_slot() {
        let store = MemoryStore::new();
        let rid = Ulid::new();
        let tid = Ulid::new();

        let booking = store.insert(booking_at(rid, tid, 19 * H, 45)).await.unwrap();
        store
            .update_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let overlapping = store
            .find_confirmed_overlapping(rid, Some(tid), Span::new(19 * H, 20 * H))
            .await
            .unwrap();
        assert!(overlapping.is_empty());

        // Same slot is insertable again.
        assert_ok!(store.insert(booking_at(rid, tid, 19 * H, 45)).await);
    }

    #[tokio::test]
    async fn find_scopes_by_table_and_interval() {
        let store = MemoryStore::new();
        let rid = Ulid::new();
        let t1 = Ulid::new();
        let t2 = Ulid::new();

        store.insert(booking_at(rid, t1, 19 * H, 45)).await.unwrap();
        store.insert(booking_at(rid, t2, 19 * H, 45)).await.unwrap();
        store.insert(booking_at(rid, t1, 22 * H, 45)).await.unwrap();

        let query = Span::new(19 * H, 19 * H + 45 * MS_PER_MIN);
        let on_t1 = store
            .find_confirmed_overlapping(rid, Some(t1), query)
            .await
            .unwrap();
        assert_eq!(on_t1.len(), 1);

        let whole_restaurant = store
            .find_confirmed_overlapping(rid, None, query)
            .await
            .unwrap();
        assert_eq!(whole_restaurant.len(), 2);
    }

    #[tokio::test]
    async fn unknown_restaurant_has_no_bookings() {
        let store = MemoryStore::new();
        let found = store
            .find_confirmed_overlapping(Ulid::new(), None, Span::new(0, 1000))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn update_status_unknown_booking() {
        let store = MemoryStore::new();
        let result = store
            .update_status(Ulid::new(), BookingStatus::Cancelled)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn requester_history_newest_first() {
        let store = MemoryStore::new();
        let rid = Ulid::new();
        let requester = Ulid::new();

        for start in [19 * H, 21 * H, 20 * H] {
            let mut b = booking_at(rid, Ulid::new(), start, 45);
            b.requester_id = requester;
            store.insert(b).await.unwrap();
        }
        // Someone else's booking, must not show up.
        store.insert(booking_at(rid, Ulid::new(), 19 * H, 45)).await.unwrap();

        let history = store.bookings_for_requester(requester).await.unwrap();
        let starts: Vec<Ms> = history.iter().map(|b| b.requested_at).collect();
        assert_eq!(starts, vec![21 * H, 20 * H, 19 * H]);
    }

    #[tokio::test]
    async fn restaurant_history_oldest_first() {
        let store = MemoryStore::new();
        let rid = Ulid::new();

        for start in [21 * H, 19 * H, 20 * H] {
            store.insert(booking_at(rid, Ulid::new(), start, 45)).await.unwrap();
        }

        let history = store.bookings_for_restaurant(rid).await.unwrap();
        let starts: Vec<Ms> = history.iter().map(|b| b.requested_at).collect();
        assert_eq!(starts, vec![19 * H, 20 * H, 21 * H]);
    }

    #[test]
    fn directory_rejects_zero_capacity_table() {
        let directory = MemoryDirectory::new();
        let mut restaurant = RestaurantState::new("Bistro", vec![Table::new(4)]);
        restaurant.tables[0].capacity = 0;
        assert!(matches!(
            directory.insert(restaurant),
            Err(DirectoryError::LimitExceeded(_))
        ));
    }

    #[test]
    fn directory_buffer_rule_mutable_through_restaurant_only() {
        let directory = MemoryDirectory::new();
        let restaurant = RestaurantState::new("Bistro", vec![Table::new(4)]);
        let id = directory.insert(restaurant).unwrap();

        directory
            .set_buffer_rule(id, BufferRule { early_min: 10, late_min: 20 })
            .unwrap();

        let rule = BufferRule {
            early_min: MAX_BUFFER_MIN + 1,
            late_min: 0,
        };
        assert!(matches!(
            directory.set_buffer_rule(id, rule),
            Err(DirectoryError::LimitExceeded(_))
        ));
        assert!(matches!(
            directory.set_buffer_rule(Ulid::new(), BufferRule::default()),
            Err(DirectoryError::NotFound(_))
        ));
    }
}
