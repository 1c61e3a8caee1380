use std::collections::HashSet;

use ulid::Ulid;

use crate::model::{RestaurantState, Span};
use crate::ports::{BookingStore, StoreError};

/// First-fit scan in stored table order: the first table that seats the
/// party, is in service, is not excluded, and has no confirmed booking
/// overlapping `span`. Deliberately not best-fit — a large table may go to
/// a small party while a tighter fit stays free for a later request.
///
/// `excluded` holds tables that already lost a conditional insert during
/// this admission; the caller grows it on each store conflict.
pub(super) async fn first_free_table<S: BookingStore>(
    store: &S,
    restaurant: &RestaurantState,
    span: &Span,
    party_size: u32,
    excluded: &HashSet<Ulid>,
) -> Result<Option<Ulid>, StoreError> {
    for table in &restaurant.tables {
        if !table.fits(party_size) || excluded.contains(&table.id) {
            continue;
        }
        let overlapping = store
            .find_confirmed_overlapping(restaurant.id, Some(table.id), *span)
            .await?;
        if overlapping.is_empty() {
            return Ok(Some(table.id));
        }
    }
    Ok(None)
}
