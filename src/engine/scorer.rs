use crate::model::{Booking, RestaurantState};

/// Aggregate capacity pressure over the proposed occupancy interval, 0–100.
///
/// This measures the whole room, not per-table fit: free seats may be
/// spread across tables no single one of which holds the party together,
/// so the allocator can report no table while the score stays high. The
/// score is a heuristic signal, never a guarantee.
///
/// `overlapping` is the set of confirmed bookings on the restaurant whose
/// occupancy overlaps the proposed interval, pre-fetched by the caller.
pub fn certainty_score(
    restaurant: &RestaurantState,
    overlapping: &[Booking],
    party_size: u32,
) -> u8 {
    let total_capacity = restaurant.total_capacity();
    if total_capacity == 0 {
        return 0;
    }

    let occupied: u32 = overlapping.iter().map(|b| b.party_size).sum();
    let available = total_capacity.saturating_sub(occupied);

    let raw = (available as f64 / total_capacity as f64 * 100.0).clamp(0.0, 100.0);
    let score = if available == 0 {
        0.0
    } else if available < party_size {
        // Not enough aggregate room for this party: penalize.
        (raw / 2.0).round()
    } else {
        raw.round()
    };
    score as u8
}
