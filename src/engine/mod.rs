//! The admission pipeline: validate → estimate → window → score →
//! allocate → confirm. Each stage is its own module; the orchestration
//! lives in [`admission`].

mod admission;
mod allocator;
mod conflict;
mod duration;
mod error;
mod scorer;
mod window;

pub use conflict::occupancy_span;
pub use duration::estimate_duration;
pub use error::AdmissionError;
pub use scorer::certainty_score;
pub use window::confidence_window;

use std::sync::Arc;

use crate::ports::{BookingStore, ResourceDirectory};

/// One admission decision is a single synchronous computation over a
/// snapshot of the booking state. The engine spawns no background tasks
/// and holds no state of its own beyond its two ports.
pub struct Engine<D, S> {
    directory: Arc<D>,
    store: Arc<S>,
}

impl<D: ResourceDirectory, S: BookingStore> Engine<D, S> {
    pub fn new(directory: Arc<D>, store: Arc<S>) -> Self {
        Self { directory, store }
    }
}
