//! maitre — reservation admission and confidence scoring engine.
//!
//! Admits or rejects requests to occupy a table for a bounded duration and
//! publishes a 0–100 certainty score estimating how likely the reservation
//! is to be honorable under concurrent demand. One admission is a single
//! synchronous decision over a snapshot of the booking state; the engine
//! spawns no background tasks.
//!
//! Identity, wire framing, and long-term storage belong to the embedding
//! service and reach the engine only through the [`ports`] traits. The
//! [`store`] module ships in-memory reference implementations of those
//! ports, used by the test suite and suitable for embedders that do not
//! need durability.

pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod ports;
pub mod store;

pub use engine::{
    AdmissionError, Engine, certainty_score, confidence_window, estimate_duration, occupancy_span,
};
pub use model::{
    Assessment, Booking, BookingStatus, BufferRule, ConfidenceWindow, Ms, ReservationRequest,
    RestaurantState, Span, Table,
};
pub use ports::{BookingStore, DirectoryError, ResourceDirectory, StoreError};
pub use store::{MemoryDirectory, MemoryStore};
