//! Hard boundary limits, enforced before any port call.

use crate::model::Ms;

/// Earliest accepted instant (unix epoch).
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;

/// Latest accepted instant (2100-01-01T00:00:00Z).
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// Largest party a single request may seat.
pub const MAX_PARTY_SIZE: u32 = 512;

/// Widest buffer a rule may carry on either side, in minutes.
pub const MAX_BUFFER_MIN: u32 = 24 * 60;

/// Most tables a restaurant may list.
pub const MAX_TABLES_PER_RESTAURANT: usize = 4096;

/// Longest restaurant name the in-memory directory accepts.
pub const MAX_NAME_LEN: usize = 256;
