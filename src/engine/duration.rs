use super::AdmissionError;

/// Expected occupancy in minutes, keyed off party size.
///
/// The mapping is deterministic and always recomputed; bookings never carry
/// a duration that disagrees with it.
pub fn estimate_duration(party_size: u32) -> Result<u32, AdmissionError> {
    match party_size {
        0 => Err(AdmissionError::InvalidPartySize(0)),
        1..=2 => Ok(45),
        3..=4 => Ok(75),
        _ => Ok(90),
    }
}
