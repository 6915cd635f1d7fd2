//! Framing constants and poll configuration
//!
//! Chip-specific register values live next to their framers in
//! [`crate::chips`]; this module holds the values shared across families
//! and the knobs a caller may want to tune.

/// Largest payload the SPI master accepts in one transaction, in bytes.
///
/// Sized for the biggest frame built here: an M95256 page write
/// (2 + 3 + 64 + 2 bytes).
pub const MAX_PAYLOAD: usize = 80;

/// Idle padding placed on each side of every command, in bytes.
pub const PAD_BYTES: usize = 2;

/// Idle padding width in bit ticks.
pub const PAD_BITS: u32 = 16;

const _: () = assert!(PAD_BITS as usize == 8 * PAD_BYTES);

/// Filler for chips whose idle bus level is low (DAC families).
pub const FILL_LOW: u8 = 0x00;

/// Filler for chips whose idle bus level is high (ADC and EEPROM families).
pub const FILL_HIGH: u8 = 0xFF;

/// Delay between AD7194 /RDY polls.
pub const AD7194_POLL_INTERVAL_MS: u32 = 100;

/// Default AD7194 poll budget (about 10 s at the default interval).
pub const AD7194_MAX_POLLS: u32 = 100;

/// Delay between M95256 write-in-progress polls.
pub const M95256_POLL_INTERVAL_MS: u32 = 10;

/// Default M95256 poll budget (about 1 s; tW is 5 ms max).
pub const M95256_MAX_POLLS: u32 = 100;

/// Bounded retry policy for status polling.
///
/// The chips signal completion through a status bit. A poll reads the bit,
/// and while it reports busy the driver sleeps `interval_ms` and tries
/// again. `max_polls` caps the number of status reads; `None` polls
/// forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PollPolicy {
    /// Delay between consecutive status reads, in milliseconds.
    pub interval_ms: u32,
    /// Maximum number of status reads before giving up.
    pub max_polls: Option<u32>,
}

impl PollPolicy {
    /// Bounded policy.
    #[must_use]
    pub const fn new(interval_ms: u32, max_polls: u32) -> Self {
        Self {
            interval_ms,
            max_polls: Some(max_polls),
        }
    }

    /// Poll until the chip reports ready, however long that takes.
    #[must_use]
    pub const fn unbounded(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            max_polls: None,
        }
    }

    /// Worst-case time spent sleeping before a timeout, in milliseconds.
    ///
    /// `None` for unbounded policies.
    #[must_use]
    pub fn budget_ms(&self) -> Option<u64> {
        self.max_polls.map(|polls| {
            u64::from(polls.saturating_sub(1)).saturating_mul(u64::from(self.interval_ms))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pad_bits_matches_pad_bytes() {
        assert_eq!(PAD_BITS as usize, 8 * PAD_BYTES);
    }

    #[test]
    fn budget_counts_sleeps_between_polls() {
        let policy = PollPolicy::new(10, 5);
        assert_eq!(policy.budget_ms(), Some(40));
        assert_eq!(PollPolicy::unbounded(10).budget_ms(), None);
    }

    #[allow(clippy::assertions_on_constants)]
    #[test]
    fn largest_eeprom_write_fits_in_a_frame() {
        assert!(2 * PAD_BYTES + 3 + crate::chips::m95256::PAGE_SIZE <= MAX_PAYLOAD);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn poll_policy_round_trips_through_json() {
        let policy = PollPolicy::new(100, 50);
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(json, r#"{"interval_ms":100,"max_polls":50}"#);
        let back: PollPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
