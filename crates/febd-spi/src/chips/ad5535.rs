//! AD5535 32-channel DAC (Analog Devices)
//!
//! The AD5535 is loaded through a 19-bit shift register: 5 address bits
//! followed by a 14-bit code. The SPI master works in whole bytes, so the
//! word is left-aligned in three bytes with 5 trailing don't-care bits, and
//! the clock-enable window stops after the 19th bit.
//!
//! Idle bus level is low; padding is `0x00`. Data is latched on the rising
//! SCLK edge, which is the master's default.

use crate::config::{FILL_LOW, PAD_BITS, PAD_BYTES};
use crate::frame::{ClockRate, FrameError, MisoEdge, Reply, SpiFrame, Window};
use crate::master::{transact, ChipAddress, SpiMaster};
use crate::Error;

/// Width of the input shift register, in bits.
pub const WORD_BITS: u32 = 19;

/// Channel address mask (5 bits, 32 channels).
pub const CHANNEL_MASK: u8 = 0b1_1111;

/// DAC code mask (14 bits).
pub const VALUE_MASK: u16 = 0b11_1111_1111_1111;

/// Number of channels per chip.
pub const CHANNELS: u8 = 32;

/// Pack `channel` and `value` into the 3-byte, left-aligned command.
///
/// Out-of-range bits are masked off.
#[must_use]
#[allow(clippy::arithmetic_side_effects)] // shifts of masked fields stay inside u32
pub fn command(channel: u8, value: u16) -> [u8; 3] {
    let word = (u32::from(channel & CHANNEL_MASK) << 14) | u32::from(value & VALUE_MASK);
    let [_, hi, mid, lo] = (word << 5).to_be_bytes();
    [hi, mid, lo]
}

/// Build the transaction that loads `value` into `channel`.
///
/// # Errors
///
/// Never fails for this fixed-size frame; the `Result` mirrors the other
/// framers.
#[allow(clippy::arithmetic_side_effects)] // tick arithmetic on small constants
pub fn frame(channel: u8, value: u16) -> Result<SpiFrame, FrameError> {
    let cmd = command(channel, value);
    let p = PAD_BITS;
    let w = WORD_BITS;
    let total = PAD_BYTES + cmd.len() + PAD_BYTES;

    Ok(SpiFrame::padded(FILL_LOW, PAD_BYTES, &[&cmd], total)?
        .with_cycle(p + w + p)
        .with_windows(
            Window::new(p, p + w),
            Window::new(p - 1, p + w),
            Window::new(0, p + w + p),
            Window::new(p, p + w),
        )
        .with_timing(ClockRate::Normal, MisoEdge::Rising))
}

/// AD5535 driver handle.
pub struct Ad5535<M> {
    master: M,
    chip: ChipAddress,
}

impl<M: SpiMaster> Ad5535<M> {
    /// Driver for the AD5535 at `chip`.
    pub fn new(master: M, chip: ChipAddress) -> Self {
        Self { master, chip }
    }

    /// Chip this driver talks to.
    pub fn chip(&self) -> ChipAddress {
        self.chip
    }

    /// Load `value` (14 bits) into `channel` (0–31).
    ///
    /// Returns the raw reply; the AD5535 has no readback so its content is
    /// not meaningful.
    pub fn set_channel(&mut self, channel: u8, value: u16) -> Result<Reply, Error<M::Error>> {
        let frame = frame(channel, value)?;
        tracing::debug!(channel, value, "AD5535 set channel");
        transact(&mut self.master, self.chip, &frame)
    }

    /// Give back the SPI master.
    pub fn release(self) -> M {
        self.master
    }
}
