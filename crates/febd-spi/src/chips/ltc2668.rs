//! LTC2668 16-channel DAC (Analog Devices / Linear Technology)
//!
//! 24-bit input word: a command nibble, a channel nibble and a 16-bit code.
//! Only "write code to n, update n" is used. SDI is sampled on the rising
//! edge and SDO changes on the falling edge, so MISO is sampled on the
//! falling edge. /CS must rise one clock after the last bit.

use crate::config::{FILL_LOW, PAD_BITS, PAD_BYTES};
use crate::frame::{ClockRate, FrameError, MisoEdge, Reply, SpiFrame, Window};
use crate::master::{transact, ChipAddress, SpiMaster};
use crate::Error;

/// Command nibble: write code to channel n and update n.
pub const CMD_WRITE_UPDATE_N: u8 = 0b0011_0000;

/// Width of the input word, in bits.
pub const WORD_BITS: u32 = 24;

/// Build the 3-byte command for `channel` and `value`.
///
/// `channel` is added to the command nibble unchecked; valid values are
/// 0–15.
#[must_use]
pub fn command(channel: u8, value: u16) -> [u8; 3] {
    let [hi, lo] = value.to_be_bytes();
    [CMD_WRITE_UPDATE_N.wrapping_add(channel), hi, lo]
}

/// Build the transaction that writes and updates `channel`.
///
/// # Errors
///
/// Never fails for this fixed-size frame.
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
            Window::new(p - 1, p + w + 1),
            Window::new(0, p + w + p),
            Window::new(p, p + w),
        )
        .with_timing(ClockRate::Normal, MisoEdge::Falling))
}

/// LTC2668 driver handle.
pub struct Ltc2668<M> {
    master: M,
    chip: ChipAddress,
}

impl<M: SpiMaster> Ltc2668<M> {
    /// Driver for the LTC2668 at `chip`.
    pub fn new(master: M, chip: ChipAddress) -> Self {
        Self { master, chip }
    }

    /// Chip this driver talks to.
    pub fn chip(&self) -> ChipAddress {
        self.chip
    }

    /// Write `value` to `channel` and update its output.
    ///
    /// Returns the raw reply (the chip shifts out the previous word).
    pub fn set_channel(&mut self, channel: u8, value: u16) -> Result<Reply, Error<M::Error>> {
        let frame = frame(channel, value)?;
        tracing::debug!(channel, value, "LTC2668 set channel");
        transact(&mut self.master, self.chip, &frame)
    }

    /// Give back the SPI master.
    pub fn release(self) -> M {
        self.master
    }
}
