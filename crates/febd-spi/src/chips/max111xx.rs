//! MAX11100-series multichannel SAR ADC (Analog Devices / Maxim)
//!
//! Every transaction is a single 16-bit word. With echo enabled in CONFIG1
//! the chip shifts out, during each configuration write, the word received
//! in the previous transaction; this is how presence is detected. In manual
//! mode a conversion result comes back during the transaction that follows
//! the control word, tagged with its channel number in the top nibble.
//!
//! Idle bus level is high; padding is `0xFF`. /CS covers the whole cycle.
//! MISO is sampled on the falling edge at the reduced clock rate.

use crate::config::{FILL_HIGH, PAD_BITS, PAD_BYTES};
use crate::frame::{ClockRate, FrameError, MisoEdge, SpiFrame, Window};
use crate::master::{transact, ChipAddress, SpiMaster};
use crate::Error;

/// CONFIG1: single-ended reference, no averaging, scan 16, normal power,
/// echo on.
pub const CONFIG1: u16 = 0x8064;
/// CONFIG2: single-ended channels.
pub const CONFIG2: u16 = 0x8800;
/// CONFIG3: unipolar conversion.
pub const CONFIG3: u16 = 0x9000;
/// Manual external mode, channel 0, FIFO reset, normal power, channel ID
/// present, CS-controlled.
pub const CONTROL: u16 = 0x0826;
/// No-op word clocked to retrieve a pending conversion.
pub const REPEAT: u16 = 0x0000;

/// Bit position of the channel field in the control word.
pub const CONTROL_CHANNEL_SHIFT: u32 = 7;
/// Conversion result mask (12 bits).
pub const RESULT_MASK: u16 = 0x0FFF;
/// Bit position of the channel tag in a conversion result.
pub const RESULT_CHANNEL_SHIFT: u32 = 12;

/// Width of the input word, in bits.
pub const WORD_BITS: u32 = 16;

/// Reply of an absent chip (MISO pulled up).
const ABSENT: u16 = 0xFFFF;

/// Build the transaction that sends `command`.
///
/// # Errors
///
/// Never fails for this fixed-size frame.
#[allow(clippy::arithmetic_side_effects)] // tick arithmetic on small constants
pub fn frame(command: u16) -> Result<SpiFrame, FrameError> {
    let cmd = command.to_be_bytes();
    let p = PAD_BITS;
    let w = WORD_BITS;
    let total = PAD_BYTES + cmd.len() + PAD_BYTES;

    Ok(SpiFrame::padded(FILL_HIGH, PAD_BYTES, &[&cmd], total)?
        .with_cycle(p + w + p)
        .with_windows(
            Window::new(p, p + w),
            Window::new(0, p + w + p),
            Window::new(0, p + w + p),
            Window::new(p, p + w),
        )
        .with_timing(ClockRate::Slow, MisoEdge::Falling))
}

/// Control word that starts a conversion on `channel`.
#[must_use]
pub fn control_command(channel: u8) -> u16 {
    CONTROL.wrapping_add(u16::from(channel).wrapping_shl(CONTROL_CHANNEL_SHIFT))
}

/// Split a conversion word into `(channel, value)`.
#[must_use]
pub fn decode_result(word: u16) -> (u8, u16) {
    let [tag, _] = word.wrapping_shr(RESULT_CHANNEL_SHIFT).to_le_bytes();
    (tag, word & RESULT_MASK)
}

/// MAX111xx driver handle.
pub struct Max111xx<M> {
    master: M,
    chip: ChipAddress,
}

impl<M: SpiMaster> Max111xx<M> {
    /// Driver for the MAX111xx at `chip`.
    pub fn new(master: M, chip: ChipAddress) -> Self {
        Self { master, chip }
    }

    /// Chip this driver talks to.
    pub fn chip(&self) -> ChipAddress {
        self.chip
    }

    /// Send one word and return the 16 bits read back.
    fn exchange(&mut self, command: u16) -> Result<u16, Error<M::Error>> {
        let frame = frame(command)?;
        let reply = transact(&mut self.master, self.chip, &frame)?;
        match frame.miso_data(&reply)? {
            [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
            other => Err(Error::Frame(FrameError::ShortReply {
                expected: 2,
                got: other.len(),
            })),
        }
    }

    /// Configure the chip and confirm it is present.
    ///
    /// Writes CONFIG1..3 and the control word, checking that each write
    /// after the second echoes its predecessor. Returns `Ok(false)` when
    /// nothing answers or the echo is wrong; bus failures are errors.
    /// Safe to call repeatedly.
    pub fn check(&mut self) -> Result<bool, Error<M::Error>> {
        self.exchange(CONFIG1)?;
        self.exchange(CONFIG2)?;
        let echo = self.exchange(CONFIG3)?;

        if echo == ABSENT {
            tracing::debug!(chip = self.chip.chip_id, "MAX111xx not present");
            return Ok(false);
        }
        if echo != CONFIG2 {
            tracing::warn!(echo, expected = CONFIG2, "MAX111xx config echo mismatch");
            return Ok(false);
        }

        let echo = self.exchange(CONTROL)?;
        if echo != CONFIG3 {
            tracing::warn!(echo, expected = CONFIG3, "MAX111xx control echo mismatch");
            return Ok(false);
        }
        Ok(true)
    }

    /// Convert `channel` (0–15) and return the 12-bit result.
    ///
    /// The chip must have been configured with [`Max111xx::check`].
    pub fn read_channel(&mut self, channel: u8) -> Result<u16, Error<M::Error>> {
        self.exchange(control_command(channel))?;
        let word = self.exchange(REPEAT)?;
        let (echoed, value) = decode_result(word);
        if echoed != channel {
            tracing::warn!(requested = channel, echoed, "MAX111xx channel tag mismatch");
            return Err(Error::ChannelMismatch {
                requested: channel,
                echoed,
            });
        }
        tracing::trace!(channel, value, "MAX111xx conversion");
        Ok(value)
    }

    /// Give back the SPI master.
    pub fn release(self) -> M {
        self.master
    }
}
