//! AD7194 precision sigma-delta ADC (Analog Devices)
//!
//! Every access starts with a write to the communications register, which
//! selects the target register and the direction. The frame prepends one
//! `0x00` byte ahead of the command so the interface sees a clean
//! communications-register write even if it was left mid-word.
//!
//! # Interface constraints
//!
//! - Idle bus level is high: padding and the read region are `0xFF`, which
//!   also keeps DIN high while data is shifted out.
//! - DOUT changes on the falling SCLK edge; MISO is sampled on the falling
//!   edge at the reduced clock rate.
//! - One extra SCLK tick after the read region is needed for the chip to
//!   release DOUT/RDY, so clock-enable and /CS both run one tick past it.
//!
//! # Read sequence
//!
//! [`Ad7194::read_channel`] resets the interface, programs the mode and
//! configuration registers, polls the status register until /RDY clears,
//! then reads the data register. The mode word sets DAT_STA, so the data
//! read returns 24 bits of sample followed by the status byte.

use embedded_hal::delay::DelayNs;

use crate::config::{
    PollPolicy, AD7194_MAX_POLLS, AD7194_POLL_INTERVAL_MS, FILL_HIGH, MAX_PAYLOAD, PAD_BITS,
    PAD_BYTES,
};
use crate::frame::{ClockRate, FrameError, MisoEdge, Payload, SpiFrame, Window};
use crate::master::{transact, ChipAddress, SpiMaster};
use crate::poll::poll_until;
use crate::Error;

/// Interface reset: 64 consecutive ones on DIN.
pub const RESET: [u8; 8] = [0xFF; 8];

/// Write the mode register: continuous conversion, DAT_STA set, internal
/// clock, filter word 0x060.
pub const WRITE_MODE: [u8; 4] = [0b0000_1000, 0b0001_1011, 0b0010_0100, 0b0110_0000];

/// Communications-register byte selecting a configuration-register write.
pub const WRITE_CONFIG: u8 = 0b0001_0000;

/// Read the status register.
pub const READ_STATUS: [u8; 1] = [0b0100_0000];

/// Read the data register (with appended status when DAT_STA is set).
pub const READ_DATA: [u8; 1] = [0x58];

/// Status register /RDY bit: set while no new conversion is available.
pub const STATUS_NOT_READY: u8 = 0x80;

/// Bytes returned by a data-register read (24-bit sample + status).
pub const DATA_READ_LEN: usize = 4;

/// Default poll policy: 100 ms between status reads, bounded.
pub const DEFAULT_POLL: PollPolicy = PollPolicy::new(AD7194_POLL_INTERVAL_MS, AD7194_MAX_POLLS);

/// Configuration-register write selecting `channel`.
///
/// The channel selector occupies bits 4–7 of the third byte.
#[must_use]
#[allow(clippy::arithmetic_side_effects)] // high bits of channel are discarded
pub fn config_command(channel: u8) -> [u8; 4] {
    [WRITE_CONFIG, 0b0000_0100, channel << 4, 0b0101_1000]
}

/// True when a status byte reports a completed conversion.
#[must_use]
pub const fn is_ready(status: u8) -> bool {
    status & STATUS_NOT_READY == 0
}

/// Combine the first three data-read bytes into the 24-bit sample.
///
/// Returns `None` if fewer than three bytes are supplied.
#[must_use]
pub fn decode_sample(data: &[u8]) -> Option<u32> {
    match data {
        [hi, mid, lo, ..] => Some(u32::from_be_bytes([0, *hi, *mid, *lo])),
        _ => None,
    }
}

/// Frame `command` followed by a `read_count`-byte read window.
///
/// # Errors
///
/// [`FrameError::PayloadTooLong`] if the command plus read region do not
/// fit in one frame.
// bounded by MAX_PAYLOAD
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
pub fn frame(command: &[u8], read_count: usize) -> Result<SpiFrame, FrameError> {
    let cmd_len = command.len().saturating_add(1);
    let total = PAD_BYTES
        .saturating_add(cmd_len)
        .saturating_add(read_count)
        .saturating_add(PAD_BYTES);
    let frame = SpiFrame::padded(FILL_HIGH, PAD_BYTES, &[&[0x00], command], total)?;

    let p = PAD_BITS;
    let w = 8 * cmd_len as u32;
    let r = 8 * read_count as u32;
    Ok(frame
        .with_cycle(p + w + r + p)
        .with_windows(
            Window::new(p, p + w + r + 1),
            Window::new(p - 1, p + w + r + 1),
            Window::new(0, p + w + r + p),
            Window::new(p + w, p + w + r),
        )
        .with_timing(ClockRate::Slow, MisoEdge::Falling))
}

/// Issue `command` on `chip` and copy out the `read_count` bytes read back.
fn exchange<M: SpiMaster>(
    master: &mut M,
    chip: ChipAddress,
    command: &[u8],
    read_count: usize,
) -> Result<Payload, Error<M::Error>> {
    let frame = frame(command, read_count)?;
    let reply = transact(master, chip, &frame)?;
    let data = frame.miso_data(&reply)?;
    Payload::from_slice(data).map_err(|_| {
        Error::Frame(FrameError::PayloadTooLong {
            len: data.len(),
            max: MAX_PAYLOAD,
        })
    })
}

/// AD7194 driver handle.
pub struct Ad7194<M, D> {
    master: M,
    delay: D,
    chip: ChipAddress,
    poll: PollPolicy,
}

impl<M: SpiMaster, D: DelayNs> Ad7194<M, D> {
    /// Driver for the AD7194 at `chip` with the [`DEFAULT_POLL`] policy.
    pub fn new(master: M, delay: D, chip: ChipAddress) -> Self {
        Self {
            master,
            delay,
            chip,
            poll: DEFAULT_POLL,
        }
    }

    /// Replace the conversion-ready poll policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Chip this driver talks to.
    pub fn chip(&self) -> ChipAddress {
        self.chip
    }

    /// Issue `command` and return the `read_count` bytes read back.
    fn exchange(&mut self, command: &[u8], read_count: usize) -> Result<Payload, Error<M::Error>> {
        exchange(&mut self.master, self.chip, command, read_count)
    }

    /// Read the status register.
    pub fn read_status(&mut self) -> Result<u8, Error<M::Error>> {
        let data = self.exchange(&READ_STATUS, 1)?;
        data.first().copied().ok_or(Error::Frame(FrameError::ShortReply {
            expected: 1,
            got: 0,
        }))
    }

    /// Convert `channel` and return the raw 24-bit sample.
    ///
    /// Blocks until the chip reports a finished conversion or the poll
    /// policy runs out.
    pub fn read_channel(&mut self, channel: u8) -> Result<u32, Error<M::Error>> {
        self.exchange(&RESET, 0)?;
        self.exchange(&WRITE_MODE, 0)?;
        self.exchange(&config_command(channel), 0)?;

        let Self {
            master,
            delay,
            chip,
            poll,
        } = self;
        let polls = poll_until(delay, *poll, || {
            let status = exchange(&mut *master, *chip, &READ_STATUS, 1)?;
            Ok(status.first().copied().is_some_and(is_ready))
        })?;
        tracing::debug!(channel, polls, "AD7194 conversion ready");

        let data = self.exchange(&READ_DATA, DATA_READ_LEN)?;
        decode_sample(&data).ok_or(Error::Frame(FrameError::ShortReply {
            expected: DATA_READ_LEN,
            got: data.len(),
        }))
    }

    /// Give back the SPI master and delay.
    pub fn release(self) -> (M, D) {
        (self.master, self.delay)
    }
}
