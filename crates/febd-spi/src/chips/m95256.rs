//! M95256 256-Kbit SPI EEPROM (STMicroelectronics)
//!
//! Instruction set used here: READ, WRITE, RDSR, WREN, WRDI. Addresses are
//! 16 bits big-endian; the array is 32 KiB organised in 64-byte pages.
//!
//! # Interface constraints
//!
//! - Idle bus level is high; padding and read regions are `0xFF`.
//! - Q changes on the falling edge of C; MISO is sampled on the falling edge.
//! - /S is held for exactly the command plus read region.
//! - The DAQ returns at most two bytes per read transaction, so reads are
//!   split into 2-byte chunks.
//! - A WRITE that runs past the end of a page wraps to the start of the same
//!   page, so writes are split at page boundaries.
//! - After WRITE the chip runs an internal write cycle (tW, 5 ms max) with
//!   WIP set in the status register; no other instruction is accepted until
//!   it clears.

use embedded_hal::delay::DelayNs;

use crate::config::{
    PollPolicy, FILL_HIGH, M95256_MAX_POLLS, M95256_POLL_INTERVAL_MS, MAX_PAYLOAD, PAD_BITS,
    PAD_BYTES,
};
use crate::frame::{ClockRate, FrameError, MisoEdge, Payload, SpiFrame, Window};
use crate::master::{transact, ChipAddress, SpiMaster};
use crate::poll::poll_until;
use crate::Error;

/// Write enable.
pub const WREN: u8 = 0b0000_0110;
/// Write disable.
pub const WRDI: u8 = 0b0000_0100;
/// Read status register.
pub const RDSR: u8 = 0b0000_0101;
/// Read from memory array.
pub const READ: u8 = 0b0000_0011;
/// Write to memory array.
pub const WRITE: u8 = 0b0000_0010;

/// Status register: write in progress.
pub const STATUS_WIP: u8 = 0x01;
/// Status register: write enable latch.
pub const STATUS_WEL: u8 = 0x02;

/// Memory array size in bytes.
pub const CAPACITY: usize = 32 * 1024;
/// Write page size in bytes.
pub const PAGE_SIZE: usize = 64;
/// Largest read the DAQ returns in one transaction.
pub const READ_CHUNK: usize = 2;

/// Default poll policy: 10 ms between status reads, bounded.
pub const DEFAULT_POLL: PollPolicy = PollPolicy::new(M95256_POLL_INTERVAL_MS, M95256_MAX_POLLS);

/// Frame `command` followed by a `read_count`-byte read window.
///
/// # Errors
///
/// [`FrameError::PayloadTooLong`] if the command plus read region do not
/// fit in one frame.
// bounded by MAX_PAYLOAD
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
pub fn frame(command: &[u8], read_count: usize) -> Result<SpiFrame, FrameError> {
    let total = PAD_BYTES
        .saturating_add(command.len())
        .saturating_add(read_count)
        .saturating_add(PAD_BYTES);
    let frame = SpiFrame::padded(FILL_HIGH, PAD_BYTES, &[command], total)?;

    let p = PAD_BITS;
    let w = 8 * command.len() as u32;
    let r = 8 * read_count as u32;
    Ok(frame
        .with_cycle(p + w + r + p)
        .with_windows(
            Window::new(p, p + w + r + 1),
            Window::new(p, p + w + r),
            Window::new(0, p + w + r + p),
            Window::new(p + w, p + w + r),
        )
        .with_timing(ClockRate::Normal, MisoEdge::Falling))
}

/// READ instruction for `address`.
#[must_use]
pub fn read_command(address: u16) -> [u8; 3] {
    let [hi, lo] = address.to_be_bytes();
    [READ, hi, lo]
}

/// WRITE instruction header for `address` (data bytes follow).
#[must_use]
pub fn write_command(address: u16) -> [u8; 3] {
    let [hi, lo] = address.to_be_bytes();
    [WRITE, hi, lo]
}

/// Check that `len` bytes starting at `address` stay inside the array.
fn check_range<E>(address: u16, len: usize) -> Result<(), Error<E>> {
    match usize::from(address).checked_add(len) {
        Some(end) if end <= CAPACITY => Ok(()),
        _ => Err(Error::OutOfBounds { address, len }),
    }
}

/// Split `[address, address + len)` at page boundaries.
///
/// `PAGE_SIZE` is a power of two.
///
/// Yields `(page_address, offset_into_data, length)`.
fn pages(address: u16, len: usize) -> impl Iterator<Item = (u16, usize, usize)> {
    let mut offset = 0usize;
    core::iter::from_fn(move || {
        if offset >= len {
            return None;
        }
        let at = usize::from(address).saturating_add(offset);
        let room = PAGE_SIZE.saturating_sub(at & (PAGE_SIZE - 1));
        let count = room.min(len.saturating_sub(offset));
        let item = (u16::try_from(at).ok()?, offset, count);
        offset = offset.saturating_add(count);
        Some(item)
    })
}

/// M95256 driver handle.
pub struct M95256<M, D> {
    master: M,
    delay: D,
    chip: ChipAddress,
    poll: PollPolicy,
}

impl<M: SpiMaster, D: DelayNs> M95256<M, D> {
    /// Driver for the M95256 at `chip` with the [`DEFAULT_POLL`] policy.
    pub fn new(master: M, delay: D, chip: ChipAddress) -> Self {
        Self {
            master,
            delay,
            chip,
            poll: DEFAULT_POLL,
        }
    }

    /// Replace the write-in-progress poll policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Chip this driver talks to.
    pub fn chip(&self) -> ChipAddress {
        self.chip
    }

    /// Send `command`, read back `buf.len()` bytes into `buf`.
    fn exchange(&mut self, command: &[u8], buf: &mut [u8]) -> Result<(), Error<M::Error>> {
        let frame = frame(command, buf.len())?;
        let reply = transact(&mut self.master, self.chip, &frame)?;
        let data = frame.miso_data(&reply)?;
        buf.copy_from_slice(data);
        Ok(())
    }

    /// Send a one-byte instruction that takes no data.
    ///
    /// One status-sized byte is clocked after it, as the DAQ firmware
    /// expects for single-byte instructions.
    fn instruction(&mut self, opcode: u8) -> Result<(), Error<M::Error>> {
        self.exchange(&[opcode], &mut [0u8; 1])
    }

    /// Read the status register.
    pub fn read_status(&mut self) -> Result<u8, Error<M::Error>> {
        let mut status = [0u8; 1];
        self.exchange(&[RDSR], &mut status)?;
        let [status] = status;
        Ok(status)
    }

    /// Wait for any internal write cycle to finish.
    fn wait_write_done(&mut self) -> Result<u32, Error<M::Error>> {
        let Self {
            master,
            delay,
            chip,
            poll,
        } = self;
        poll_until(delay, *poll, || {
            let frame = frame(&[RDSR], 1)?;
            let reply = transact(&mut *master, *chip, &frame)?;
            let status = frame.miso_data(&reply)?;
            Ok(status.first().is_some_and(|s| s & STATUS_WIP == 0))
        })
    }

    /// Fill `buf` with the bytes stored from `address` onwards.
    pub fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Error<M::Error>> {
        check_range(address, buf.len())?;
        let mut at = address;
        for chunk in buf.chunks_mut(READ_CHUNK) {
            self.exchange(&read_command(at), chunk)?;
            // check_range keeps `at` below CAPACITY
            #[allow(clippy::cast_possible_truncation)]
            let step = chunk.len() as u16;
            at = at.wrapping_add(step);
        }
        tracing::debug!(address, len = buf.len(), "M95256 read");
        Ok(())
    }

    /// Store `data` from `address` onwards.
    ///
    /// Each page touched runs its own write-enable / write / wait cycle.
    /// An empty `data` is a no-op and issues no transaction.
    pub fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Error<M::Error>> {
        check_range(address, data.len())?;
        for (at, offset, len) in pages(address, data.len()) {
            let chunk = data
                .get(offset..offset.saturating_add(len))
                .unwrap_or_default();
            self.write_page(at, chunk)?;
        }
        tracing::debug!(address, len = data.len(), "M95256 write");
        Ok(())
    }

    fn write_page(&mut self, address: u16, chunk: &[u8]) -> Result<(), Error<M::Error>> {
        self.wait_write_done()?;

        // Cycle the write enable latch. WRDI first leaves WEL in a known
        // state before WREN sets it.
        self.instruction(WRDI)?;
        self.instruction(WREN)?;

        let mut command = Payload::new();
        command
            .extend_from_slice(&write_command(address))
            .and_then(|()| command.extend_from_slice(chunk))
            .map_err(|_| FrameError::PayloadTooLong {
                len: chunk.len().saturating_add(3),
                max: MAX_PAYLOAD,
            })?;
        let frame = frame(&command, 0)?;
        transact(&mut self.master, self.chip, &frame)?;

        let polls = self.wait_write_done()?;
        tracing::trace!(address, len = chunk.len(), polls, "M95256 page written");

        // WEL resets on its own after the write cycle; clear it anyway.
        self.instruction(WRDI)
    }

    /// Give back the SPI master and delay.
    pub fn release(self) -> (M, D) {
        (self.master, self.delay)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;

    #[test]
    fn frame_holds_cs_for_command_and_read() {
        let f = frame(&read_command(0x0010), 2).unwrap();
        assert_eq!(
            f.payload(),
            &[0xFF, 0xFF, 0x03, 0x00, 0x10, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(f.cycle(), 16 + 24 + 16 + 16);
        assert_eq!(f.sclk(), Window::new(16, 57));
        assert_eq!(f.cs(), Window::new(16, 56));
        assert_eq!(f.mosi(), Window::new(0, 72));
        assert_eq!(f.miso(), Window::new(40, 56));
        assert_eq!(f.clock(), ClockRate::Normal);
        assert_eq!(f.edge(), MisoEdge::Falling);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn commands_are_big_endian() {
        assert_eq!(read_command(0x1234), [0x03, 0x12, 0x34]);
        assert_eq!(write_command(0x7FC0), [0x02, 0x7F, 0xC0]);
    }

    #[test]
    fn range_check_rejects_past_end() {
        assert!(check_range::<()>(0x7FFE, 2).is_ok());
        assert_eq!(
            check_range::<()>(0x7FFF, 2),
            Err(Error::OutOfBounds {
                address: 0x7FFF,
                len: 2
            })
        );
        assert!(check_range::<()>(0xFFFF, 1).is_err());
    }

    #[test]
    fn pages_split_at_boundaries() {
        let split: std::vec::Vec<_> = pages(0x003E, 70).collect();
        assert_eq!(split, [(0x003E, 0, 2), (0x0040, 2, 64), (0x0080, 66, 4)]);
        let aligned: std::vec::Vec<_> = pages(0x0100, 64).collect();
        assert_eq!(aligned, [(0x0100, 0, 64)]);
        assert_eq!(pages(0, 0).count(), 0);
    }

    #[test]
    fn full_page_write_fits_in_a_frame() {
        let mut command = std::vec![0x02, 0x00, 0x40];
        command.extend_from_slice(&[0xA5; PAGE_SIZE]);
        let f = frame(&command, 0).unwrap();
        assert_eq!(f.payload().len(), 2 + 3 + PAGE_SIZE + 2);
        assert!(f.validate().is_ok());
    }
}
