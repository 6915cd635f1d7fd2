//! SPI-master transaction descriptor
//!
//! The FEB/D SPI master does not shift bytes on demand. Each transaction is
//! described up front as a cycle of bit ticks with four windows laid over
//! it:
//!
//! ```text
//! tick:   0        p              p+w            p+w+r          cycle
//!         |--------|--------------|--------------|--------------|
//! payload  padding   command        read region    padding
//! sclk en          [=============================)
//! cs              [==============================)      (per chip)
//! mosi    [=============================================)
//! miso                            [==============)
//! ```
//!
//! Payload bits are sent MSB first, byte 0 first. The master returns a
//! reply the same length as the payload in which the bytes covered by the
//! MISO window hold sampled input.

use crate::config::MAX_PAYLOAD;

/// Bounded byte buffer used for payloads and replies.
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD>;

/// Raw reply returned by the SPI master (same length as the payload).
pub type Reply = heapless::Vec<u8, MAX_PAYLOAD>;

/// Half-open interval `[start, end)` of bit ticks within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    /// First tick inside the window.
    pub start: u32,
    /// First tick after the window.
    pub end: u32,
}

impl Window {
    /// Create a window covering ticks `start..end`.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of ticks covered (0 for an inverted window).
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// True when the window covers no ticks.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// True when `0 <= start <= end <= cycle`.
    #[must_use]
    pub const fn fits(self, cycle: u32) -> bool {
        self.start <= self.end && self.end <= cycle
    }
}

/// Which window of a frame is being referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowKind {
    /// Clock-enable window.
    ClockEnable,
    /// Chip-select window.
    ChipSelect,
    /// Master-out window.
    Mosi,
    /// Master-in window.
    Miso,
}

/// Clock edge on which the master samples MISO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MisoEdge {
    /// Sample on the rising edge (master default).
    #[default]
    Rising,
    /// Sample on the falling edge.
    Falling,
}

/// SPI clock frequency selector understood by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockRate {
    /// Selector 0: normal SCLK.
    #[default]
    Normal = 0,
    /// Selector 1: reduced SCLK for chips with slow serial interfaces.
    Slow = 1,
}

impl ClockRate {
    /// Raw selector value passed to the master.
    #[must_use]
    pub const fn selector(self) -> u8 {
        self as u8
    }
}

/// Errors raised while building or decoding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The payload would not fit in [`MAX_PAYLOAD`] bytes.
    #[error("payload of {len} bytes exceeds the {max}-byte frame limit")]
    PayloadTooLong {
        /// Requested payload length.
        len: usize,
        /// Frame capacity.
        max: usize,
    },
    /// A window lies outside `[0, cycle]` or is inverted.
    #[error("{window:?} window lies outside the {cycle}-tick cycle")]
    WindowOutOfRange {
        /// Offending window.
        window: WindowKind,
        /// Cycle length in ticks.
        cycle: u32,
    },
    /// The payload carries fewer bits than the cycle clocks out.
    #[error("payload of {bits} bits is shorter than the {cycle}-tick cycle")]
    PayloadShort {
        /// Payload length in bits.
        bits: usize,
        /// Cycle length in ticks.
        cycle: u32,
    },
    /// The reply does not reach the end of the MISO window.
    #[error("reply of {got} bytes does not cover the MISO window ({expected} bytes needed)")]
    ShortReply {
        /// Bytes needed to cover the MISO window.
        expected: usize,
        /// Bytes actually returned.
        got: usize,
    },
}

/// One SPI-master transaction.
///
/// Built by the chip framers in [`crate::chips`]; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiFrame {
    cycle: u32,
    sclk: Window,
    cs: Window,
    mosi: Window,
    miso: Window,
    payload: Payload,
    clock: ClockRate,
    edge: MisoEdge,
}

impl SpiFrame {
    /// Start a frame whose payload is `lead` bytes of `fill`, then
    /// `command`, then `fill` up to `total` bytes.
    ///
    /// Windows default to empty; the cycle defaults to the full payload.
    pub(crate) fn padded(
        fill: u8,
        lead: usize,
        command: &[&[u8]],
        total: usize,
    ) -> Result<Self, FrameError> {
        let too_long = FrameError::PayloadTooLong {
            len: total,
            max: MAX_PAYLOAD,
        };
        let mut payload = Payload::new();
        payload.resize(lead, fill).map_err(|_| too_long)?;
        for part in command {
            payload.extend_from_slice(part).map_err(|_| too_long)?;
        }
        payload.resize(total, fill).map_err(|_| too_long)?;

        let cycle = bits(payload.len());
        Ok(Self {
            cycle,
            sclk: Window::new(0, 0),
            cs: Window::new(0, 0),
            mosi: Window::new(0, 0),
            miso: Window::new(0, 0),
            payload,
            clock: ClockRate::Normal,
            edge: MisoEdge::Rising,
        })
    }

    pub(crate) fn with_cycle(mut self, cycle: u32) -> Self {
        self.cycle = cycle;
        self
    }

    pub(crate) fn with_windows(
        mut self,
        sclk: Window,
        cs: Window,
        mosi: Window,
        miso: Window,
    ) -> Self {
        self.sclk = sclk;
        self.cs = cs;
        self.mosi = mosi;
        self.miso = miso;
        self
    }

    pub(crate) fn with_timing(mut self, clock: ClockRate, edge: MisoEdge) -> Self {
        self.clock = clock;
        self.edge = edge;
        self
    }

    /// Cycle length in bit ticks.
    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Clock-enable window.
    #[must_use]
    pub fn sclk(&self) -> Window {
        self.sclk
    }

    /// Chip-select window.
    #[must_use]
    pub fn cs(&self) -> Window {
        self.cs
    }

    /// MOSI window.
    #[must_use]
    pub fn mosi(&self) -> Window {
        self.mosi
    }

    /// MISO window.
    #[must_use]
    pub fn miso(&self) -> Window {
        self.miso
    }

    /// Payload bytes, MSB first.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Clock-rate selector.
    #[must_use]
    pub fn clock(&self) -> ClockRate {
        self.clock
    }

    /// MISO sampling edge.
    #[must_use]
    pub fn edge(&self) -> MisoEdge {
        self.edge
    }

    /// Byte range of the payload covered by the MISO window.
    #[must_use]
    pub fn miso_bytes(&self) -> core::ops::Range<usize> {
        let start = (self.miso.start / 8) as usize;
        let end = self.miso.end.div_ceil(8) as usize;
        start..end.max(start)
    }

    /// Check the window and payload invariants.
    ///
    /// # Errors
    ///
    /// [`FrameError::WindowOutOfRange`] for the first window outside the
    /// cycle, [`FrameError::PayloadShort`] when the payload does not cover it.
    pub fn validate(&self) -> Result<(), FrameError> {
        let windows = [
            (WindowKind::ClockEnable, self.sclk),
            (WindowKind::ChipSelect, self.cs),
            (WindowKind::Mosi, self.mosi),
            (WindowKind::Miso, self.miso),
        ];
        for (window, w) in windows {
            if !w.fits(self.cycle) {
                return Err(FrameError::WindowOutOfRange {
                    window,
                    cycle: self.cycle,
                });
            }
        }
        if bits(self.payload.len()) < self.cycle {
            return Err(FrameError::PayloadShort {
                bits: self.payload.len().saturating_mul(8),
                cycle: self.cycle,
            });
        }
        Ok(())
    }

    /// Slice the MISO-window bytes out of a reply to this frame.
    ///
    /// # Errors
    ///
    /// [`FrameError::ShortReply`] when `reply` ends before the window does.
    pub fn miso_data<'r>(&self, reply: &'r [u8]) -> Result<&'r [u8], FrameError> {
        let range = self.miso_bytes();
        let expected = range.end;
        reply.get(range).ok_or(FrameError::ShortReply {
            expected,
            got: reply.len(),
        })
    }
}

/// Payload length in bits, saturating at `u32::MAX`.
fn bits(len: usize) -> u32 {
    u32::try_from(len.saturating_mul(8)).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> SpiFrame {
        SpiFrame::padded(0xFF, 2, &[&[0xAB, 0xCD]], 6)
            .unwrap()
            .with_cycle(48)
            .with_windows(
                Window::new(16, 32),
                Window::new(0, 48),
                Window::new(0, 48),
                Window::new(16, 32),
            )
    }

    #[test]
    fn padded_layout() {
        let frame = sample();
        assert_eq!(frame.payload(), &[0xFF, 0xFF, 0xAB, 0xCD, 0xFF, 0xFF]);
        assert_eq!(frame.clock(), ClockRate::Normal);
        assert_eq!(frame.edge(), MisoEdge::Rising);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn padded_rejects_oversized_payload() {
        let big = [0u8; MAX_PAYLOAD];
        let err = SpiFrame::padded(0, 2, &[&big], MAX_PAYLOAD + 2).unwrap_err();
        assert_eq!(
            err,
            FrameError::PayloadTooLong {
                len: MAX_PAYLOAD + 2,
                max: MAX_PAYLOAD
            }
        );
    }

    #[test]
    fn validate_flags_window_past_cycle() {
        let frame = sample().with_windows(
            Window::new(16, 32),
            Window::new(0, 49),
            Window::new(0, 48),
            Window::new(16, 32),
        );
        assert_eq!(
            frame.validate(),
            Err(FrameError::WindowOutOfRange {
                window: WindowKind::ChipSelect,
                cycle: 48
            })
        );
    }

    #[test]
    fn validate_flags_inverted_window() {
        let frame = sample().with_windows(
            Window::new(32, 16),
            Window::new(0, 48),
            Window::new(0, 48),
            Window::new(16, 32),
        );
        assert!(matches!(
            frame.validate(),
            Err(FrameError::WindowOutOfRange {
                window: WindowKind::ClockEnable,
                ..
            })
        ));
    }

    #[test]
    fn validate_flags_short_payload() {
        let frame = sample().with_cycle(56).with_windows(
            Window::new(16, 32),
            Window::new(0, 56),
            Window::new(0, 56),
            Window::new(16, 32),
        );
        assert_eq!(
            frame.validate(),
            Err(FrameError::PayloadShort { bits: 48, cycle: 56 })
        );
    }

    #[test]
    fn miso_data_slices_window_bytes() {
        let frame = sample();
        let reply = [0xFF, 0xFF, 0x12, 0x34, 0xFF, 0xFF];
        assert_eq!(frame.miso_data(&reply).unwrap(), &[0x12, 0x34]);
    }

    #[test]
    fn miso_data_rejects_truncated_reply() {
        let frame = sample();
        assert_eq!(
            frame.miso_data(&[0xFF, 0xFF, 0x12]),
            Err(FrameError::ShortReply {
                expected: 4,
                got: 3
            })
        );
    }

    #[test]
    fn window_helpers() {
        let w = Window::new(15, 35);
        assert_eq!(w.len(), 20);
        assert!(w.fits(35));
        assert!(!w.fits(34));
        assert!(Window::new(8, 8).is_empty());
        assert_eq!(ClockRate::Slow.selector(), 1);
    }
}
