//! Driver error type

use crate::frame::FrameError;

/// Errors returned by the chip drivers.
///
/// `E` is the error type of the underlying [`crate::SpiMaster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
pub enum Error<E> {
    /// The SPI master failed to execute a transaction.
    #[error("SPI master transaction failed: {0:?}")]
    Master(E),
    /// A frame could not be built or its reply could not be decoded.
    #[error("frame error: {0}")]
    Frame(FrameError),
    /// A status poll exhausted its [`crate::PollPolicy`] budget.
    #[error("chip still busy after {polls} status polls")]
    Timeout {
        /// Status reads performed.
        polls: u32,
    },
    /// A MAX111xx conversion echoed a different channel than requested.
    #[error("channel echo mismatch: requested {requested}, chip reported {echoed}")]
    ChannelMismatch {
        /// Channel written in the control word.
        requested: u8,
        /// Channel tag carried by the conversion result.
        echoed: u8,
    },
    /// An EEPROM access extends past the end of the memory array.
    #[error("access of {len} bytes at 0x{address:04X} runs past the end of the array")]
    OutOfBounds {
        /// First byte address.
        address: u16,
        /// Access length in bytes.
        len: usize,
    },
}

impl<E> From<FrameError> for Error<E> {
    fn from(err: FrameError) -> Self {
        Error::Frame(err)
    }
}
