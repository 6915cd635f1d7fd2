//! SPI-master abstraction
//!
//! The FEB/D DAQ exposes a single SPI primitive: execute one framed
//! transaction against a chip and return what came back on MISO. The
//! transport (daqd socket, firmware register file, test double) is the
//! caller's business; drivers only see this trait.

use crate::frame::{Reply, SpiFrame};

/// Physical location of an SPI chip behind the DAQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChipAddress {
    /// DAQ port the FEB/D is attached to.
    pub port_id: u8,
    /// FEB/D slave number on that port.
    pub slave_id: u8,
    /// SPI slave (chip-select line) on the FEB/D.
    pub chip_id: u8,
}

impl ChipAddress {
    /// Create an address from its port, slave and chip numbers.
    #[must_use]
    pub const fn new(port_id: u8, slave_id: u8, chip_id: u8) -> Self {
        Self {
            port_id,
            slave_id,
            chip_id,
        }
    }
}

/// Executes framed SPI transactions.
///
/// Implementations clock out `frame.payload()` over `frame.cycle()` ticks
/// honouring the four windows, the clock-rate selector and the MISO edge,
/// and return a reply of the same length as the payload with the
/// MISO-window bytes replaced by sampled input.
///
/// Callers must serialise access to a given chip: chip state such as the
/// EEPROM write-enable latch persists between transactions.
pub trait SpiMaster {
    /// Transport error.
    type Error: core::fmt::Debug;

    /// Execute one transaction against `chip`.
    fn execute(&mut self, chip: ChipAddress, frame: &SpiFrame) -> Result<Reply, Self::Error>;
}

impl<M: SpiMaster + ?Sized> SpiMaster for &mut M {
    type Error = M::Error;

    fn execute(&mut self, chip: ChipAddress, frame: &SpiFrame) -> Result<Reply, Self::Error> {
        (**self).execute(chip, frame)
    }
}

/// Execute `frame` on `chip` after checking its invariants.
pub(crate) fn transact<M: SpiMaster>(
    master: &mut M,
    chip: ChipAddress,
    frame: &SpiFrame,
) -> Result<Reply, crate::Error<M::Error>> {
    frame.validate()?;
    tracing::trace!(
        port = chip.port_id,
        slave = chip.slave_id,
        chip = chip.chip_id,
        cycle = frame.cycle(),
        bytes = frame.payload().len(),
        "executing SPI frame"
    );
    master.execute(chip, frame).map_err(crate::Error::Master)
}
