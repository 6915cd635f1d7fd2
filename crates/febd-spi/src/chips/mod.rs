//! Per-chip framers and drivers
//!
//! | Module       | Part    | Role                   | Fill   | MISO edge | Clock  |
//! |--------------|---------|------------------------|--------|-----------|--------|
//! | [`ad5535`]   | AD5535  | 32-channel DAC (DAC-A) | `0x00` | rising    | normal |
//! | [`ltc2668`]  | LTC2668 | 16-channel DAC (DAC-B) | `0x00` | falling   | normal |
//! | [`ad7194`]   | AD7194  | sigma-delta ADC (ADC-A)| `0xFF` | falling   | slow   |
//! | [`m95256`]   | M95256  | 32 KiB EEPROM          | `0xFF` | falling   | normal |
//! | [`max111xx`] | MAX111xx| SAR ADC (ADC-B)        | `0xFF` | falling   | slow   |
//!
//! Each module exposes a free `frame` function that builds the
//! [`SpiFrame`](crate::SpiFrame) for one command, and a driver struct that
//! owns an [`SpiMaster`](crate::SpiMaster) and runs the multi-transaction
//! sequences.

pub mod ad5535;
pub mod ad7194;
pub mod ltc2668;
pub mod m95256;
pub mod max111xx;

pub use ad5535::Ad5535;
pub use ad7194::Ad7194;
pub use ltc2668::Ltc2668;
pub use m95256::M95256;
pub use max111xx::Max111xx;
