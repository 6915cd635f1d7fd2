//! SPI command codec for FEB/D front-end boards
//!
//! The FEB/D data-acquisition link exposes one SPI primitive: a framed
//! transaction with explicit clock-enable, chip-select, MOSI and MISO
//! windows over a fixed cycle of bit ticks. This crate builds those frames
//! for the five chip families found on the boards and drives the
//! multi-step sequences (ADC conversion polling, EEPROM page writes,
//! presence checks) on top of a caller-supplied [`SpiMaster`].
//!
//! # Layers
//!
//! ```text
//! Drivers (Ad5535, Ltc2668, Ad7194, M95256, Max111xx)
//!         ↓
//! Framers (chips::*::frame) → SpiFrame
//!         ↓
//! SpiMaster trait (daqd link, firmware, MockSpiMaster)
//! ```
//!
//! # Features
//!
//! - `std` (default): host build, enables [`mock`]
//! - `serde`: `Serialize`/`Deserialize` on [`ChipAddress`] and [`PollPolicy`]
//! - `defmt`: `defmt::Format` on the value types
//!
//! # Example
//!
//! ```
//! use febd_spi::{mock::MockSpiMaster, ChipAddress, Ltc2668};
//!
//! let mut dac = Ltc2668::new(MockSpiMaster::new(), ChipAddress::new(0, 0, 3));
//! dac.set_channel(4, 0x8000).unwrap();
//! assert_eq!(dac.release().transactions().len(), 1);
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::doc_markdown)] // part numbers and register names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod chips;
pub mod config;
pub mod error;
pub mod frame;
pub mod master;
pub mod mock;
mod poll;

pub use chips::{Ad5535, Ad7194, Ltc2668, Max111xx, M95256};
pub use config::PollPolicy;
pub use error::Error;
pub use frame::{ClockRate, FrameError, MisoEdge, Payload, Reply, SpiFrame, Window, WindowKind};
pub use master::{ChipAddress, SpiMaster};
