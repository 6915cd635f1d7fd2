//! Mock SPI master and delay for host-side testing
//!
//! [`MockSpiMaster`] records every transaction and answers with scripted
//! MISO bytes, a responder closure, or the idle bus level. [`MockDelay`]
//! records requested sleeps instead of blocking.

#![cfg(any(test, feature = "std"))]

use std::boxed::Box;
use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::config::FILL_HIGH;
use crate::frame::{Reply, SpiFrame};
use crate::master::{ChipAddress, SpiMaster};

/// Error injected by [`MockSpiMaster::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

/// One recorded transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Addressed chip.
    pub chip: ChipAddress,
    /// Frame as executed.
    pub frame: SpiFrame,
}

impl Transaction {
    /// Payload bytes after the leading padding (command plus trailing fill).
    #[must_use]
    pub fn command(&self) -> &[u8] {
        let start = (self.frame.sclk().start / 8) as usize;
        self.frame.payload().get(start..).unwrap_or_default()
    }
}

type Responder = Box<dyn FnMut(ChipAddress, &SpiFrame) -> Option<Vec<u8>>>;

/// Scriptable [`SpiMaster`] test double.
///
/// The MISO window of each reply is filled, in order of preference, from
/// the responder closure, the scripted queue, or [`FILL_HIGH`] (idle bus).
/// Bytes outside the window echo the payload.
pub struct MockSpiMaster {
    transactions: Vec<Transaction>,
    scripted: VecDeque<Vec<u8>>,
    responder: Option<Responder>,
    fail_next: bool,
}

impl MockSpiMaster {
    /// Mock with an idle bus and nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            scripted: VecDeque::new(),
            responder: None,
            fail_next: false,
        }
    }

    /// Mock whose MISO bytes are computed by `responder`.
    ///
    /// Returning `None` falls back to the scripted queue.
    #[must_use]
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(ChipAddress, &SpiFrame) -> Option<Vec<u8>> + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Queue MISO bytes for the next unanswered transaction.
    pub fn push_miso(&mut self, data: &[u8]) -> &mut Self {
        self.scripted.push_back(data.to_vec());
        self
    }

    /// Make the next transaction fail with [`MockBusError`].
    pub fn fail_next(&mut self) -> &mut Self {
        self.fail_next = true;
        self
    }

    /// All transactions executed so far.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Scripted replies not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.scripted.len()
    }

    /// Forget recorded transactions.
    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}

impl Default for MockSpiMaster {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiMaster for MockSpiMaster {
    type Error = MockBusError;

    fn execute(&mut self, chip: ChipAddress, frame: &SpiFrame) -> Result<Reply, Self::Error> {
        if core::mem::take(&mut self.fail_next) {
            return Err(MockBusError);
        }
        self.transactions.push(Transaction {
            chip,
            frame: frame.clone(),
        });

        let data = self
            .responder
            .as_mut()
            .and_then(|respond| respond(chip, frame))
            .or_else(|| self.scripted.pop_front())
            .unwrap_or_default();

        let window = frame.miso_bytes();
        let mut reply = Reply::new();
        for (i, &byte) in frame.payload().iter().enumerate() {
            let value = if window.contains(&i) {
                let offset = i.saturating_sub(window.start);
                data.get(offset).copied().unwrap_or(FILL_HIGH)
            } else {
                byte
            };
            // Payload and reply share the same capacity.
            let _ = reply.push(value);
        }
        Ok(reply)
    }
}

/// [`DelayNs`] that records requested delays instead of sleeping.
#[derive(Debug, Default, Clone)]
pub struct MockDelay {
    total_ns: u64,
    calls: usize,
}

impl MockDelay {
    /// Fresh delay with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delay calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Total requested delay, in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Total requested delay, in whole milliseconds.
    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls = self.calls.saturating_add(1);
        self.total_ns = self.total_ns.saturating_add(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.calls = self.calls.saturating_add(1);
        self.total_ns = self
            .total_ns
            .saturating_add(u64::from(us).saturating_mul(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls = self.calls.saturating_add(1);
        self.total_ns = self
            .total_ns
            .saturating_add(u64::from(ms).saturating_mul(1_000_000));
    }
}
