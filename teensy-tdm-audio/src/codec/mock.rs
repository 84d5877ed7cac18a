//! Simulated control bus for the codec tests.
//!
//! [`MockBus`] models a stack of mux boards with four codecs each. A codec
//! only answers when exactly one mux channel in the whole tree is enabled,
//! which is how the real hardware behaves when two boards are left switched
//! on at once (both codecs ACK and the read is garbage).

use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::constants::{AIC3104_I2C_ADDRESS, CODECS_PER_BOARD, MAX_CODECS, MUX_BASE_ADDRESS, MUX_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError(pub ErrorKind);

impl i2c::Error for MockError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// One transaction seen on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Probe { address: u8 },
    Mux { address: u8, mask: u8 },
    Write { codec: u8, page: u8, reg: u8, value: u8 },
    Read { codec: u8, page: u8, reg: u8 },
}

pub struct MockBus {
    boards: u8,
    masks: [u8; MUX_MAX],
    /// Register files, `[codec][page][register]`.
    regs: [[[u8; 128]; 2]; MAX_CODECS],
    page: [u8; MAX_CODECS],
    log: Vec<BusEvent>,
    failing_codec: Option<u8>,
    failing_mux: Option<u8>,
}

impl MockBus {
    /// `boards` muxes at consecutive addresses from 0x70. Zero boards is a
    /// single codec wired directly to the bus.
    pub fn new(boards: u8) -> Self {
        MockBus {
            boards,
            masks: [0; MUX_MAX],
            regs: [[[0; 128]; 2]; MAX_CODECS],
            page: [0; MAX_CODECS],
            log: Vec::new(),
            failing_codec: None,
            failing_mux: None,
        }
    }

    pub fn log(&self) -> &[BusEvent] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn mux_writes(&self) -> usize {
        self.log.iter().filter(|e| matches!(e, BusEvent::Mux { .. })).count()
    }

    /// Page-0 register writes that reached `codec`, in order.
    pub fn writes_to(&self, codec: u8) -> Vec<(u8, u8)> {
        self.page_writes(codec, 0)
    }

    /// Register writes on `page` that reached `codec`, in order. Page
    /// switches are not included.
    pub fn page_writes(&self, codec: u8, page: u8) -> Vec<(u8, u8)> {
        self.log
            .iter()
            .filter_map(|e| match *e {
                BusEvent::Write { codec: c, page: p, reg, value } if c == codec && p == page && reg != 0 => {
                    Some((reg, value))
                }
                _ => None,
            })
            .collect()
    }

    pub fn reg(&self, codec: u8, page: u8, reg: u8) -> u8 {
        self.regs[codec as usize][page as usize][reg as usize]
    }

    pub fn set_reg(&mut self, codec: u8, page: u8, reg: u8, value: u8) {
        self.regs[codec as usize][page as usize][reg as usize] = value;
    }

    pub fn page(&self, codec: u8) -> u8 {
        self.page[codec as usize]
    }

    /// NACK every transfer addressed to `codec`.
    pub fn fail_codec(&mut self, codec: u8) {
        self.failing_codec = Some(codec);
    }

    pub fn fail_mux(&mut self, address: u8) {
        self.failing_mux = Some(address);
    }

    /// The single codec the mux tree currently connects, if any.
    pub fn selected_codec(&self) -> Option<u8> {
        if self.boards == 0 {
            return Some(0);
        }
        let mut selected = None;
        for board in 0..self.boards {
            let mask = self.masks[board as usize];
            if mask == 0 {
                continue;
            }
            if selected.is_some() || mask.count_ones() != 1 {
                return None;
            }
            selected = Some(board * CODECS_PER_BOARD + mask.trailing_zeros() as u8);
        }
        selected
    }

    fn mux_transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), MockError> {
        let index = address - MUX_BASE_ADDRESS;
        if index >= self.boards || self.failing_mux == Some(address) {
            return Err(MockError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) if bytes.is_empty() => self.log.push(BusEvent::Probe { address }),
                Operation::Write(bytes) => {
                    self.masks[index as usize] = bytes[0];
                    self.log.push(BusEvent::Mux { address, mask: bytes[0] });
                }
                Operation::Read(buf) => buf.fill(self.masks[index as usize]),
            }
        }
        Ok(())
    }

    fn codec_transaction(&mut self, operations: &mut [Operation<'_>]) -> Result<(), MockError> {
        let codec = self
            .selected_codec()
            .ok_or(MockError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)))?;
        if self.failing_codec == Some(codec) {
            return Err(MockError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)));
        }
        let c = codec as usize;
        let mut pointer = 0u8;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let Some((&reg, values)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = reg;
                    for &value in values {
                        let page = self.page[c];
                        self.log.push(BusEvent::Write { codec, page, reg: pointer, value });
                        if pointer == 0 {
                            self.page[c] = value & 0x01;
                        } else {
                            self.regs[c][page as usize][pointer as usize & 0x7F] = value;
                        }
                        pointer = pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buf) => {
                    let page = self.page[c];
                    for byte in buf.iter_mut() {
                        self.log.push(BusEvent::Read { codec, page, reg: pointer });
                        *byte = if pointer == 0 {
                            page
                        } else {
                            self.regs[c][page as usize][pointer as usize & 0x7F]
                        };
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

impl ErrorType for MockBus {
    type Error = MockError;
}

impl I2c for MockBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if (MUX_BASE_ADDRESS..MUX_BASE_ADDRESS + MUX_MAX as u8).contains(&address) {
            self.mux_transaction(address, operations)
        } else if address == AIC3104_I2C_ADDRESS {
            self.codec_transaction(operations)
        } else {
            Err(MockError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)))
        }
    }
}

/// Delay provider that only adds up the requested time.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Output pin that records every level it is driven to.
#[derive(Debug, Default)]
pub struct MockPin {
    pub levels: Vec<bool>,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PinErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.push(true);
        Ok(())
    }
}
