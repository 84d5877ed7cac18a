//! Register access to one codec of the array.
//!
//! [`CodecBus`] owns the I2C bus and serializes every transaction through
//! the mux router, so the selection cache always matches the hardware.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::i2c::{Error as _, I2c};
use log::{trace, warn};

use crate::config::{AudioConfig, BusTiming, Topology, Verbosity};
use crate::constants::AIC3104_I2C_ADDRESS;
use crate::error::BusError;

use super::mux::MuxRouter;

/// Placeholder for boards without a bus activity indicator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct CodecBus<I2C, D, P = NoPin> {
    i2c: I2C,
    delay: D,
    activity: P,
    router: MuxRouter,
    topology: Topology,
    timing: BusTiming,
    verbosity: Verbosity,
}

impl<I2C, D, P> CodecBus<I2C, D, P>
where
    I2C: I2c,
    D: DelayNs,
    P: OutputPin,
{
    pub fn new(i2c: I2C, delay: D, activity: P, config: &AudioConfig) -> Self {
        CodecBus {
            i2c,
            delay,
            activity,
            router: MuxRouter::new(config.timing),
            topology: config.topology,
            timing: config.timing,
            verbosity: config.verbosity,
        }
    }

    /// Discover the mux boards. A direct topology has none to find.
    pub fn probe(&mut self) -> u8 {
        match self.topology {
            Topology::Direct => 0,
            Topology::Multiplexed => {
                self.activity_on();
                let found = self.router.probe(&mut self.i2c, &mut self.delay);
                self.activity_off();
                found
            }
        }
    }

    /// Number of codecs the bus can reach.
    pub fn provisioned(&self) -> u8 {
        match self.topology {
            Topology::Direct => 1,
            Topology::Multiplexed => self.router.provisioned(),
        }
    }

    pub fn router(&self) -> &MuxRouter {
        &self.router
    }

    /// Drop the mux selection cache, e.g. after the muxes were reset.
    pub fn forget_selection(&mut self) {
        self.router.forget();
    }

    /// Connect `codec` to the bus without transferring anything.
    pub fn select(&mut self, codec: u8) -> Result<(), BusError> {
        if codec >= self.provisioned() {
            return Err(BusError::NotProvisioned { codec });
        }
        match self.topology {
            Topology::Direct => Ok(()),
            Topology::Multiplexed => self.router.select(codec, &mut self.i2c, &mut self.delay),
        }
    }

    /// Write one register on the codec's current page.
    pub fn write_register(&mut self, codec: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.select(codec)?;
        self.activity_on();
        let result = self.i2c.write(AIC3104_I2C_ADDRESS, &[reg, value]);
        self.activity_off();
        match result {
            Ok(()) => {
                if self.verbosity >= Verbosity::Detailed {
                    trace!("codec {codec}: W{reg} = 0x{value:02X}");
                }
                Ok(())
            }
            Err(e) => {
                warn!("codec {codec}: write of register {reg} failed: {}", e.kind());
                Err(BusError::Transfer { codec, kind: e.kind() })
            }
        }
    }

    /// Read one register on the codec's current page.
    ///
    /// The register pointer is written without a stop condition; a stop
    /// would put the codec in auto-increment mode and return `reg + 1`.
    pub fn read_register(&mut self, codec: u8, reg: u8) -> Result<u8, BusError> {
        self.select(codec)?;
        let mut value = [0u8];
        self.activity_on();
        let result = self.i2c.write_read(AIC3104_I2C_ADDRESS, &[reg], &mut value);
        self.delay.delay_us(self.timing.transfer_settle_us);
        self.activity_off();
        match result {
            Ok(()) => {
                if self.verbosity >= Verbosity::Detailed {
                    trace!("codec {codec}: R{reg} = 0x{:02X}", value[0]);
                }
                Ok(value[0])
            }
            Err(e) => {
                warn!("codec {codec}: read of register {reg} failed: {}", e.kind());
                Err(BusError::Transfer { codec, kind: e.kind() })
            }
        }
    }

    /// `new = (current & !mask) | (value & mask)`; returns the value written.
    pub fn modify_register(&mut self, codec: u8, reg: u8, mask: u8, value: u8) -> Result<u8, BusError> {
        let current = self.read_register(codec, reg)?;
        let new = (current & !mask) | (value & mask);
        self.write_register(codec, reg, new)?;
        Ok(new)
    }

    pub fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Consume the adapter and return its parts.
    pub fn release(self) -> (I2C, D, P) {
        (self.i2c, self.delay, self.activity)
    }

    #[cfg(test)]
    pub(crate) fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    // The indicator is diagnostic only; a failing pin never fails a transfer.
    fn activity_on(&mut self) {
        let _ = self.activity.set_high();
    }

    fn activity_off(&mut self) {
        let _ = self.activity.set_low();
    }
}
