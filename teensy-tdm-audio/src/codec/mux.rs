//! PCA9546 mux routing.
//!
//! Every codec answers at the same I2C address, so each expansion board puts
//! its four codecs behind a 1:4 mux. Reaching codec `n` means enabling
//! channel `n % 4` on board `n / 4` and disabling every other board's mux
//! first, or two codecs would answer at once.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use heapless::Vec;
use log::{debug, info, warn};

use crate::config::BusTiming;
use crate::constants::{CODECS_PER_BOARD, MUX_BASE_ADDRESS, MUX_MAX};
use crate::error::BusError;

/// Board and channel mask for a codec index.
pub const fn route(codec: u8) -> (u8, u8) {
    (codec / CODECS_PER_BOARD, 1 << (codec % CODECS_PER_BOARD))
}

/// Discovered muxes and the last codec they were switched to.
#[derive(Debug, Clone)]
pub struct MuxRouter {
    muxes: Vec<u8, MUX_MAX>,
    last_codec: Option<u8>,
    last_board: Option<u8>,
    timing: BusTiming,
}

impl MuxRouter {
    pub const fn new(timing: BusTiming) -> Self {
        MuxRouter {
            muxes: Vec::new(),
            last_codec: None,
            last_board: None,
            timing,
        }
    }

    /// Scan `0x70..0x78`, recording every address that acknowledges.
    ///
    /// Returns the number of muxes found. The table is rebuilt from scratch
    /// and the selection cache is dropped.
    pub fn probe<I2C: I2c, D: DelayNs>(&mut self, i2c: &mut I2C, delay: &mut D) -> u8 {
        self.muxes.clear();
        self.forget();
        for offset in 0..MUX_MAX as u8 {
            let address = MUX_BASE_ADDRESS + offset;
            match i2c.write(address, &[]) {
                Ok(()) => {
                    debug!("mux found at 0x{address:02X}");
                    let _ = self.muxes.push(address);
                }
                Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => {}
                Err(e) => warn!("bus error probing 0x{address:02X}: {}", e.kind()),
            }
            delay.delay_us(self.timing.probe_gap_us);
        }
        self.muxes.len() as u8
    }

    /// Warn when the configured codec count and the discovered boards differ.
    pub fn check_population(&self, codecs: u8) {
        let reachable = self.provisioned();
        if reachable != codecs {
            warn!("{codecs} codecs configured, discovered muxes reach {reachable}");
        }
    }

    /// Switch the mux tree so that `codec` alone is on the bus.
    ///
    /// Re-selecting the current codec costs nothing. Within a board one
    /// control write suffices; a board change rewrites every mux in index
    /// order, zero to the others and the channel mask to the target.
    pub fn select<I2C: I2c, D: DelayNs>(
        &mut self,
        codec: u8,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), BusError> {
        if self.last_codec == Some(codec) {
            return Ok(());
        }
        let (board, mask) = route(codec);
        if board as usize >= self.muxes.len() {
            return Err(BusError::NotProvisioned { codec });
        }

        delay.delay_us(self.timing.transfer_settle_us);
        let result = if self.last_board == Some(board) {
            self.write(self.muxes[board as usize], mask, i2c, delay)
        } else {
            self.switch_board(board, mask, i2c, delay)
        };

        match result {
            Ok(()) => {
                self.last_codec = Some(codec);
                self.last_board = Some(board);
                Ok(())
            }
            Err(e) => {
                // The tree is in an unknown state; start over next time.
                self.forget();
                Err(e)
            }
        }
    }

    fn switch_board<I2C: I2c, D: DelayNs>(
        &self,
        board: u8,
        mask: u8,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), BusError> {
        // Disable the other boards before enabling the target, whatever the
        // order of their indices.
        for (index, &address) in self.muxes.iter().enumerate() {
            if index != board as usize {
                self.write(address, 0, i2c, delay)?;
            }
        }
        self.write(self.muxes[board as usize], mask, i2c, delay)
    }

    fn write<I2C: I2c, D: DelayNs>(
        &self,
        address: u8,
        mask: u8,
        i2c: &mut I2C,
        delay: &mut D,
    ) -> Result<(), BusError> {
        let result = i2c
            .write(address, &[mask])
            .map_err(|e| BusError::Mux { address, kind: e.kind() });
        delay.delay_us(self.timing.mux_settle_us);
        result
    }

    /// Drop the selection cache so the next `select` rewrites the tree.
    pub fn forget(&mut self) {
        self.last_codec = None;
        self.last_board = None;
    }

    /// Codecs reachable through the discovered muxes.
    pub fn provisioned(&self) -> u8 {
        self.muxes.len() as u8 * CODECS_PER_BOARD
    }

    pub fn muxes(&self) -> &[u8] {
        &self.muxes
    }

    pub fn last_codec(&self) -> Option<u8> {
        self.last_codec
    }

    /// Log the mux table.
    pub fn list(&self) {
        info!("{} active muxes", self.muxes.len());
        for (index, address) in self.muxes.iter().enumerate() {
            info!("mux {index} = 0x{address:02X}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mock::{BusEvent, MockBus, MockDelay};

    fn probed(boards: u8) -> (MuxRouter, MockBus) {
        let mut bus = MockBus::new(boards);
        let mut router = MuxRouter::new(BusTiming::new());
        assert_eq!(router.probe(&mut bus, &mut MockDelay::new()), boards);
        bus.clear_log();
        (router, bus)
    }

    #[test]
    fn route_splits_board_and_channel() {
        assert_eq!(route(0), (0, 0b0001));
        assert_eq!(route(6), (1, 0b0100));
        assert_eq!(route(15), (3, 0b1000));
    }

    #[test]
    fn probe_records_acknowledging_addresses() {
        let (router, _) = probed(3);
        assert_eq!(router.muxes(), &[0x70, 0x71, 0x72]);
        assert_eq!(router.provisioned(), 12);
    }

    #[test]
    fn reselecting_is_free() {
        let (mut router, mut bus) = probed(2);
        let mut delay = MockDelay::new();
        router.select(5, &mut bus, &mut delay).unwrap();
        let after_first = bus.mux_writes();
        router.select(5, &mut bus, &mut delay).unwrap();
        router.select(5, &mut bus, &mut delay).unwrap();
        assert_eq!(bus.mux_writes(), after_first);
    }

    #[test]
    fn same_board_costs_one_write() {
        let (mut router, mut bus) = probed(4);
        let mut delay = MockDelay::new();
        router.select(4, &mut bus, &mut delay).unwrap();
        bus.clear_log();
        for codec in [5, 6, 7, 4] {
            router.select(codec, &mut bus, &mut delay).unwrap();
        }
        assert_eq!(bus.mux_writes(), 4);
        assert_eq!(bus.log().last(), Some(&BusEvent::Mux { address: 0x71, mask: 0b0001 }));
    }

    #[test]
    fn board_change_rewrites_every_mux() {
        let (mut router, mut bus) = probed(4);
        let mut delay = MockDelay::new();
        router.select(1, &mut bus, &mut delay).unwrap();
        bus.clear_log();

        router.select(9, &mut bus, &mut delay).unwrap();
        assert_eq!(
            bus.log(),
            &[
                BusEvent::Mux { address: 0x70, mask: 0 },
                BusEvent::Mux { address: 0x71, mask: 0 },
                BusEvent::Mux { address: 0x73, mask: 0 },
                BusEvent::Mux { address: 0x72, mask: 0b0010 },
            ]
        );
        assert_eq!(bus.selected_codec(), Some(9));
    }

    #[test]
    fn mux_writes_track_board_changes() {
        let (mut router, mut bus) = probed(2);
        let mut delay = MockDelay::new();
        // first select and each board change: 2 writes; same-board changes: 1
        let sequence = [0u8, 1, 1, 2, 4, 5, 5, 0, 3];
        let expected = 2 + 1 + 0 + 1 + 2 + 1 + 0 + 2 + 1;
        for codec in sequence {
            router.select(codec, &mut bus, &mut delay).unwrap();
        }
        assert_eq!(bus.mux_writes(), expected);
    }

    #[test]
    fn unreachable_board_is_not_provisioned() {
        let (mut router, mut bus) = probed(1);
        let err = router.select(4, &mut bus, &mut MockDelay::new()).unwrap_err();
        assert_eq!(err, BusError::NotProvisioned { codec: 4 });
        assert_eq!(bus.mux_writes(), 0);
    }

    #[test]
    fn failed_mux_write_forgets_selection() {
        let (mut router, mut bus) = probed(2);
        let mut delay = MockDelay::new();
        bus.fail_mux(0x71);
        assert!(matches!(
            router.select(0, &mut bus, &mut delay),
            Err(BusError::Mux { address: 0x71, .. })
        ));
        assert_eq!(router.last_codec(), None);
    }
}
