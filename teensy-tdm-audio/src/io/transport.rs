//! Lifecycle shared by the TDM input and output engines.
//!
//! ```text
//! Uninitialized ──configure()──► Configuring ──arm()──► Armed ──first IRQ──► Streaming
//! ```
//!
//! There is no way back from `Streaming`; the peripherals are only stopped
//! by a hardware reset.

use core::marker::PhantomData;

use log::{debug, trace};

use crate::config::AudioConfig;
use crate::constants::AUDIO_BLOCK_SAMPLES;
use crate::error::TransportError;

use super::clocks::{AudioClockDividers, FrameFormat};
use super::dma::{DmaHalf, DmaRing};
use super::format::{words_per_frame, SampleFormat};
use super::hal::{CircularDma, Direction, SerialAudioPort};

/// Transport engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Uninitialized,
    /// Clocks and frame layout programmed.
    Configuring,
    /// DMA running, waiting for the first interrupt.
    Armed,
    /// Steady-state double-buffer exchange.
    Streaming,
}

/// Ring size in words for `channels` channels of format `F`.
pub const fn ring_words<F: SampleFormat>(channels: usize) -> usize {
    2 * AUDIO_BLOCK_SAMPLES * words_per_frame::<F>(channels)
}

pub(crate) struct Transport<F: SampleFormat> {
    ring: DmaRing,
    direction: Direction,
    frame: FrameFormat,
    clocks: AudioClockDividers,
    state: TransportState,
    update_responsibility: bool,
    balance: i32,
    _format: PhantomData<F>,
}

impl<F: SampleFormat> Transport<F> {
    pub(crate) fn new(
        config: &AudioConfig,
        direction: Direction,
        channels: usize,
        ring: &'static mut [u32],
        update_responsibility: bool,
    ) -> Result<Self, TransportError> {
        if channels == 0 || channels > F::MAX_CHANNELS {
            return Err(TransportError::ChannelCount {
                channels,
                max: F::MAX_CHANNELS,
            });
        }
        let words = words_per_frame::<F>(channels);
        let ring = DmaRing::new(ring, words * AUDIO_BLOCK_SAMPLES)?;
        let frame = FrameFormat::new(
            config.mode,
            (words * F::SLOTS_PER_WORD) as u8,
            F::SLOT_BITS as u8,
            F::SLOTS_PER_WORD as u8,
        );
        Ok(Transport {
            ring,
            direction,
            frame,
            clocks: AudioClockDividers::for_rate(config.sample_rate, config.mode),
            state: TransportState::Uninitialized,
            update_responsibility,
            balance: 0,
            _format: PhantomData,
        })
    }

    pub(crate) fn configure<P: SerialAudioPort>(&mut self, port: &mut P) -> Result<(), TransportError> {
        if self.state != TransportState::Uninitialized {
            return Err(TransportError::InvalidState);
        }
        port.configure(self.direction, &self.frame, &self.clocks)
            .map_err(|_| TransportError::Port)?;
        debug!(
            "{:?}: {} slots x {} bits, PLL {} + {}/{}, SAI /{} /{}",
            self.direction,
            self.frame.slots_per_frame,
            self.frame.slot_bits,
            self.clocks.pll_loop_divider,
            self.clocks.pll_numerator,
            self.clocks.pll_denominator,
            self.clocks.sai_prediv,
            self.clocks.sai_postdiv,
        );
        self.state = TransportState::Configuring;
        Ok(())
    }

    pub(crate) fn arm<P: SerialAudioPort, D: CircularDma>(
        &mut self,
        port: &mut P,
        dma: &mut D,
    ) -> Result<(), TransportError> {
        if self.state != TransportState::Configuring {
            return Err(TransportError::InvalidState);
        }
        dma.start_circular(self.ring.base_address(), self.ring.len());
        port.enable(self.direction);
        self.state = TransportState::Armed;
        Ok(())
    }

    /// Acknowledge a DMA interrupt and return the half software may touch.
    ///
    /// Returns `None` before the engine is armed.
    pub(crate) fn service<D: CircularDma>(&mut self, dma: &mut D) -> Option<DmaHalf> {
        let address = dma.transfer_address();
        dma.clear_interrupt();
        match self.state {
            TransportState::Uninitialized | TransportState::Configuring => return None,
            TransportState::Armed => self.state = TransportState::Streaming,
            TransportState::Streaming => {}
        }
        let stable = self.ring.stable_half(address);
        match stable {
            DmaHalf::Second => self.balance += 1,
            DmaHalf::First => self.balance -= 1,
        }
        trace!("{:?} irq at 0x{:08X}, software half {:?}", self.direction, address, stable);
        Some(stable)
    }

    pub(crate) fn ring(&self) -> &DmaRing {
        &self.ring
    }

    pub(crate) fn ring_mut(&mut self) -> &mut DmaRing {
        &mut self.ring
    }

    pub(crate) fn frame(&self) -> &FrameFormat {
        &self.frame
    }

    pub(crate) fn state(&self) -> TransportState {
        self.state
    }

    pub(crate) fn update_responsibility(&self) -> bool {
        self.update_responsibility
    }

    pub(crate) fn balance(&self) -> i32 {
        self.balance
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::io::dma::DmaHalf;

    /// DMA channel whose transfer address is set by the test.
    pub struct MockDma {
        pub address: usize,
        pub words: usize,
        pub cursor: usize,
        pub starts: u32,
        pub cleared: u32,
    }

    impl MockDma {
        pub fn new() -> Self {
            MockDma {
                address: 0,
                words: 0,
                cursor: 0,
                starts: 0,
                cleared: 0,
            }
        }

        /// Park the hardware somewhere inside `half`.
        pub fn point_at(&mut self, half: DmaHalf) {
            let half_bytes = self.words * 4 / 2;
            self.cursor = match half {
                DmaHalf::First => self.address + 4,
                DmaHalf::Second => self.address + half_bytes + 4,
            };
        }
    }

    impl CircularDma for MockDma {
        fn start_circular(&mut self, address: usize, words: usize) {
            self.address = address;
            self.words = words;
            self.cursor = address;
            self.starts += 1;
        }

        fn transfer_address(&self) -> usize {
            self.cursor
        }

        fn clear_interrupt(&mut self) {
            self.cleared += 1;
        }
    }

    /// Serial port that records what it was told.
    pub struct MockPort {
        pub configured: Option<(Direction, FrameFormat, AudioClockDividers)>,
        pub enabled: Option<Direction>,
        pub fail: bool,
    }

    impl MockPort {
        pub fn new() -> Self {
            MockPort {
                configured: None,
                enabled: None,
                fail: false,
            }
        }
    }

    impl SerialAudioPort for MockPort {
        type Error = ();

        fn configure(
            &mut self,
            direction: Direction,
            frame: &FrameFormat,
            clocks: &AudioClockDividers,
        ) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.configured = Some((direction, *frame, *clocks));
            Ok(())
        }

        fn enable(&mut self, direction: Direction) {
            self.enabled = Some(direction);
        }
    }
}
