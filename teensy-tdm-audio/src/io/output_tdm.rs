//! DMA-driven multichannel TDM output.
//!
//! ```text
//! Audio graph                  BlockExchange               DMA ring           SAI TX
//! ┌───────────────┐           ┌──────────────┐          ┌─────────────┐    ┌──────┐
//! │ ch 0..N-1 in  ├─update()─►│ N × BlockRef ├──isr()──►│ stable half ├───►│ TDR0 │
//! └───────────────┘           └──────────────┘          └─────────────┘    └──────┘
//! ```
//!
//! The graph side is [`TdmOutputNode`]: each cycle it installs one block per
//! channel. The interrupt side is [`TdmOutput`]: on every half-ring
//! interrupt it takes the installed set, interleaves it into the half the
//! hardware is not reading, and releases the blocks.
//!
//! One interrupt moves exactly one 128-frame block period, so at 44.1 kHz
//! the ISR fires every ~2.9 ms.
//!
//! ## Usage with RTIC
//!
//! ```ignore
//! static TX_BLOCKS: OutputExchange<Tdm16, 16> = OutputExchange::new();
//!
//! // init
//! let mut out = TdmOutput::new(&config, tx_ring, &TX_BLOCKS, GRAPH_TIMING.claim())?;
//! out.configure(&mut sai1)?;
//! out.arm(&mut sai1, &mut dma0)?;
//!
//! // DMA ISR
//! if out.isr(&mut dma0) { rtic::pend(Interrupt::AUDIO_UPDATE); }
//!
//! // graph task
//! out.node().update(&inputs, &mut []);
//! ```

use core::marker::PhantomData;
use core::ops::Deref;

use log::warn;

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::config::AudioConfig;
use crate::error::TransportError;
use crate::node::AudioNode;

use super::dma::DmaHalf;
use super::exchange::BlockExchange;
use super::format::{interleave, SampleFormat};
use super::hal::{CircularDma, Direction, SerialAudioPort};
use super::transport::{ring_words, Transport, TransportState};

/// Blocks waiting for the next transmit interrupt.
///
/// Tagged with the wire format, so an exchange only pairs with engines of
/// that format even when two formats share a sample type.
pub struct OutputExchange<F: SampleFormat, const N: usize> {
    blocks: BlockExchange<AudioBlockRef<F::Sample>, N>,
    _format: PhantomData<fn() -> F>,
}

impl<F: SampleFormat, const N: usize> OutputExchange<F, N> {
    pub const fn new() -> Self {
        OutputExchange {
            blocks: BlockExchange::new(),
            _format: PhantomData,
        }
    }
}

impl<F: SampleFormat, const N: usize> Default for OutputExchange<F, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SampleFormat, const N: usize> Deref for OutputExchange<F, N> {
    type Target = BlockExchange<AudioBlockRef<F::Sample>, N>;

    fn deref(&self) -> &Self::Target {
        &self.blocks
    }
}

/// Interrupt half of the TDM transmitter.
pub struct TdmOutput<F: SampleFormat + 'static, const N: usize> {
    transport: Transport<F>,
    exchange: &'static OutputExchange<F, N>,
}

impl<F: SampleFormat + 'static, const N: usize> TdmOutput<F, N> {
    /// Words the DMA ring passed to [`new`](Self::new) must hold.
    pub const RING_WORDS: usize = ring_words::<F>(N);

    /// Build the transmitter over `ring`.
    ///
    /// `update_responsibility` is normally the result of
    /// [`GRAPH_TIMING.claim()`](super::timing::GRAPH_TIMING).
    pub fn new(
        config: &AudioConfig,
        ring: &'static mut [u32],
        exchange: &'static OutputExchange<F, N>,
        update_responsibility: bool,
    ) -> Result<Self, TransportError> {
        let transport = Transport::new(config, Direction::Transmit, N, ring, update_responsibility)?;
        Ok(TdmOutput { transport, exchange })
    }

    /// Program the port's transmit clocks and frame layout.
    pub fn configure<P: SerialAudioPort>(&mut self, port: &mut P) -> Result<(), TransportError> {
        self.transport.configure(port)
    }

    /// Start the circular DMA over the (silent) ring and enable the transmitter.
    pub fn arm<P: SerialAudioPort, D: CircularDma>(
        &mut self,
        port: &mut P,
        dma: &mut D,
    ) -> Result<(), TransportError> {
        self.transport.arm(port, dma)
    }

    /// Handle a half-ring DMA interrupt.
    ///
    /// Returns `true` when this transmitter owns graph timing and the graph
    /// update should be triggered.
    pub fn isr<D: CircularDma>(&mut self, dma: &mut D) -> bool {
        let Some(half) = self.transport.service(dma) else {
            warn!("TX interrupt before arm");
            return false;
        };
        self.fill(half);
        self.transport.update_responsibility()
    }

    fn fill(&mut self, half: DmaHalf) {
        let blocks = self.exchange.take();
        interleave::<F>(self.transport.ring_mut().half_mut(half), &blocks);
        drop(blocks);
    }

    /// Graph-side handle feeding this transmitter.
    pub fn node(&self) -> TdmOutputNode<F, N> {
        TdmOutputNode::new(self.exchange)
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn has_update_responsibility(&self) -> bool {
        self.transport.update_responsibility()
    }

    /// Interrupts seen in the second half minus those seen in the first.
    ///
    /// Stays within ±1 while the DMA alternates halves as expected.
    pub fn dma_balance(&self) -> i32 {
        self.transport.balance()
    }

    #[cfg(test)]
    pub(crate) fn ring_half(&self, half: DmaHalf) -> &[u32] {
        self.transport.ring().half(half)
    }
}

/// Graph half of the TDM transmitter: `N` inputs, no outputs.
pub struct TdmOutputNode<F: SampleFormat + 'static, const N: usize> {
    exchange: &'static OutputExchange<F, N>,
}

impl<F: SampleFormat + 'static, const N: usize> TdmOutputNode<F, N> {
    pub fn new(exchange: &'static OutputExchange<F, N>) -> Self {
        TdmOutputNode { exchange }
    }
}

impl<F: SampleFormat + 'static, const N: usize> AudioNode for TdmOutputNode<F, N> {
    type Sample = F::Sample;
    const NUM_INPUTS: usize = N;
    const NUM_OUTPUTS: usize = 0;

    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef<F::Sample>>],
        _outputs: &mut [Option<AudioBlockMut<F::Sample>>],
    ) {
        let incoming: [Option<AudioBlockRef<F::Sample>>; N] =
            core::array::from_fn(|c| inputs.get(c).and_then(|b| b.clone()));
        // A set the interrupt never consumed is released here, outside the
        // critical section.
        let stale = self.exchange.exchange(incoming);
        drop(stale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::pool::leaked_pool;
    use crate::config::TransportMode;
    use crate::constants::AUDIO_BLOCK_SAMPLES;
    use crate::io::dma::leaked_ring;
    use crate::io::format::{Tdm16, Tdm32};
    use crate::io::transport::mock::{MockDma, MockPort};

    fn leaked_exchange<F: SampleFormat + 'static, const N: usize>() -> &'static OutputExchange<F, N> {
        std::boxed::Box::leak(std::boxed::Box::new(OutputExchange::new()))
    }

    fn armed<F: SampleFormat + 'static, const N: usize>(
        exchange: &'static OutputExchange<F, N>,
    ) -> (TdmOutput<F, N>, MockDma) {
        let config = AudioConfig::new(8).with_mode(TransportMode::DspTdm);
        let ring = leaked_ring(TdmOutput::<F, N>::RING_WORDS);
        let mut out = TdmOutput::new(&config, ring, exchange, true).unwrap();
        let mut port = MockPort::new();
        let mut dma = MockDma::new();
        out.configure(&mut port).unwrap();
        out.arm(&mut port, &mut dma).unwrap();
        (out, dma)
    }

    #[test]
    fn ring_words_cover_two_block_periods() {
        assert_eq!(TdmOutput::<Tdm16, 16>::RING_WORDS, 2048);
        assert_eq!(TdmOutput::<Tdm32, 8>::RING_WORDS, 2048);
    }

    #[test]
    fn isr_before_arm_does_nothing() {
        let config = AudioConfig::new(8).with_mode(TransportMode::DspTdm);
        let exchange = leaked_exchange::<Tdm16, 2>();
        let mut out = TdmOutput::new(&config, leaked_ring(TdmOutput::<Tdm16, 2>::RING_WORDS), exchange, true)
            .unwrap();
        let mut dma = MockDma::new();
        assert!(!out.isr(&mut dma));
        assert_eq!(out.state(), TransportState::Uninitialized);
    }

    #[test]
    fn installed_blocks_land_in_the_stable_half_and_are_released() {
        let pool = leaked_pool::<i16>();
        let exchange = leaked_exchange::<Tdm16, 4>();
        let (mut out, mut dma) = armed(exchange);

        let mut block = AudioBlockMut::alloc_from(pool).unwrap();
        block.fill(0x1234);
        let shared = block.into_shared();
        let mut node = out.node();
        node.update(&[None, Some(shared.clone()), None, None], &mut []);
        drop(shared);
        assert_eq!(pool.allocated_count(), 1);

        dma.point_at(DmaHalf::First);
        assert!(out.isr(&mut dma));
        assert_eq!(out.state(), TransportState::Streaming);
        assert_eq!(pool.allocated_count(), 0);

        let half = out.ring_half(DmaHalf::Second);
        assert_eq!(half.len(), AUDIO_BLOCK_SAMPLES * 2);
        assert!(half.chunks_exact(2).all(|f| f[0] == 0x0000_1234 && f[1] == 0));
        assert!(out.ring_half(DmaHalf::First).iter().all(|&w| w == 0));
    }

    #[test]
    fn unconsumed_set_is_replaced_and_freed() {
        let pool = leaked_pool::<f32>();
        let exchange = leaked_exchange::<Tdm32, 2>();
        let (out, _dma) = armed(exchange);
        let mut node = out.node();

        for _ in 0..3 {
            let a = AudioBlockMut::alloc_from(pool).unwrap().into_shared();
            node.update(&[Some(a), None], &mut []);
        }
        assert_eq!(pool.allocated_count(), 1);
    }

    #[test]
    fn empty_cycle_transmits_silence() {
        let exchange = leaked_exchange::<Tdm16, 2>();
        let (mut out, mut dma) = armed(exchange);
        dma.point_at(DmaHalf::Second);
        out.isr(&mut dma);
        assert!(out.ring_half(DmaHalf::First).iter().all(|&w| w == 0));
        assert_eq!(out.dma_balance(), -1);
    }
}
