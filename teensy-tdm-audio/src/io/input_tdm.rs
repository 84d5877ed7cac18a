//! DMA-driven multichannel TDM input.
//!
//! ```text
//! SAI RX          DMA ring                 BlockExchange             Audio graph
//! ┌──────┐      ┌─────────────┐          ┌──────────────┐          ┌────────────────┐
//! │ RDR0 ├─DMA─►│ stable half ├──isr()──►│ N × BlockMut ├─update()►│ ch 0..N-1 out  │
//! └──────┘      └─────────────┘          └──────────────┘          └────────────────┘
//! ```
//!
//! [`TdmInputNode::update`] installs a fresh working set (one block per
//! channel) and hands the set the interrupt has been filling to the graph.
//! [`TdmInput::isr`] de-interleaves the stable half of the ring straight into
//! whatever working set is installed, under the exchange's critical section.
//!
//! RX normally follows the TX clocks, so the receive engine usually does not
//! claim graph timing.

use core::marker::PhantomData;
use core::ops::Deref;

use log::warn;

use crate::block::{AudioBlockMut, AudioBlockPool, AudioBlockRef, Sample};
use crate::config::AudioConfig;
use crate::error::TransportError;
use crate::node::AudioNode;

use super::exchange::BlockExchange;
use super::format::{deinterleave, SampleFormat};
use super::hal::{CircularDma, Direction, SerialAudioPort};
use super::transport::{ring_words, Transport, TransportState};

/// Working blocks the receive interrupt fills, tagged with the wire format.
pub struct InputExchange<F: SampleFormat, const N: usize> {
    blocks: BlockExchange<AudioBlockMut<F::Sample>, N>,
    _format: PhantomData<fn() -> F>,
}

impl<F: SampleFormat, const N: usize> InputExchange<F, N> {
    pub const fn new() -> Self {
        InputExchange {
            blocks: BlockExchange::new(),
            _format: PhantomData,
        }
    }
}

impl<F: SampleFormat, const N: usize> Default for InputExchange<F, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SampleFormat, const N: usize> Deref for InputExchange<F, N> {
    type Target = BlockExchange<AudioBlockMut<F::Sample>, N>;

    fn deref(&self) -> &Self::Target {
        &self.blocks
    }
}

/// Interrupt half of the TDM receiver.
pub struct TdmInput<F: SampleFormat + 'static, const N: usize> {
    transport: Transport<F>,
    exchange: &'static InputExchange<F, N>,
}

impl<F: SampleFormat + 'static, const N: usize> TdmInput<F, N> {
    pub const RING_WORDS: usize = ring_words::<F>(N);

    pub fn new(
        config: &AudioConfig,
        ring: &'static mut [u32],
        exchange: &'static InputExchange<F, N>,
        update_responsibility: bool,
    ) -> Result<Self, TransportError> {
        let transport = Transport::new(config, Direction::Receive, N, ring, update_responsibility)?;
        Ok(TdmInput { transport, exchange })
    }

    pub fn configure<P: SerialAudioPort>(&mut self, port: &mut P) -> Result<(), TransportError> {
        self.transport.configure(port)
    }

    pub fn arm<P: SerialAudioPort, D: CircularDma>(
        &mut self,
        port: &mut P,
        dma: &mut D,
    ) -> Result<(), TransportError> {
        self.transport.arm(port, dma)
    }

    /// Handle a half-ring DMA interrupt.
    ///
    /// Returns `true` when this receiver owns graph timing.
    pub fn isr<D: CircularDma>(&mut self, dma: &mut D) -> bool {
        let Some(half) = self.transport.service(dma) else {
            warn!("RX interrupt before arm");
            return false;
        };
        let src = self.transport.ring().half(half);
        self.exchange.with(|blocks| deinterleave::<F>(src, blocks));
        self.transport.update_responsibility()
    }

    /// Graph-side handle drawing working blocks from the global pool.
    pub fn node(&self) -> TdmInputNode<F, N> {
        TdmInputNode::new(self.exchange, <F::Sample as Sample>::global_pool())
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn has_update_responsibility(&self) -> bool {
        self.transport.update_responsibility()
    }

    pub fn dma_balance(&self) -> i32 {
        self.transport.balance()
    }

    #[cfg(test)]
    pub(crate) fn ring_half_mut(&mut self, half: super::dma::DmaHalf) -> &mut [u32] {
        self.transport.ring_mut().half_mut(half)
    }
}

/// Graph half of the TDM receiver: no inputs, `N` outputs.
pub struct TdmInputNode<F: SampleFormat + 'static, const N: usize> {
    exchange: &'static InputExchange<F, N>,
    pool: &'static AudioBlockPool<F::Sample>,
}

impl<F: SampleFormat + 'static, const N: usize> TdmInputNode<F, N> {
    pub fn new(exchange: &'static InputExchange<F, N>, pool: &'static AudioBlockPool<F::Sample>) -> Self {
        TdmInputNode { exchange, pool }
    }

    /// One block per channel, or nothing if the pool cannot cover them all.
    fn alloc_set(&self) -> [Option<AudioBlockMut<F::Sample>>; N] {
        let set: [Option<AudioBlockMut<F::Sample>>; N] =
            core::array::from_fn(|_| AudioBlockMut::alloc_from(self.pool));
        if set.iter().all(Option::is_some) {
            set
        } else {
            warn!("RX: pool exhausted, dropping a block period");
            [const { None }; N]
        }
    }
}

impl<F: SampleFormat + 'static, const N: usize> AudioNode for TdmInputNode<F, N> {
    type Sample = F::Sample;
    const NUM_INPUTS: usize = 0;
    const NUM_OUTPUTS: usize = N;

    fn update(
        &mut self,
        _inputs: &[Option<AudioBlockRef<F::Sample>>],
        outputs: &mut [Option<AudioBlockMut<F::Sample>>],
    ) {
        let working = self.alloc_set();
        let mut completed = self.exchange.exchange(working);
        for (out, block) in outputs.iter_mut().zip(completed.iter_mut()) {
            if let Some(block) = block.take() {
                *out = Some(block);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::pool::leaked_pool;
    use crate::config::TransportMode;
    use crate::constants::{AUDIO_BLOCK_SAMPLES, POOL_SIZE};
    use crate::io::dma::{leaked_ring, DmaHalf};
    use crate::io::format::{Tdm16, Tdm32};
    use crate::io::transport::mock::{MockDma, MockPort};

    fn leaked_exchange<F: SampleFormat + 'static, const N: usize>() -> &'static InputExchange<F, N> {
        std::boxed::Box::leak(std::boxed::Box::new(InputExchange::new()))
    }

    fn armed<F: SampleFormat + 'static, const N: usize>(
        exchange: &'static InputExchange<F, N>,
    ) -> (TdmInput<F, N>, MockDma) {
        let config = AudioConfig::new(8).with_mode(TransportMode::DspTdm);
        let ring = leaked_ring(TdmInput::<F, N>::RING_WORDS);
        let mut input = TdmInput::new(&config, ring, exchange, false).unwrap();
        let mut port = MockPort::new();
        let mut dma = MockDma::new();
        input.configure(&mut port).unwrap();
        input.arm(&mut port, &mut dma).unwrap();
        (input, dma)
    }

    #[test]
    fn first_update_has_nothing_to_deliver() {
        let pool = leaked_pool::<i16>();
        let mut node = TdmInputNode::<Tdm16, 2>::new(leaked_exchange(), pool);
        let mut outputs = [None, None];
        node.update(&[], &mut outputs);
        assert!(outputs.iter().all(Option::is_none));
        assert_eq!(pool.allocated_count(), 2);
    }

    #[test]
    fn received_frames_reach_the_graph() {
        let pool = leaked_pool::<i16>();
        let exchange = leaked_exchange::<Tdm16, 2>();
        let (mut input, mut dma) = armed(exchange);
        let mut node = TdmInputNode::new(exchange, pool);
        node.update(&[], &mut [None, None]);

        for (j, word) in input.ring_half_mut(DmaHalf::First).iter_mut().enumerate() {
            *word = ((j as u32) << 16) | (0x8000 + j as u32);
        }
        dma.point_at(DmaHalf::Second);
        assert!(!input.isr(&mut dma));
        assert_eq!(input.state(), TransportState::Streaming);

        let mut outputs = [None, None];
        node.update(&[], &mut outputs);
        let left = outputs[0].as_ref().unwrap();
        let right = outputs[1].as_ref().unwrap();
        assert_eq!(left[5], 5);
        assert_eq!(left[AUDIO_BLOCK_SAMPLES - 1], 127);
        assert_eq!(right[0], i16::MIN);
        assert_eq!(right[1], i16::MIN + 1);
    }

    #[test]
    fn tdm32_input_is_normalized() {
        let pool = leaked_pool::<f32>();
        let exchange = leaked_exchange::<Tdm32, 1>();
        let (mut input, mut dma) = armed(exchange);
        let mut node = TdmInputNode::new(exchange, pool);
        node.update(&[], &mut [None]);

        input.ring_half_mut(DmaHalf::Second).fill(1u32 << 30);
        dma.point_at(DmaHalf::First);
        input.isr(&mut dma);

        let mut outputs = [None];
        node.update(&[], &mut outputs);
        let block = outputs[0].as_ref().unwrap();
        assert!(block.iter().all(|s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn allocation_is_all_or_nothing() {
        let pool = leaked_pool::<i16>();
        let hoard: std::vec::Vec<_> = (0..POOL_SIZE - 3)
            .map(|_| AudioBlockMut::alloc_from(pool).unwrap())
            .collect();
        let mut node = TdmInputNode::<Tdm16, 4>::new(leaked_exchange(), pool);
        node.update(&[], &mut [None, None, None, None]);
        assert_eq!(pool.allocated_count() as usize, POOL_SIZE - 3);
        drop(hoard);
        assert_eq!(pool.allocated_count(), 0);
    }
}
