//! Serial audio transport between the DMA hardware and the audio graph.
//!
//! ## Components
//!
//! | Node | Inputs | Outputs | Description |
//! |------|--------|---------|-------------|
//! | [`TdmOutputNode`] | N | 0 | Graph side of the TDM transmitter |
//! | [`TdmInputNode`] | 0 | N | Graph side of the TDM receiver |
//!
//! [`TdmOutput`] and [`TdmInput`] are the interrupt-side halves; each pair
//! shares one [`BlockExchange`].
//!
//! ## Utilities
//!
//! - [`format`]: wire formats ([`Tdm16`], [`Tdm32`], [`I2s16`]) and frame (de)interleaving
//! - [`dma`]: the circular double buffer and half detection
//! - [`clocks`]: audio PLL / SAI divider and frame-sync setup
//! - [`hal`]: the two peripheral traits a board support crate implements
//! - [`timing`]: which engine steps the graph
//!
//! ## DMA Buffer Layout
//!
//! The ring is `2 × 128 × W` words, `W` words per frame. Each half carries a
//! full block period for every channel, and the ISR fills or drains the half
//! the hardware is not on.

pub mod clocks;
pub mod dma;
pub mod exchange;
pub mod format;
pub mod hal;
pub mod input_tdm;
pub mod output_tdm;
pub mod timing;
mod transport;

pub use clocks::{AudioClockDividers, FrameFormat};
pub use dma::{DmaHalf, DmaRing};
pub use exchange::BlockExchange;
pub use format::{I2s16, SampleFormat, Tdm16, Tdm32};
pub use hal::{CircularDma, Direction, SerialAudioPort};
pub use input_tdm::{InputExchange, TdmInput, TdmInputNode};
pub use output_tdm::{OutputExchange, TdmOutput, TdmOutputNode};
pub use timing::{TimingSource, GRAPH_TIMING};
pub use transport::{ring_words, TransportState};
