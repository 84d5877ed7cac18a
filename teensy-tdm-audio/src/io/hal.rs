//! Peripheral seams implemented by the board HAL.

use super::clocks::{AudioClockDividers, FrameFormat};

/// Direction of a serial audio data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Transmit,
    Receive,
}

/// Serial audio interface (SAI) clock and frame generator.
pub trait SerialAudioPort {
    type Error;

    /// Program clocks and frame layout for one direction. The peripheral
    /// stays disabled.
    fn configure(
        &mut self,
        direction: Direction,
        frame: &FrameFormat,
        clocks: &AudioClockDividers,
    ) -> Result<(), Self::Error>;

    /// Start the data line and its DMA requests.
    fn enable(&mut self, direction: Direction);
}

/// DMA channel running a circular transfer with half and full interrupts.
pub trait CircularDma {
    /// Program and enable a transfer that loops over `words` 32-bit words
    /// starting at `address`, interrupting at the midpoint and at the end.
    fn start_circular(&mut self, address: usize, words: usize);

    /// Memory address the channel will access next.
    fn transfer_address(&self) -> usize;

    /// Acknowledge the pending interrupt.
    fn clear_interrupt(&mut self);
}
