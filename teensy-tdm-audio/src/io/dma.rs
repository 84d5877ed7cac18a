//! Circular DMA ring shared with the serial audio hardware.
//!
//! ```text
//!            base                    midpoint                  end
//!             │◄──── first half ────►│◄──── second half ──────►│
//!             │ 128 frames × W words │ 128 frames × W words    │
//! ```
//!
//! The hardware walks the ring forever, raising an interrupt at the
//! midpoint and at the end. On each interrupt the engine reads the
//! channel's current transfer address: the half containing that address
//! belongs to the hardware, the other one is stable and owned by software
//! until the next interrupt.

use crate::error::TransportError;

/// One half of the DMA ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaHalf {
    First,
    Second,
}

impl DmaHalf {
    /// The half a transfer address falls into.
    pub fn from_address(transfer_address: usize, base: usize, len_words: usize) -> Self {
        let midpoint = base + len_words * core::mem::size_of::<u32>() / 2;
        if transfer_address < midpoint {
            DmaHalf::First
        } else {
            DmaHalf::Second
        }
    }

    pub fn other(self) -> Self {
        match self {
            DmaHalf::First => DmaHalf::Second,
            DmaHalf::Second => DmaHalf::First,
        }
    }
}

/// The double buffer, exclusively owned by one transport engine.
pub struct DmaRing {
    words: &'static mut [u32],
}

impl DmaRing {
    /// Take ownership of a ring that must hold exactly `2 * half_len` words.
    ///
    /// The ring is cleared so the first transfers carry silence.
    pub fn new(words: &'static mut [u32], half_len: usize) -> Result<Self, TransportError> {
        if words.len() != half_len * 2 {
            return Err(TransportError::BufferLength {
                expected: half_len * 2,
                actual: words.len(),
            });
        }
        words.fill(0);
        Ok(DmaRing { words })
    }

    /// Start address programmed into the DMA channel.
    pub fn base_address(&self) -> usize {
        self.words.as_ptr() as usize
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn half_len(&self) -> usize {
        self.words.len() / 2
    }

    /// The half software may touch while the hardware is at `transfer_address`.
    pub fn stable_half(&self, transfer_address: usize) -> DmaHalf {
        DmaHalf::from_address(transfer_address, self.base_address(), self.len()).other()
    }

    /// Address of the first word of `half`.
    pub fn half_address(&self, half: DmaHalf) -> usize {
        match half {
            DmaHalf::First => self.base_address(),
            DmaHalf::Second => self.base_address() + self.half_len() * core::mem::size_of::<u32>(),
        }
    }

    pub fn half(&self, half: DmaHalf) -> &[u32] {
        let len = self.half_len();
        match half {
            DmaHalf::First => &self.words[..len],
            DmaHalf::Second => &self.words[len..],
        }
    }

    pub fn half_mut(&mut self, half: DmaHalf) -> &mut [u32] {
        let len = self.half_len();
        match half {
            DmaHalf::First => &mut self.words[..len],
            DmaHalf::Second => &mut self.words[len..],
        }
    }
}

#[cfg(test)]
pub(crate) fn leaked_ring(words: usize) -> &'static mut [u32] {
    std::boxed::Box::leak(std::vec![0u32; words].into_boxed_slice())
}
