//! Block-array handoff between the DMA interrupt and the graph cycle.
//!
//! The graph cycle installs a complete new array with
//! [`exchange`](BlockExchange::exchange) and receives the previous one back,
//! all inside one short critical section. The interrupt either consumes the
//! whole array ([`take`](BlockExchange::take)) or works on it in place
//! ([`with`](BlockExchange::with)). Neither side can observe the other's
//! array half-installed, and the blocks handed back are released by the
//! caller after the critical section has ended.

use core::cell::RefCell;

use critical_section::Mutex;

struct Slots<T, const N: usize> {
    blocks: [Option<T>; N],
    epoch: u32,
}

/// One array of per-channel blocks guarded by a critical section.
pub struct BlockExchange<T, const N: usize> {
    slots: Mutex<RefCell<Slots<T, N>>>,
}

impl<T, const N: usize> BlockExchange<T, N> {
    pub const fn new() -> Self {
        BlockExchange {
            slots: Mutex::new(RefCell::new(Slots {
                blocks: [const { None }; N],
                epoch: 0,
            })),
        }
    }

    /// Install `incoming` and return the array it replaces.
    pub fn exchange(&self, incoming: [Option<T>; N]) -> [Option<T>; N] {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            slots.epoch = slots.epoch.wrapping_add(1);
            core::mem::replace(&mut slots.blocks, incoming)
        })
    }

    /// Remove and return the current array, leaving every slot empty.
    pub fn take(&self) -> [Option<T>; N] {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            core::mem::replace(&mut slots.blocks, [const { None }; N])
        })
    }

    /// Run `f` on the current array while holding the critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut [Option<T>; N]) -> R) -> R {
        critical_section::with(|cs| f(&mut self.slots.borrow_ref_mut(cs).blocks))
    }

    /// Number of arrays installed so far.
    pub fn epoch(&self) -> u32 {
        critical_section::with(|cs| self.slots.borrow_ref(cs).epoch)
    }
}

impl<T, const N: usize> Default for BlockExchange<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
