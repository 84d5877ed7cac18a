use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::constants::{AUDIO_BLOCK_SAMPLES, POOL_BITMAP_WORDS, POOL_SIZE};

/// Sample types that can be stored in an audio block.
///
/// Implemented for `i16` (integer graph) and `f32` (floating-point graph).
pub trait Sample: Copy + Default + PartialEq + Send + 'static {
    /// Value a freshly allocated block is filled with.
    const SILENCE: Self;

    /// The global pool for this sample type.
    fn global_pool() -> &'static AudioBlockPool<Self>;
}

impl Sample for i16 {
    const SILENCE: Self = 0;

    fn global_pool() -> &'static AudioBlockPool<Self> {
        &POOL_I16
    }
}

impl Sample for f32 {
    const SILENCE: Self = 0.0;

    fn global_pool() -> &'static AudioBlockPool<Self> {
        &POOL_F32
    }
}

/// Raw block storage, 4-byte aligned for word-wise DMA copies.
#[repr(C, align(4))]
pub struct AudioBlockData<S> {
    pub samples: [S; AUDIO_BLOCK_SAMPLES],
}

/// Lock-free pool allocator for audio blocks of one sample type.
///
/// An atomic bitmap tracks which slots are allocated, and per-slot atomic
/// reference counts provide shared ownership. All operations are lock-free
/// and safe to call from interrupt context.
pub struct AudioBlockPool<S> {
    /// Bit `n % 32` of word `n / 32` is set while slot `n` is allocated.
    bitmap: [AtomicU32; POOL_BITMAP_WORDS],
    refcounts: [AtomicU8; POOL_SIZE],
    storage: UnsafeCell<[MaybeUninit<AudioBlockData<S>>; POOL_SIZE]>,
}

// SAFETY: All bookkeeping is atomic. A storage slot is only reached through
// an index that was exclusively claimed in the bitmap (for writes) or is kept
// alive by a non-zero refcount (for shared reads).
unsafe impl<S: Send> Sync for AudioBlockPool<S> {}

impl<S: Sample> AudioBlockPool<S> {
    /// Create an empty pool.
    #[allow(clippy::declare_interior_mut_const)]
    pub const fn new() -> Self {
        const FREE_WORD: AtomicU32 = AtomicU32::new(0);
        const ZERO_REFCOUNT: AtomicU8 = AtomicU8::new(0);
        AudioBlockPool {
            bitmap: [FREE_WORD; POOL_BITMAP_WORDS],
            refcounts: [ZERO_REFCOUNT; POOL_SIZE],
            // SAFETY: an array of `MaybeUninit` needs no initialization.
            storage: UnsafeCell::new(unsafe {
                MaybeUninit::<[MaybeUninit<AudioBlockData<S>>; POOL_SIZE]>::uninit().assume_init()
            }),
        }
    }

    /// Allocate a block. Returns the slot index, or `None` if the pool is full.
    ///
    /// The slot starts with refcount 1 and every sample set to
    /// [`Sample::SILENCE`].
    pub fn alloc(&self) -> Option<u8> {
        for (word_index, word) in self.bitmap.iter().enumerate() {
            loop {
                let bits = word.load(Ordering::Acquire);
                let free = !bits;
                if free == 0 {
                    break;
                }
                let bit_index = free.trailing_zeros();
                let slot = word_index * 32 + bit_index as usize;
                if slot >= POOL_SIZE {
                    break;
                }
                let bit = 1u32 << bit_index;
                if word
                    .compare_exchange_weak(bits, bits | bit, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    continue;
                }
                self.refcounts[slot].store(1, Ordering::Release);
                // SAFETY: the CAS above gave us exclusive ownership of `slot`.
                unsafe {
                    let block = (*self.storage.get())[slot].as_mut_ptr();
                    (*block).samples = [S::SILENCE; AUDIO_BLOCK_SAMPLES];
                }
                return Some(slot as u8);
            }
        }
        None
    }

    /// Increment the reference count of an allocated slot.
    pub fn inc_ref(&self, slot: u8) {
        debug_assert!((slot as usize) < POOL_SIZE);
        let old = self.refcounts[slot as usize].fetch_add(1, Ordering::AcqRel);
        debug_assert!(old > 0, "inc_ref on unallocated slot");
        debug_assert!(old < u8::MAX, "refcount overflow");
    }

    /// Decrement the reference count of a slot, freeing it when it reaches zero.
    pub fn dec_ref(&self, slot: u8) {
        debug_assert!((slot as usize) < POOL_SIZE);
        let old = self.refcounts[slot as usize].fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "dec_ref on slot with refcount 0");
        if old == 1 {
            let word = slot as usize / 32;
            let bit = 1u32 << (slot as u32 % 32);
            self.bitmap[word].fetch_and(!bit, Ordering::Release);
        }
    }

    pub fn refcount(&self, slot: u8) -> u8 {
        self.refcounts[slot as usize].load(Ordering::Acquire)
    }

    /// Pointer to the storage of a slot.
    ///
    /// # Safety
    /// The slot must currently be allocated.
    pub unsafe fn data_ptr(&self, slot: u8) -> *mut AudioBlockData<S> {
        unsafe { (*self.storage.get())[slot as usize].as_mut_ptr() }
    }

    /// Number of slots currently allocated.
    pub fn allocated_count(&self) -> u32 {
        self.bitmap
            .iter()
            .map(|word| word.load(Ordering::Acquire).count_ones())
            .sum()
    }
}

impl<S: Sample> Default for AudioBlockPool<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Global pool for the integer (`i16`) graph.
pub static POOL_I16: AudioBlockPool<i16> = AudioBlockPool::new();

/// Global pool for the floating-point (`f32`) graph.
pub static POOL_F32: AudioBlockPool<f32> = AudioBlockPool::new();

#[cfg(test)]
pub(crate) fn leaked_pool<S: Sample>() -> &'static AudioBlockPool<S> {
    std::boxed::Box::leak(std::boxed::Box::new(AudioBlockPool::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_slot_with_single_ref() {
        let pool = leaked_pool::<i16>();
        let slot = pool.alloc().unwrap();
        assert!((slot as usize) < POOL_SIZE);
        assert_eq!(pool.refcount(slot), 1);
    }

    #[test]
    fn alloc_fills_with_silence() {
        let pool = leaked_pool::<f32>();
        let slot = pool.alloc().unwrap();
        unsafe { (*pool.data_ptr(slot)).samples[5] = 0.25 };
        pool.dec_ref(slot);

        let again = pool.alloc().unwrap();
        assert_eq!(again, slot);
        let data = unsafe { &*pool.data_ptr(again) };
        assert!(data.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn slots_span_both_bitmap_words() {
        let pool = leaked_pool::<i16>();
        let mut slots = [0u8; POOL_SIZE];
        for s in slots.iter_mut() {
            *s = pool.alloc().unwrap();
        }
        slots.sort_unstable();
        for (expected, &slot) in slots.iter().enumerate() {
            assert_eq!(slot as usize, expected);
        }
        assert_eq!(pool.allocated_count(), POOL_SIZE as u32);
    }

    #[test]
    fn exhaustion_returns_none() {
        let pool = leaked_pool::<i16>();
        for _ in 0..POOL_SIZE {
            assert!(pool.alloc().is_some());
        }
        assert!(pool.alloc().is_none());
    }

    #[test]
    fn freeing_high_slot_makes_it_reusable() {
        let pool = leaked_pool::<i16>();
        for _ in 0..POOL_SIZE {
            pool.alloc().unwrap();
        }
        pool.dec_ref(40);
        assert_eq!(pool.allocated_count(), POOL_SIZE as u32 - 1);
        assert_eq!(pool.alloc(), Some(40));
    }

    #[test]
    fn refcount_lifecycle() {
        let pool = leaked_pool::<i16>();
        let slot = pool.alloc().unwrap();
        pool.inc_ref(slot);
        assert_eq!(pool.refcount(slot), 2);

        pool.dec_ref(slot);
        assert_eq!(pool.allocated_count(), 1);

        pool.dec_ref(slot);
        assert_eq!(pool.allocated_count(), 0);
    }
}
