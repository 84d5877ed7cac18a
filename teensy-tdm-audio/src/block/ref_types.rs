use core::ops::{Deref, DerefMut};

use crate::constants::AUDIO_BLOCK_SAMPLES;

use super::pool::{AudioBlockPool, Sample};

/// Exclusive (mutable) handle to a pooled audio block.
///
/// There is exactly one `AudioBlockMut` per allocated slot. Dropping it
/// releases the block back to its pool.
pub struct AudioBlockMut<S: Sample = i16> {
    pool: &'static AudioBlockPool<S>,
    slot: u8,
}

impl<S: Sample> AudioBlockMut<S> {
    /// Allocate a block from the global pool for `S`.
    pub fn alloc() -> Option<Self> {
        Self::alloc_from(S::global_pool())
    }

    /// Allocate a block from a specific pool.
    pub fn alloc_from(pool: &'static AudioBlockPool<S>) -> Option<Self> {
        pool.alloc().map(|slot| AudioBlockMut { pool, slot })
    }

    /// Give up write access. No copy, no refcount change.
    pub fn into_shared(self) -> AudioBlockRef<S> {
        let shared = AudioBlockRef {
            pool: self.pool,
            slot: self.slot,
        };
        core::mem::forget(self);
        shared
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// The pool this block belongs to.
    pub fn pool(&self) -> &'static AudioBlockPool<S> {
        self.pool
    }
}

impl<S: Sample> Deref for AudioBlockMut<S> {
    type Target = [S; AUDIO_BLOCK_SAMPLES];

    fn deref(&self) -> &Self::Target {
        // SAFETY: a unique AudioBlockMut owns the slot.
        unsafe { &(*self.pool.data_ptr(self.slot)).samples }
    }
}

impl<S: Sample> DerefMut for AudioBlockMut<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: a unique AudioBlockMut owns the slot.
        unsafe { &mut (*self.pool.data_ptr(self.slot)).samples }
    }
}

impl<S: Sample> Drop for AudioBlockMut<S> {
    fn drop(&mut self) {
        self.pool.dec_ref(self.slot);
    }
}

/// Shared (read-only) handle to a pooled audio block.
///
/// Cloning increments the refcount; the slot is freed when the last handle
/// is dropped.
pub struct AudioBlockRef<S: Sample = i16> {
    pool: &'static AudioBlockPool<S>,
    slot: u8,
}

impl<S: Sample> AudioBlockRef<S> {
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Regain write access.
    ///
    /// Converts in place when this is the only handle; otherwise copies the
    /// samples into a new block from the same pool. Returns `None` if that
    /// copy cannot be allocated.
    pub fn into_mut(self) -> Option<AudioBlockMut<S>> {
        if self.pool.refcount(self.slot) == 1 {
            let exclusive = AudioBlockMut {
                pool: self.pool,
                slot: self.slot,
            };
            core::mem::forget(self);
            Some(exclusive)
        } else {
            let mut copy = AudioBlockMut::alloc_from(self.pool)?;
            copy.copy_from_slice(&self[..]);
            Some(copy)
        }
    }
}

impl<S: Sample> Deref for AudioBlockRef<S> {
    type Target = [S; AUDIO_BLOCK_SAMPLES];

    fn deref(&self) -> &Self::Target {
        // SAFETY: the slot stays allocated while any handle exists, and
        // shared handles never write.
        unsafe { &(*self.pool.data_ptr(self.slot)).samples }
    }
}

impl<S: Sample> Clone for AudioBlockRef<S> {
    fn clone(&self) -> Self {
        self.pool.inc_ref(self.slot);
        AudioBlockRef {
            pool: self.pool,
            slot: self.slot,
        }
    }
}

impl<S: Sample> Drop for AudioBlockRef<S> {
    fn drop(&mut self) {
        self.pool.dec_ref(self.slot);
    }
}
