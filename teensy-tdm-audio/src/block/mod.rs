//! Reference-counted audio blocks.
//!
//! Blocks live in fixed pools, one per sample type ([`POOL_I16`],
//! [`POOL_F32`]). Handles remember the pool they were taken from, so a
//! component can be pointed at a private pool without touching the
//! global ones.

pub mod pool;
mod ref_types;

pub use pool::{AudioBlockPool, Sample, POOL_F32, POOL_I16};
pub use ref_types::{AudioBlockMut, AudioBlockRef};
