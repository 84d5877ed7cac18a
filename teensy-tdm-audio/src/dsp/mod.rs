//! Fixed-point helpers shared by the processing nodes.

pub mod intrinsics;

pub use intrinsics::{mul_q16, saturate16};
