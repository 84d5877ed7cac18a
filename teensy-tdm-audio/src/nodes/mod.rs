//! Processing nodes that sit between the TDM transport and the application.
//!
//! Each implements the [`AudioNode`](crate::node::AudioNode) trait.

mod mixer_matrix;

pub use mixer_matrix::{AudioMixerMatrix, UNITY_GAIN};
