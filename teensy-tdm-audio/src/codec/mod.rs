//! TLV320AIC3104 codec array control.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`registers`] | Page 0 / page 1 register addresses and field bits |
//! | [`encode`] | Pure encoders: gain, volume, datapath, serial format, AGC |
//! | [`pll`] | PLL parameters and presets |
//! | [`filters`] | Biquad design, register-form coefficients, one-pole ADC HPF |
//! | [`target`] | Codec and channel selectors |
//! | [`mux`] | PCA9546 mux discovery and selection cache |
//! | [`bus`] | Register reads and writes through the mux tree |
//! | [`aic3104`] | [`CodecArray`], the control facade |
//!
//! # Feature gate
//!
//! This module is available when the `aic3104` feature is enabled (on by default).

pub mod registers;
pub mod encode;
pub mod pll;
pub mod filters;
pub mod target;
pub mod mux;
pub mod bus;
mod aic3104;

#[cfg(test)]
pub(crate) mod mock;

pub use aic3104::CodecArray;
pub use bus::{CodecBus, NoPin};
pub use encode::{AgcSettings, DacPower, HpfPreset, InputMode, InputSource, OverflowFlags};
pub use filters::{BiquadCoefficients, FilterDesign, FilterDump, OnePole, RegisterCoefficients};
pub use mux::MuxRouter;
pub use pll::PllSettings;
pub use target::{ChannelSel, CodecSel};
