//! # teensy-tdm-audio
//!
//! A `no_std`, zero-allocation board support layer for Teensy 4.x audio
//! boards carrying up to sixteen TLV320AIC3104 codecs. It streams every
//! codec's channels over one TDM serial port and controls the codecs over
//! a shared I2C bus, four per expansion board behind a PCA9546 mux.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`block`] | Fixed-size audio block pools with refcounted handles |
//! | Trait | [`node`] / [`control`] | `AudioNode` and `AudioControl` traits |
//! | Config | [`config`] | Construction-time settings and their auto-correction |
//! | Errors | [`error`] | Bus, transport and per-codec failure reports |
//! | I/O | [`io`] | TDM/I2S transport: DMA ring, block exchange, formats, clocks |
//! | Codec | [`codec`] | TLV320AIC3104 array control (feature-gated) |
//! | DSP | [`dsp`] / [`nodes`] | Saturation helpers and the matrix mixer (feature-gated) |
//!
//! ## Quick start
//!
//! ```ignore
//! use teensy_tdm_audio::codec::{ChannelSel, CodecArray, CodecSel};
//! use teensy_tdm_audio::config::{AudioConfig, TransportMode};
//!
//! let config = AudioConfig::new(8).with_mode(TransportMode::DspTdm);
//! let mut codecs = CodecArray::new(i2c, delay, reset_pin, config);
//! codecs.begin();
//! codecs.enable(CodecSel::All).into_result()?;
//! codecs.volume(0.7, ChannelSel::Both, CodecSel::All).into_result()?;
//!
//! // Transport: one exchange per direction, shared with the DMA interrupt.
//! static TX: OutputExchange<Tdm16, 16> = OutputExchange::new();
//! let mut output = TdmOutput::new(&config, ring, &TX, GRAPH_TIMING.claim())?;
//! output.configure(&mut sai)?;
//! output.arm(&mut sai, &mut dma)?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `dsp` | yes | Saturation helpers and the matrix mixer node |
//! | `aic3104` | yes | Codec array driver (requires `embedded-hal`, `heapless`) |
//!
//! ## Audio parameters
//!
//! - **Block size:** 128 samples ([`constants::AUDIO_BLOCK_SAMPLES`])
//! - **Sample formats:** `i16` (16-bit TDM/I2S) and `f32` (32-bit TDM)
//! - **Block pool:** 64 blocks per sample type ([`constants::POOL_SIZE`])
//! - **Codecs:** up to 16 addressable ([`constants::MAX_CODECS`]); as many
//!   streamed as one 256-bit-clock frame holds (8 at 16 bits, 4 at 32 bits)

#![cfg_attr(not(test), no_std)]

pub mod constants;
pub mod block;
pub mod node;
pub mod control;
pub mod config;
pub mod error;
pub mod io;

#[cfg(feature = "aic3104")]
pub mod codec;

#[cfg(feature = "dsp")]
pub mod dsp;

#[cfg(feature = "dsp")]
pub mod nodes;
