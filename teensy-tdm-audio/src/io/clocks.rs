//! Serial audio clock and frame setup.
//!
//! The i.MX RT audio PLL runs from the 24 MHz reference at
//! `24 MHz × (loop + num / denom)` and must stay between 648 and 1296 MHz.
//! The SAI root clock divides it by a pre- and post-divider down to
//! 256 × Fs (512 × Fs in TDM, where the bit clock doubles).

use crate::config::{SampleRate, TransportMode};
use crate::constants::AUDIO_PLL_REFERENCE_HZ;

/// Lowest audio PLL multiple of the reference clock.
const PLL_MIN_MULTIPLE: u64 = 27;

/// Fixed fractional denominator of the audio PLL.
const PLL_DENOMINATOR: u32 = 10_000;

/// Audio PLL and SAI root clock dividers for one sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioClockDividers {
    /// Integer PLL multiplier.
    pub pll_loop_divider: u32,
    pub pll_numerator: u32,
    pub pll_denominator: u32,
    pub sai_prediv: u32,
    pub sai_postdiv: u32,
}

impl AudioClockDividers {
    pub fn for_rate(rate: SampleRate, mode: TransportMode) -> Self {
        let fs = rate.hz() as u64;
        let reference = AUDIO_PLL_REFERENCE_HZ as u64;
        let prediv = 4u64;
        let postdiv = 1 + (reference * PLL_MIN_MULTIPLE) / (fs * 256 * prediv);

        let pll_hz = fs * 256 * prediv * postdiv;
        let loop_divider = pll_hz / reference;
        let numerator = (pll_hz % reference) * PLL_DENOMINATOR as u64 / reference;

        let sai_prediv = if mode.is_tdm() { prediv / 2 } else { prediv };

        AudioClockDividers {
            pll_loop_divider: loop_divider as u32,
            pll_numerator: numerator as u32,
            pll_denominator: PLL_DENOMINATOR,
            sai_prediv: sai_prediv as u32,
            sai_postdiv: postdiv as u32,
        }
    }

    /// Audio PLL output frequency.
    pub fn pll_hz(&self) -> u64 {
        let reference = AUDIO_PLL_REFERENCE_HZ as u64;
        reference * self.pll_loop_divider as u64
            + reference * self.pll_numerator as u64 / self.pll_denominator as u64
    }

    /// SAI root clock, also driven out as MCLK.
    pub fn sai_clock_hz(&self) -> u64 {
        self.pll_hz() / (self.sai_prediv as u64 * self.sai_postdiv as u64)
    }
}

/// Frame layout programmed into the serial audio port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    /// Slots per frame (one per channel, rounded up to whole words).
    pub slots_per_frame: u8,
    pub slot_bits: u8,
    /// Frame sync width in bit clocks.
    pub sync_width: u8,
    /// Frame sync asserted one bit clock before the first slot.
    pub sync_early: bool,
    /// Data driven on the falling bit clock edge.
    pub bclk_inverted: bool,
    /// More than one slot shares each FIFO word.
    pub packed: bool,
}

impl FrameFormat {
    pub fn new(mode: TransportMode, slots_per_frame: u8, slot_bits: u8, slots_per_word: u8) -> Self {
        let (sync_width, sync_early) = match mode {
            TransportMode::DspTdm => (1, true),
            TransportMode::I2s => (slot_bits, true),
            TransportMode::LeftJustified | TransportMode::RightJustified => (slot_bits, false),
        };
        FrameFormat {
            slots_per_frame,
            slot_bits,
            sync_width,
            sync_early,
            bclk_inverted: true,
            packed: slots_per_word > 1,
        }
    }

    /// Bit clocks per frame.
    pub fn bits_per_frame(&self) -> u32 {
        self.slots_per_frame as u32 * self.slot_bits as u32
    }
}
