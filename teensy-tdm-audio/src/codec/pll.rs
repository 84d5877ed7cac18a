//! Codec PLL parameters.
//!
//! `fS(ref) = CLK_IN × K × R / (2048 × P)` with `K = J.D = J + D / 10000`.
//! For the presets below CLK_IN is the bit clock, which keeps the codec
//! locked to the SAI without a separate MCLK.

use crate::config::{SampleRate, TransportMode};

use super::registers as reg;

pub const J_RANGE: (u8, u8) = (1, 63);
pub const D_MAX: u16 = 9999;
pub const P_RANGE: (u8, u8) = (1, 8);
pub const R_MAX: u8 = 16;
/// Q used when the PLL is bypassed.
pub const DEFAULT_Q: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllSettings {
    /// PLL input clock in Hz.
    pub clk: u32,
    pub p: u8,
    pub r: u8,
    pub j: u8,
    pub d: u16,
    pub q: u8,
}

impl Default for PllSettings {
    /// TDM at 44.1 kHz.
    fn default() -> Self {
        PllSettings {
            clk: 11_289_600,
            p: 1,
            r: 1,
            j: 8,
            d: 0,
            q: DEFAULT_Q,
        }
    }
}

impl PllSettings {
    /// Build settings with every field clamped into its register range.
    pub fn new(clk: u32, p: u8, r: u8, j: u8, d: u16) -> Self {
        PllSettings {
            clk,
            p: p.clamp(P_RANGE.0, P_RANGE.1),
            r: r.min(R_MAX),
            j: j.clamp(J_RANGE.0, J_RANGE.1),
            d: d.min(D_MAX),
            q: DEFAULT_Q,
        }
    }

    /// Preset for a rate family and transport mode.
    ///
    /// TDM runs the bit clock at 256 × fS, I2S at 32 × fS.
    pub fn for_rate(rate: SampleRate, mode: TransportMode) -> Self {
        let base_48k = rate.is_base_48k();
        if mode.is_tdm() {
            let clk = if base_48k { 12_288_000 } else { 11_289_600 };
            PllSettings::new(clk, 1, 1, 8, 0)
        } else {
            let clk = if base_48k { 1_536_000 } else { 1_411_200 };
            PllSettings::new(clk, 1, 4, 16, 0)
        }
    }

    /// `K = J + D / 10000`.
    pub fn k(&self) -> f32 {
        self.j as f32 + self.d as f32 / 10_000.0
    }

    /// Reference rate the codec derives from these settings, in Hz.
    pub fn fs_ref(&self) -> u32 {
        let fs = self.clk as f32 / 2048.0 * self.k() * self.r as f32 / self.p as f32;
        (fs + 0.5) as u32
    }

    /// Register writes in programming order; register 3 (which carries the
    /// enable bit) comes last.
    pub fn registers(&self, enabled: bool) -> [(u8, u8); 6] {
        let mut r3 = ((self.q & 0x0F) << 3) | (self.p & 0x07);
        if enabled {
            r3 |= reg::PLL_ENABLE;
        }
        let clock_gen = if enabled {
            reg::CLOCK_GEN_PLL_FROM_BCLK
        } else {
            reg::CLOCK_GEN_MCLK
        };
        [
            (reg::PLL_B, self.j << 2),
            (reg::PLL_C, (self.d >> 6) as u8),
            (reg::PLL_D, ((self.d << 2) & 0xFF) as u8),
            (reg::OVERFLOW_PLL_R, self.r & 0x0F),
            (reg::CLOCK_GEN, clock_gen),
            (reg::PLL_A, r3),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_reach_the_base_rate() {
        let tdm44 = PllSettings::for_rate(SampleRate::Hz44100, TransportMode::DspTdm);
        assert_eq!(tdm44, PllSettings::default());
        assert_eq!(tdm44.fs_ref(), 44_100);

        let tdm48 = PllSettings::for_rate(SampleRate::Hz96000, TransportMode::DspTdm);
        assert_eq!(tdm48.fs_ref(), 48_000);

        let i2s44 = PllSettings::for_rate(SampleRate::Hz44100, TransportMode::I2s);
        assert_eq!((i2s44.r, i2s44.j), (4, 16));
        assert_eq!(i2s44.fs_ref(), 44_100);
    }

    #[test]
    fn out_of_range_fields_clamp() {
        let pll = PllSettings::new(1_000_000, 0, 40, 100, 20_000);
        assert_eq!((pll.p, pll.r, pll.j, pll.d), (1, 16, 63, 9999));
        let pll = PllSettings::new(1_000_000, 9, 0, 0, 0);
        assert_eq!((pll.p, pll.j), (8, 1));
    }

    #[test]
    fn k_includes_fraction() {
        let pll = PllSettings::new(12_000_000, 1, 1, 7, 1680);
        assert!((pll.k() - 7.168).abs() < 1e-4);
    }

    #[test]
    fn register_packing() {
        let pll = PllSettings::new(12_000_000, 8, 16, 7, 1680);
        let regs = pll.registers(true);
        assert_eq!(regs[0], (reg::PLL_B, 7 << 2));
        assert_eq!(regs[1], (reg::PLL_C, (1680u16 >> 6) as u8));
        assert_eq!(regs[2], (reg::PLL_D, ((1680u16 << 2) & 0xFF) as u8));
        // R = 16 and P = 8 both encode as 0
        assert_eq!(regs[3], (reg::OVERFLOW_PLL_R, 0));
        assert_eq!(regs[4], (reg::CLOCK_GEN, 0x22));
        assert_eq!(regs[5], (reg::PLL_A, 0x80 | (2 << 3)));
    }

    #[test]
    fn bypassed_pll_clears_enable() {
        let regs = PllSettings::default().registers(false);
        assert_eq!(regs[4], (reg::CLOCK_GEN, 0x02));
        assert_eq!(regs[5], (reg::PLL_A, (2 << 3) | 1));
    }
}
