//! TLV320AIC3104 register addresses and bitfield definitions.
//!
//! Registers are 8-bit wide and 8-bit addressed. Register 0 on either page
//! selects the page: page 0 holds the control registers, page 1 the digital
//! filter coefficients. Anything that switches to page 1 must switch back.

// A few registers are listed for completeness of the map.
#![allow(dead_code)]

// ── Paging and reset ───────────────────────────────────────────────────────

/// Page select (both pages).
pub const PAGE_SELECT: u8 = 0;

/// Software reset. Writing bit 7 restores every register to its default.
pub const SOFT_RESET: u8 = 1;
pub const SOFT_RESET_TRIGGER: u8 = 0x80;

// ── Clocking ───────────────────────────────────────────────────────────────

/// PLL programming A.
/// - Bit 7    — PLL enable
/// - Bits 6:3 — Q
/// - Bits 2:0 — P (0 means 8)
pub const PLL_A: u8 = 3;
pub const PLL_ENABLE: u8 = 0x80;

/// PLL programming B. Bits 7:2 — J.
pub const PLL_B: u8 = 4;

/// PLL programming C. Bits 7:0 — D bits 13:6.
pub const PLL_C: u8 = 5;

/// PLL programming D. Bits 7:2 — D bits 5:0.
pub const PLL_D: u8 = 6;

/// Codec datapath setup.
/// - Bit 7    — fS(ref): 0 = 48 kHz, 1 = 44.1 kHz
/// - Bits 6:5 — ADC/DAC dual rate
/// - Bits 4:1 — DAC datapath routing
pub const DATAPATH: u8 = 7;
pub const DATAPATH_FSREF_44K1: u8 = 0x80;
pub const DATAPATH_DUAL_RATE: u8 = 0x60;
/// Left data to left DAC, right data to right DAC.
pub const DATAPATH_DAC_STRAIGHT: u8 = 0x0A;

/// Audio serial interface control A.
/// - Bit 5 — DOUT placed in high impedance when not driving valid data
pub const SERIAL_A: u8 = 8;
pub const SERIAL_A_DOUT_HIZ: u8 = 0x20;

/// Audio serial interface control B.
/// - Bits 7:6 — transfer mode (I2S, DSP, RJ, LJ)
/// - Bits 5:4 — word length
/// - Bit 3    — 256-clock mode
/// - Bits 2:0 — re-sync DAC, ADC, with soft mute
pub const SERIAL_B: u8 = 9;
pub const SERIAL_B_256_CLOCK: u8 = 0x08;
pub const SERIAL_B_RESYNC: u8 = 0x07;

/// Audio serial interface control C. Data offset in bit clocks.
pub const SERIAL_C: u8 = 10;

/// Overflow flags and PLL R.
/// - Bit 7    — left ADC overflow
/// - Bit 6    — right ADC overflow
/// - Bit 5    — left DAC overflow
/// - Bit 4    — right DAC overflow
/// - Bits 3:0 — PLL R (0 means 16)
pub const OVERFLOW_PLL_R: u8 = 11;
pub const OVERFLOW_ADC_LEFT: u8 = 0x80;
pub const OVERFLOW_ADC_RIGHT: u8 = 0x40;
pub const OVERFLOW_DAC_LEFT: u8 = 0x20;
pub const OVERFLOW_DAC_RIGHT: u8 = 0x10;

// ── Digital filters ────────────────────────────────────────────────────────

/// Digital filter control, shared by three independent filter groups.
/// - Bits 7:6 — left ADC high-pass
/// - Bits 5:4 — right ADC high-pass
/// - Bit 3    — left DAC effects biquads
/// - Bit 2    — left DAC de-emphasis
/// - Bit 1    — right DAC effects biquads
/// - Bit 0    — right DAC de-emphasis
pub const DIGITAL_FILTER: u8 = 12;
pub const FILTER_HPF_LEFT: u8 = 0xC0;
pub const FILTER_HPF_RIGHT: u8 = 0x30;
pub const FILTER_HPF_MASK: u8 = FILTER_HPF_LEFT | FILTER_HPF_RIGHT;
pub const FILTER_EFFECTS_LEFT: u8 = 0x08;
pub const FILTER_EFFECTS_RIGHT: u8 = 0x02;
pub const FILTER_EFFECTS_MASK: u8 = FILTER_EFFECTS_LEFT | FILTER_EFFECTS_RIGHT;
pub const FILTER_DEEMPHASIS_MASK: u8 = 0x05;
/// Shift of the left HPF corner option; the right one sits two bits lower.
pub const FILTER_HPF_LEFT_SHIFT: u8 = 6;
pub const FILTER_HPF_RIGHT_SHIFT: u8 = 4;

/// Headset detection B. Bits 7:6 — fully differential AC-coupled drivers.
pub const HEADSET_B: u8 = 14;
pub const HEADSET_B_DIFFERENTIAL: u8 = 0xC0;

// ── ADC / PGA ──────────────────────────────────────────────────────────────

/// Left ADC PGA gain. Bit 7 mute, bits 6:0 gain in 0.5 dB steps.
pub const PGA_LEFT: u8 = 15;
/// Right ADC PGA gain.
pub const PGA_RIGHT: u8 = 16;
pub const PGA_MUTE: u8 = 0x80;
pub const PGA_STEP_MASK: u8 = 0x7F;

/// LINE1L to left ADC.
/// - Bit 7 — differential input
/// - Bit 2 — ADC powered up
pub const LINE1L_TO_LEFT_ADC: u8 = 19;
/// LINE1R to right ADC.
pub const LINE1R_TO_RIGHT_ADC: u8 = 22;
pub const ADC_DIFFERENTIAL: u8 = 0x80;
pub const ADC_POWER_UP: u8 = 0x04;

/// Left AGC control A.
/// - Bit 7    — enable
/// - Bits 6:4 — target level
/// - Bits 3:2 — attack time
/// - Bits 1:0 — decay time
pub const AGC_LEFT_A: u8 = 26;
/// Left AGC control B. Bits 7:1 — maximum gain in 0.5 dB steps.
pub const AGC_LEFT_B: u8 = 27;
/// Left AGC control C.
/// - Bits 7:6 — hysteresis
/// - Bits 5:1 — noise threshold
/// - Bit 0    — clip stepping
pub const AGC_LEFT_C: u8 = 28;
pub const AGC_RIGHT_A: u8 = 29;
pub const AGC_RIGHT_B: u8 = 30;
pub const AGC_RIGHT_C: u8 = 31;
pub const AGC_ENABLE: u8 = 0x80;

// ── DAC and outputs ────────────────────────────────────────────────────────

/// DAC power and output driver control. Bits 7:6 — left/right DAC power.
pub const DAC_POWER: u8 = 37;
pub const DAC_POWER_BOTH: u8 = 0xC0;

/// High-power output stage. Bits 7:6 — common-mode voltage.
pub const HP_STAGE: u8 = 40;
pub const HP_STAGE_VCM_1V5: u8 = 0x40;

/// Output driver pop reduction.
/// - Bits 7:4 — power-on time
/// - Bit 1    — drive VCM from the band gap
pub const POP_REDUCTION: u8 = 42;
pub const POP_POWER_ON_2S: u8 = 0x90;
pub const POP_BAND_GAP: u8 = 0x02;

/// Left DAC digital volume. Bit 7 mute.
pub const DAC_VOLUME_LEFT: u8 = 43;
/// Right DAC digital volume.
pub const DAC_VOLUME_RIGHT: u8 = 44;
pub const DAC_MUTE: u8 = 0x80;

/// DAC_L1 to HPLOUT volume. Bit 7 routed, bits 6:0 attenuation in 0.5 dB.
pub const DAC_L1_TO_HPLOUT: u8 = 47;
/// HPLOUT output level. Bit 3 unmute, bit 0 power up.
pub const HPLOUT_LEVEL: u8 = 51;
/// DAC_R1 to HPROUT volume.
pub const DAC_R1_TO_HPROUT: u8 = 64;
/// HPROUT output level.
pub const HPROUT_LEVEL: u8 = 65;
/// DAC_L1 to LEFT_LOP/M volume.
pub const DAC_L1_TO_LEFT_LOP: u8 = 82;
/// LEFT_LOP/M output level.
pub const LEFT_LOP_LEVEL: u8 = 86;
/// DAC_R1 to RIGHT_LOP/M volume.
pub const DAC_R1_TO_RIGHT_LOP: u8 = 92;
/// RIGHT_LOP/M output level.
pub const RIGHT_LOP_LEVEL: u8 = 93;

pub const ROUTE_ON: u8 = 0x80;
pub const OUTPUT_UNMUTED: u8 = 0x09;
pub const OUTPUT_MUTED: u8 = 0x08;

/// Clock generation control.
/// - Bits 7:6 — CLKDIV_IN source
/// - Bits 5:4 — PLLCLK_IN source
pub const CLOCK_GEN: u8 = 102;
pub const CLOCK_GEN_MCLK: u8 = 0x02;
pub const CLOCK_GEN_PLL_FROM_BCLK: u8 = 0x22;

/// ADC high-pass coefficient select.
/// - Bit 7 — left channel uses programmable coefficients
/// - Bit 6 — right channel uses programmable coefficients
/// - Bits 5:4 — reserved, write as 1
pub const ADC_FILTER_SELECT: u8 = 107;
pub const ADC_FILTER_RESERVED: u8 = 0x30;
pub const ADC_FILTER_LEFT: u8 = 0x80;
pub const ADC_FILTER_RIGHT: u8 = 0x40;

/// DAC quiescent current adjustment.
pub const DAC_CURRENT: u8 = 109;

// ── Page 1: coefficients ───────────────────────────────────────────────────

/// First left DAC effects coefficient (N0 MSB of stage 0).
pub const P1_DAC_LEFT_BASE: u8 = 1;
/// Offset from a left DAC coefficient to its right counterpart.
pub const P1_DAC_RIGHT_OFFSET: u8 = 26;
/// First D coefficient of stage 0, left channel.
pub const P1_DAC_D_BASE: u8 = 13;
/// Register span of one stage's N coefficients (three 16-bit words).
pub const P1_DAC_N_STAGE_SPAN: u8 = 6;
/// Register span of one stage's D coefficients (two 16-bit words).
pub const P1_DAC_D_STAGE_SPAN: u8 = 4;

/// Left ADC one-pole filter N0, N1, D1 (MSB first).
pub const P1_ADC_LEFT_BASE: u8 = 65;
/// Right ADC one-pole filter N0, N1, D1 (MSB first).
pub const P1_ADC_RIGHT_BASE: u8 = 71;
