//! Pure register encoders for the TLV320AIC3104.
//!
//! Every function here maps domain values to register bytes without
//! touching the bus. Out-of-range inputs are clamped to the nearest value
//! the register field can hold.

use crate::config::{AudioConfig, SampleRate};

use super::registers as reg;

/// Highest PGA gain in dB.
pub const MAX_PGA_GAIN_DB: f32 = 59.5;

/// PGA step for [`MAX_PGA_GAIN_DB`].
pub const MAX_PGA_STEP: u8 = 0x77;

/// PGA step selected for microphone level input (60 dB).
pub const MIC_GAIN_STEP: u8 = 120;

/// PGA step selected for line level input (0 dB).
pub const LINE_GAIN_STEP: u8 = 0;

/// Below this volume the DAC is muted outright.
pub const VOLUME_MUTE_THRESHOLD: f32 = 0.0001;

/// Largest output attenuation step (63.5 dB).
pub const MAX_VOLUME_STEP: u8 = 0x7F;

/// ADC input wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    SingleEnded = 0,
    #[default]
    Differential = 1,
}

/// Input level preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// 0 dB PGA gain.
    Line,
    /// 60 dB PGA gain. The reference board feeds both from the line input.
    Mic,
}

impl InputSource {
    pub const fn gain_step(self) -> u8 {
        match self {
            InputSource::Line => LINE_GAIN_STEP,
            InputSource::Mic => MIC_GAIN_STEP,
        }
    }
}

/// DAC quiescent current (register 109).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DacPower {
    #[default]
    Default = 0x00,
    Plus50 = 0x40,
    Plus100 = 0xC0,
}

/// Built-in ADC high-pass corners, as a fraction of the ADC rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HpfPreset {
    #[default]
    Disabled = 0,
    /// −3 dB at 0.0045 × fS.
    Corner0045 = 1,
    /// −3 dB at 0.0125 × fS.
    Corner0125 = 2,
    /// −3 dB at 0.025 × fS.
    Corner025 = 3,
}

impl HpfPreset {
    /// Map a raw option; only the low two bits count.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => HpfPreset::Disabled,
            1 => HpfPreset::Corner0045,
            2 => HpfPreset::Corner0125,
            _ => HpfPreset::Corner025,
        }
    }

    /// Register 12 HPF bits for the selected channels.
    pub const fn filter_bits(self, left: bool, right: bool) -> u8 {
        let option = self as u8;
        let mut bits = 0;
        if left {
            bits |= option << reg::FILTER_HPF_LEFT_SHIFT;
        }
        if right {
            bits |= option << reg::FILTER_HPF_RIGHT_SHIFT;
        }
        bits
    }
}

// ── Gain ───────────────────────────────────────────────────────────────────

/// PGA step for a gain in dB: `round(g × 0x77 / 59.5)`.
pub fn gain_to_step(gain_db: f32) -> u8 {
    let gain = gain_db.clamp(0.0, MAX_PGA_GAIN_DB);
    (0.5 + gain * MAX_PGA_STEP as f32 / MAX_PGA_GAIN_DB) as u8
}

/// Gain in dB programmed by a PGA step.
pub fn step_to_gain(step: u8) -> f32 {
    step.min(MAX_PGA_STEP) as f32 * MAX_PGA_GAIN_DB / MAX_PGA_STEP as f32
}

// ── Volume ─────────────────────────────────────────────────────────────────

/// Output attenuation step for a linear volume in `0.0..=1.0`.
///
/// Each step is 0.5 dB, so `step = floor(-40 × log10(vol))`, saturated to
/// the 7-bit field.
pub fn volume_to_step(volume: f32) -> u8 {
    let volume = volume.clamp(0.0, 1.0);
    let attenuation = -40.0 * libm::log10f(volume);
    // float-to-int casts saturate; +inf lands on the field maximum
    (attenuation as u8).min(MAX_VOLUME_STEP)
}

/// `true` when the volume is low enough to mute the DAC.
pub fn volume_mutes(volume: f32) -> bool {
    !(volume >= VOLUME_MUTE_THRESHOLD)
}

/// Headphone and line-out route register value for a volume.
pub fn output_route(volume: f32) -> u8 {
    volume_to_step(volume) | reg::ROUTE_ON
}

/// DAC digital volume register value for a volume.
pub fn dac_volume(volume: f32) -> u8 {
    if volume_mutes(volume) {
        reg::DAC_MUTE
    } else {
        0
    }
}

// ── Datapath and serial interface ──────────────────────────────────────────

/// Register 7: reference rate, dual rate and straight DAC routing.
pub fn datapath(rate: SampleRate) -> u8 {
    let mut value = reg::DATAPATH_DAC_STRAIGHT;
    if !rate.is_base_48k() {
        value |= reg::DATAPATH_FSREF_44K1;
    }
    if rate.is_dual_rate() {
        value |= reg::DATAPATH_DUAL_RATE;
    }
    value
}

/// Register 9: transfer mode, word length, 256-clock mode and re-sync.
pub fn serial_format(config: &AudioConfig) -> u8 {
    let mut value = (config.mode.code() << 6) | (config.sample_length.word_code() << 4);
    if config.mode.is_tdm() {
        value |= reg::SERIAL_B_256_CLOCK;
    }
    if config.resync {
        value |= reg::SERIAL_B_RESYNC;
    }
    value
}

/// Registers 19 and 22: input wiring with the ADC powered up.
pub fn adc_input(mode: InputMode) -> u8 {
    ((mode as u8) << 7) | reg::ADC_POWER_UP
}

// ── AGC ────────────────────────────────────────────────────────────────────

/// Automatic gain control parameters for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgcSettings {
    /// Target level code, 0 (−5.5 dB) to 7 (−24 dB).
    pub target_level: u8,
    /// Attack time code, 0..=3.
    pub attack: u8,
    /// Decay time code, 0..=3.
    pub decay: u8,
    /// Maximum PGA gain the AGC may apply, in dB.
    pub max_gain_db: f32,
    /// Hysteresis code, 0..=3.
    pub hysteresis: u8,
    /// Noise gate threshold in dB (−30 to −90); above −30 turns the gate off.
    pub noise_threshold_db: f32,
    pub clip_stepping: bool,
}

impl Default for AgcSettings {
    fn default() -> Self {
        AgcSettings {
            target_level: 0,
            attack: 0,
            decay: 0,
            max_gain_db: MAX_PGA_GAIN_DB,
            hysteresis: 0,
            noise_threshold_db: 0.0,
            clip_stepping: false,
        }
    }
}

impl AgcSettings {
    /// Control registers A, B and C, with the enable bit set in A.
    pub fn registers(&self) -> [u8; 3] {
        let a = reg::AGC_ENABLE
            | ((self.target_level & 0x07) << 4)
            | ((self.attack & 0x03) << 2)
            | (self.decay & 0x03);
        let max_gain = (self.max_gain_db.clamp(0.0, MAX_PGA_GAIN_DB) * 2.0) as u8;
        let b = (max_gain & 0x7F) << 1;
        let noise = if self.noise_threshold_db > -30.0 {
            0
        } else {
            ((-self.noise_threshold_db - 28.0) / 2.0) as u8
        };
        let c = ((self.hysteresis & 0x03) << 6) | ((noise & 0x1F) << 1) | self.clip_stepping as u8;
        [a, b, c]
    }
}

// ── Status ─────────────────────────────────────────────────────────────────

/// ADC/DAC overflow flags from register 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverflowFlags {
    pub adc_left: bool,
    pub adc_right: bool,
    pub dac_left: bool,
    pub dac_right: bool,
}

impl OverflowFlags {
    pub fn from_register(value: u8) -> Self {
        OverflowFlags {
            adc_left: value & reg::OVERFLOW_ADC_LEFT != 0,
            adc_right: value & reg::OVERFLOW_ADC_RIGHT != 0,
            dac_left: value & reg::OVERFLOW_DAC_LEFT != 0,
            dac_right: value & reg::OVERFLOW_DAC_RIGHT != 0,
        }
    }

    pub fn any(&self) -> bool {
        self.adc_left || self.adc_right || self.dac_left || self.dac_right
    }
}
