//! TLV320AIC3104 codec array driver.
//!
//! One [`CodecArray`] drives up to sixteen codecs sharing a control bus,
//! four per expansion board behind a PCA9546 mux. Every operation takes a
//! [`CodecSel`] and, where it applies, a [`ChannelSel`]; broadcasts walk the
//! codecs in ascending order and keep going past a failed codec, collecting
//! the failures in the returned [`Report`].
//!
//! # Example
//!
//! ```ignore
//! let config = AudioConfig::new(8).with_mode(TransportMode::DspTdm);
//! let mut codecs = CodecArray::new(i2c, delay, reset_pin, config);
//! codecs.begin();                                   // reset line + mux probe
//! codecs.enable(CodecSel::All).into_result()?;
//! codecs.volume(0.5, ChannelSel::Both, CodecSel::All).into_result()?;
//! codecs.adc_hpf(10, ChannelSel::Both, CodecSel::One(3)).into_result()?;
//! ```
//!
//! # Power sequencing
//!
//! [`enable`](CodecArray::enable) follows the order the codec needs to stay
//! quiet: sample rate set with the converters down, input routed and ADC
//! powered before the PGA is unmuted, output routed, DAC powered and its
//! digital volume unmuted before the analog drivers are unmuted.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::config::{AudioConfig, ClockSource, SampleRate, Topology, Verbosity};
use crate::control::AudioControl;
use crate::error::{BusError, Report};

use super::bus::{CodecBus, NoPin};
use super::encode::{
    self, AgcSettings, DacPower, HpfPreset, InputMode, InputSource, OverflowFlags,
};
use super::filters::{
    BiquadCoefficients, FilterDesign, FilterDump, OnePole, RegisterCoefficients, DAC_STAGES,
    DUMP_ORDER,
};
use super::pll::PllSettings;
use super::registers as reg;
use super::target::{ChannelSel, CodecSel};

/// Settings applied by the next `enable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Defaults {
    gain_step: u8,
    input_mode: InputMode,
    hpf: HpfPreset,
    dac_power: DacPower,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            gain_step: encode::LINE_GAIN_STEP,
            input_mode: InputMode::Differential,
            hpf: HpfPreset::Disabled,
            dac_power: DacPower::Default,
        }
    }
}

/// Reset line low time, µs.
const RESET_PULSE_US: u32 = 2;
/// Codec settle time after the reset line is released, µs.
const RESET_SETTLE_US: u32 = 1500;
/// Mux and codec stabilization after a reset, ms.
const STABILIZE_MS: u32 = 100;
/// Soft-step time for volume and PGA ramps before powering down, ms.
const RAMP_DOWN_MS: u32 = 50;

pub struct CodecArray<I2C, D, RST, P = NoPin> {
    bus: CodecBus<I2C, D, P>,
    reset: RST,
    config: AudioConfig,
    pll: PllSettings,
    defaults: Defaults,
    /// The reset line has been pulsed since power-up.
    hw_reset_done: bool,
    /// Codecs whose soft reset and clock setup have run, one bit each.
    initialized: u16,
    running: bool,
}

impl<I2C, D, RST> CodecArray<I2C, D, RST, NoPin>
where
    I2C: I2c,
    D: DelayNs,
    RST: OutputPin,
{
    /// Driver for a board without a bus activity indicator.
    pub fn new(i2c: I2C, delay: D, reset: RST, config: AudioConfig) -> Self {
        CodecArray::with_activity_pin(i2c, delay, reset, NoPin, config)
    }
}

impl<I2C, D, RST, P> CodecArray<I2C, D, RST, P>
where
    I2C: I2c,
    D: DelayNs,
    RST: OutputPin,
    P: OutputPin,
{
    /// Driver whose `activity` pin is high for the duration of each bus
    /// transaction.
    pub fn with_activity_pin(i2c: I2C, delay: D, reset: RST, activity: P, config: AudioConfig) -> Self {
        let (config, warning) = config.validated();
        if let Some(warning) = warning {
            warn!("{warning}");
        }
        CodecArray {
            bus: CodecBus::new(i2c, delay, activity, &config),
            reset,
            config,
            pll: PllSettings::for_rate(config.sample_rate, config.mode),
            defaults: Defaults::default(),
            hw_reset_done: false,
            initialized: 0,
            running: false,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// `true` once a codec has been enabled and until `disable`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Consume the driver and return its parts.
    pub fn release(self) -> (I2C, D, RST, P) {
        let (i2c, delay, activity) = self.bus.release();
        (i2c, delay, self.reset, activity)
    }

    fn basic(&self) -> bool {
        self.config.verbosity >= Verbosity::Basic
    }

    /// Apply `op` to every selected codec, in ascending order.
    fn each_codec<F>(&mut self, codecs: CodecSel, mut op: F) -> Report
    where
        F: FnMut(&mut CodecBus<I2C, D, P>, u8) -> Result<(), BusError>,
    {
        let mut report = Self::new_report(codecs, self.config.codecs);
        for codec in codecs.range(self.config.codecs) {
            report.record(codec, op(&mut self.bus, codec));
        }
        report
    }

    /// Empty report, with a selected codec beyond the configured count
    /// already listed as skipped.
    fn new_report(codecs: CodecSel, configured: u8) -> Report {
        let mut report = Report::new();
        if let Some(codec) = codecs.out_of_range(configured) {
            report.record(codec, Err(BusError::NotProvisioned { codec }));
        }
        report
    }

    // ── Bring-up ───────────────────────────────────────────────────────

    /// Release the codecs from reset and discover the mux boards.
    ///
    /// Returns the number of muxes found (zero for a direct topology).
    pub fn begin(&mut self) -> u8 {
        self.set_reset_line(true);
        self.bus.delay_us(3);
        self.reset();
        self.bus.delay_us(3);
        let muxes = self.bus.probe();
        if self.config.topology == Topology::Multiplexed {
            self.bus.router().check_population(self.config.codecs);
        }
        if self.basic() {
            info!("{muxes} muxes, {} codecs reachable", self.bus.provisioned());
        }
        muxes
    }

    /// Pulse the hardware reset line shared by every codec and mux.
    pub fn reset(&mut self) {
        self.set_reset_line(false);
        self.bus.delay_us(RESET_PULSE_US);
        self.set_reset_line(true);
        self.bus.delay_us(RESET_SETTLE_US);
        self.hw_reset_done = true;
        // A hardware reset reverts every register and every mux.
        self.initialized = 0;
        self.bus.forget_selection();
    }

    fn set_reset_line(&mut self, high: bool) {
        let result = if high {
            self.reset.set_high()
        } else {
            self.reset.set_low()
        };
        if result.is_err() {
            warn!("codec reset line did not switch");
        }
    }

    /// Soft reset, clock setup and serial format for one codec.
    fn init_codec(bus: &mut CodecBus<I2C, D, P>, codec: u8, config: &AudioConfig, pll: &PllSettings) -> Result<(), BusError> {
        bus.write_register(codec, reg::PAGE_SELECT, 0)?;
        bus.write_register(codec, reg::SOFT_RESET, reg::SOFT_RESET_TRIGGER)?;
        bus.delay_ms(1);
        let use_pll = config.clock == ClockSource::Pll;
        for (register, value) in pll.registers(use_pll) {
            bus.write_register(codec, register, value)?;
        }
        bus.write_register(codec, reg::SERIAL_A, reg::SERIAL_A_DOUT_HIZ)?;
        bus.write_register(codec, reg::SERIAL_B, encode::serial_format(config))?;
        bus.write_register(codec, reg::SERIAL_C, slot_offset(config, codec)?)
    }

    /// Power up and configure the selected codecs.
    ///
    /// The reset line is pulsed at most once per power cycle and each codec
    /// is soft reset only on its first enable, so enabling codecs one at a
    /// time never disturbs those already running.
    pub fn enable(&mut self, codecs: CodecSel) -> Report {
        if !self.hw_reset_done {
            self.begin();
            self.bus.delay_ms(STABILIZE_MS);
        }

        let config = self.config;
        let pll = self.pll;
        let defaults = self.defaults;
        let mut report = Self::new_report(codecs, config.codecs);

        let mut fresh = 0u16;
        for codec in codecs.range(config.codecs) {
            let bit = 1u16.checked_shl(codec as u32).unwrap_or(0);
            if self.initialized & bit == 0 {
                let result = Self::init_codec(&mut self.bus, codec, &config, &pll);
                if result.is_ok() {
                    fresh |= bit;
                }
                report.record(codec, result);
            }
        }
        if fresh != 0 {
            self.initialized |= fresh;
            self.bus.delay_ms(STABILIZE_MS);
        }

        for codec in codecs.range(config.codecs) {
            if report.failures().iter().any(|f| f.codec == codec) || report.skipped().contains(&codec) {
                continue;
            }
            let result = Self::enable_codec(&mut self.bus, codec, &config, &defaults);
            if result.is_ok() {
                self.running = true;
            }
            report.record(codec, result);
        }

        if self.basic() {
            info!("enable {codecs:?}: {report}");
        }
        report
    }

    fn enable_codec(bus: &mut CodecBus<I2C, D, P>, codec: u8, config: &AudioConfig, defaults: &Defaults) -> Result<(), BusError> {
        bus.write_register(codec, reg::SERIAL_A, reg::SERIAL_A_DOUT_HIZ)?;
        // Fails fast on a codec that is fitted but not answering.
        bus.read_register(codec, reg::SERIAL_A)?;

        // Sample rate, with ADC and DAC still powered down.
        bus.write_register(codec, reg::DATAPATH, encode::datapath(config.sample_rate))?;

        // Route the inputs and power the ADCs, then unmute the PGAs.
        let adc = encode::adc_input(defaults.input_mode);
        bus.write_register(codec, reg::LINE1L_TO_LEFT_ADC, adc)?;
        bus.write_register(codec, reg::LINE1R_TO_RIGHT_ADC, adc)?;
        let step = defaults.gain_step & reg::PGA_STEP_MASK;
        bus.write_register(codec, reg::PGA_LEFT, step)?;
        bus.write_register(codec, reg::PGA_RIGHT, step)?;
        bus.write_register(codec, reg::DIGITAL_FILTER, defaults.hpf.filter_bits(true, true))?;

        bus.write_register(codec, reg::SERIAL_B, encode::serial_format(config))?;
        if config.mode.is_tdm() {
            bus.write_register(codec, reg::SERIAL_C, slot_offset(config, codec)?)?;
        }

        // Output drivers, DAC power.
        bus.write_register(codec, reg::HEADSET_B, reg::HEADSET_B_DIFFERENTIAL)?;
        bus.write_register(codec, reg::DAC_CURRENT, defaults.dac_power as u8)?;
        bus.write_register(codec, reg::DAC_POWER, reg::DAC_POWER_BOTH)?;
        bus.write_register(codec, reg::HP_STAGE, reg::HP_STAGE_VCM_1V5)?;
        bus.write_register(codec, reg::POP_REDUCTION, reg::POP_POWER_ON_2S | reg::POP_BAND_GAP)?;

        // Routing, then digital volume, then the analog outputs.
        for route in [
            reg::DAC_L1_TO_HPLOUT,
            reg::DAC_R1_TO_HPROUT,
            reg::DAC_L1_TO_LEFT_LOP,
            reg::DAC_R1_TO_RIGHT_LOP,
        ] {
            bus.write_register(codec, route, reg::ROUTE_ON)?;
        }
        bus.write_register(codec, reg::DAC_VOLUME_LEFT, 0)?;
        bus.write_register(codec, reg::DAC_VOLUME_RIGHT, 0)?;
        for level in [
            reg::HPLOUT_LEVEL,
            reg::HPROUT_LEVEL,
            reg::LEFT_LOP_LEVEL,
            reg::RIGHT_LOP_LEVEL,
        ] {
            bus.write_register(codec, level, reg::OUTPUT_UNMUTED)?;
        }
        Ok(())
    }

    /// Ramp the selected codecs down quietly and return them to reset
    /// state with their data output in high impedance.
    pub fn disable(&mut self, codecs: CodecSel) -> Report {
        let mut report = Self::new_report(codecs, self.config.codecs);
        for codec in codecs.range(self.config.codecs) {
            let result = Self::stop_codec(&mut self.bus, codec);
            if !matches!(result, Err(ref e) if e.is_absent()) {
                self.initialized &= !1u16.checked_shl(codec as u32).unwrap_or(0);
            }
            report.record(codec, result);
        }
        if codecs == CodecSel::All {
            self.running = false;
        }
        if self.basic() {
            info!("disable {codecs:?}: {report}");
        }
        report
    }

    fn stop_codec(bus: &mut CodecBus<I2C, D, P>, codec: u8) -> Result<(), BusError> {
        Self::write_volume(bus, codec, 0.0, ChannelSel::Both)?;
        bus.write_register(codec, reg::PGA_LEFT, reg::PGA_MUTE)?;
        bus.write_register(codec, reg::PGA_RIGHT, reg::PGA_MUTE)?;
        bus.write_register(codec, reg::HPLOUT_LEVEL, reg::OUTPUT_MUTED)?;
        bus.write_register(codec, reg::HPROUT_LEVEL, reg::OUTPUT_MUTED)?;
        bus.delay_ms(RAMP_DOWN_MS);
        bus.write_register(codec, reg::SOFT_RESET, reg::SOFT_RESET_TRIGGER)?;
        bus.write_register(codec, reg::SERIAL_A, reg::SERIAL_A_DOUT_HIZ)
    }

    /// DAC quiescent current used by the next `enable`.
    pub fn dac_power(&mut self, level: DacPower) {
        self.defaults.dac_power = level;
    }

    // ── Inputs ─────────────────────────────────────────────────────────

    /// PGA gain in dB (0 to 59.5); also the default for later enables.
    pub fn gain(&mut self, gain_db: f32, channel: ChannelSel, codecs: CodecSel) -> Report {
        self.write_gain_step(encode::gain_to_step(gain_db), channel, codecs)
    }

    /// Input level as attenuation in dB, −59.5 to 0.
    pub fn input_level(&mut self, level_db: f32, channel: ChannelSel, codecs: CodecSel) -> Report {
        self.write_gain_step(encode::gain_to_step(-level_db), channel, codecs)
    }

    /// Line or microphone level. Both share the line input on the
    /// reference board; the source only picks the PGA preset.
    pub fn input_select(&mut self, source: InputSource, channel: ChannelSel, codecs: CodecSel) -> Report {
        self.write_gain_step(source.gain_step(), channel, codecs)
    }

    fn write_gain_step(&mut self, step: u8, channel: ChannelSel, codecs: CodecSel) -> Report {
        self.defaults.gain_step = step;
        let step = step & reg::PGA_STEP_MASK;
        let report = self.each_codec(codecs, |bus, codec| {
            if channel.left() {
                bus.write_register(codec, reg::PGA_LEFT, step)?;
            }
            if channel.right() {
                bus.write_register(codec, reg::PGA_RIGHT, step)?;
            }
            Ok(())
        });
        if self.basic() {
            info!("PGA step {step} ({} dB) on {channel:?} of {codecs:?}", encode::step_to_gain(step));
        }
        report
    }

    /// Single-ended or differential input wiring.
    ///
    /// Before the first enable this only changes the default.
    pub fn input_mode(&mut self, mode: InputMode, channel: ChannelSel, codecs: CodecSel) -> Report {
        self.defaults.input_mode = mode;
        if !self.running {
            return Report::new();
        }
        let value = encode::adc_input(mode);
        self.each_codec(codecs, |bus, codec| {
            if channel.left() {
                bus.write_register(codec, reg::LINE1L_TO_LEFT_ADC, value)?;
            }
            if channel.right() {
                bus.write_register(codec, reg::LINE1R_TO_RIGHT_ADC, value)?;
            }
            Ok(())
        })
    }

    // ── Outputs ────────────────────────────────────────────────────────

    /// Headphone and line-out volume, `0.0..=1.0`. Near zero also mutes
    /// the DAC.
    pub fn volume(&mut self, volume: f32, channel: ChannelSel, codecs: CodecSel) -> Report {
        let report = self.each_codec(codecs, |bus, codec| Self::write_volume(bus, codec, volume, channel));
        if self.basic() {
            info!("volume {volume} on {channel:?} of {codecs:?}: {report}");
        }
        report
    }

    fn write_volume(bus: &mut CodecBus<I2C, D, P>, codec: u8, volume: f32, channel: ChannelSel) -> Result<(), BusError> {
        let route = encode::output_route(volume);
        let dac = encode::dac_volume(volume);
        if channel.left() {
            bus.write_register(codec, reg::DAC_L1_TO_HPLOUT, route)?;
            bus.write_register(codec, reg::DAC_L1_TO_LEFT_LOP, route)?;
            bus.write_register(codec, reg::DAC_VOLUME_LEFT, dac)?;
        }
        if channel.right() {
            bus.write_register(codec, reg::DAC_R1_TO_HPROUT, route)?;
            bus.write_register(codec, reg::DAC_R1_TO_RIGHT_LOP, route)?;
            bus.write_register(codec, reg::DAC_VOLUME_RIGHT, dac)?;
        }
        Ok(())
    }

    /// Power and unmute, or mute, both line outputs.
    pub fn enable_line_out(&mut self, on: bool, codecs: CodecSel) -> Report {
        let value = if on { reg::OUTPUT_UNMUTED } else { reg::OUTPUT_MUTED };
        self.each_codec(codecs, |bus, codec| {
            bus.write_register(codec, reg::LEFT_LOP_LEVEL, value)?;
            bus.write_register(codec, reg::RIGHT_LOP_LEVEL, value)
        })
    }

    // ── ADC filters ────────────────────────────────────────────────────

    /// Built-in ADC high-pass corner. Before the first enable this only
    /// changes the default.
    ///
    /// Only the selected channels' HPF bits change; the DAC effects and
    /// de-emphasis bits of register 12 are preserved.
    pub fn set_hpf_preset(&mut self, preset: HpfPreset, channel: ChannelSel, codecs: CodecSel) -> Report {
        self.defaults.hpf = preset;
        if !self.running {
            return Report::new();
        }
        let mask = channel.mask(reg::FILTER_HPF_LEFT, reg::FILTER_HPF_RIGHT);
        let bits = preset.filter_bits(channel.left(), channel.right());
        self.each_codec(codecs, |bus, codec| {
            bus.modify_register(codec, reg::DIGITAL_FILTER, mask, bits).map(|_| ())
        })
    }

    /// Programmable one-pole ADC high-pass at `fc` Hz (0 disables, at most
    /// 5 kHz).
    pub fn adc_hpf(&mut self, fc: u32, channel: ChannelSel, codecs: CodecSel) -> Report {
        let filter = OnePole::highpass(fc, self.sample_rate_hz());
        let coefficients = filter.bytes();
        let hpf_bits = channel.mask(reg::FILTER_HPF_LEFT, reg::FILTER_HPF_RIGHT);
        let select = reg::ADC_FILTER_RESERVED | channel.mask(reg::ADC_FILTER_LEFT, reg::ADC_FILTER_RIGHT);
        if self.basic() {
            info!("ADC HPF {fc} Hz on {channel:?} of {codecs:?}: D1 0x{:04X}", filter.d1 as u16);
        }

        self.each_codec(codecs, |bus, codec| {
            // HPF off while its coefficients change.
            let filter_control = bus.modify_register(codec, reg::DIGITAL_FILTER, hpf_bits, 0)?;
            if fc > 0 {
                on_page1(bus, codec, |bus| {
                    for (i, &byte) in coefficients.iter().enumerate() {
                        if channel.left() {
                            bus.write_register(codec, reg::P1_ADC_LEFT_BASE + i as u8, byte)?;
                        }
                        if channel.right() {
                            bus.write_register(codec, reg::P1_ADC_RIGHT_BASE + i as u8, byte)?;
                        }
                    }
                    Ok(())
                })?;
            }
            bus.write_register(codec, reg::ADC_FILTER_SELECT, select)?;
            if fc > 0 {
                bus.write_register(codec, reg::DIGITAL_FILTER, filter_control | hpf_bits)?;
            }
            Ok(())
        })
    }

    fn sample_rate_hz(&self) -> f32 {
        self.config.sample_rate.hz() as f32
    }

    // ── DAC effects filters ────────────────────────────────────────────

    /// Design a biquad for the stream's sample rate and load it into
    /// `stage` (0 or 1).
    pub fn set_dac_filter(&mut self, stage: u8, design: FilterDesign, channel: ChannelSel, codecs: CodecSel) -> Report {
        let coefficients = design.coefficients(self.sample_rate_hz());
        if self.basic() {
            info!("DAC stage {stage} {design:?}: {coefficients:?}");
        }
        self.set_dac_filter_coefficients(stage, &coefficients, channel, codecs)
    }

    /// Load textbook-form coefficients (scaled by 32768).
    pub fn set_dac_filter_coefficients(
        &mut self,
        stage: u8,
        coefficients: &BiquadCoefficients,
        channel: ChannelSel,
        codecs: CodecSel,
    ) -> Report {
        self.set_dac_filter_registers(stage, &coefficients.to_registers(), channel, codecs)
    }

    /// Load coefficients already in register form, e.g. from a vendor
    /// design tool, and turn the effects filter on.
    pub fn set_dac_filter_registers(
        &mut self,
        stage: u8,
        coefficients: &RegisterCoefficients,
        channel: ChannelSel,
        codecs: CodecSel,
    ) -> Report {
        let stage = stage.min(DAC_STAGES - 1);
        let effects = channel.mask(reg::FILTER_EFFECTS_LEFT, reg::FILTER_EFFECTS_RIGHT);
        let left = coefficients.placements(stage, false);
        let right = coefficients.placements(stage, true);

        self.each_codec(codecs, |bus, codec| {
            // Effects off while the coefficients change.
            let filter_control = bus.modify_register(codec, reg::DIGITAL_FILTER, effects, 0)?;
            on_page1(bus, codec, |bus| {
                if channel.left() {
                    write_words(bus, codec, &left)?;
                }
                if channel.right() {
                    write_words(bus, codec, &right)?;
                }
                Ok(())
            })?;
            bus.write_register(codec, reg::DIGITAL_FILTER, filter_control | effects)
        })
    }

    /// Load the codec's all-pass reset coefficients into `stage`.
    pub fn set_dac_filter_flat(&mut self, stage: u8, channel: ChannelSel, codecs: CodecSel) -> Report {
        self.set_dac_filter_registers(stage, &RegisterCoefficients::FLAT, channel, codecs)
    }

    /// Bypass the effects filters of the selected channels.
    pub fn dac_filter_off(&mut self, channel: ChannelSel, codecs: CodecSel) -> Report {
        let effects = channel.mask(reg::FILTER_EFFECTS_LEFT, reg::FILTER_EFFECTS_RIGHT);
        self.each_codec(codecs, |bus, codec| {
            bus.modify_register(codec, reg::DIGITAL_FILTER, effects, 0).map(|_| ())
        })
    }

    /// Read back the effects coefficients of one codec and log them.
    pub fn dump_dac_filters(&mut self, channel: ChannelSel, codec: u8) -> Result<FilterDump, BusError> {
        let mut dump = FilterDump {
            codec,
            ..FilterDump::default()
        };
        let bus = &mut self.bus;
        on_page1(bus, codec, |bus| {
            if channel.left() {
                dump.left = Some(read_words(bus, codec, 0)?);
            }
            if channel.right() {
                dump.right = Some(read_words(bus, codec, reg::P1_DAC_RIGHT_OFFSET)?);
            }
            Ok(())
        })?;
        dump.filter_control = self.bus.read_register(codec, reg::DIGITAL_FILTER)?;

        info!("codec {codec} DAC effects filters");
        for (side, words, offset) in [("left", dump.left, 0), ("right", dump.right, reg::P1_DAC_RIGHT_OFFSET)] {
            if let Some(words) = words {
                for (i, word) in words.iter().enumerate() {
                    let tap = ["N0", "N1", "N2", "D1", "D2"][i % 5];
                    info!("  {side} S{}:{tap} [R{}] 0x{word:04X}", i / 5, DUMP_ORDER[i] + offset);
                }
            }
        }
        info!("  R12 0x{:02X}", dump.filter_control);
        Ok(dump)
    }

    // ── PLL ────────────────────────────────────────────────────────────

    /// Store PLL parameters for the next codec initialization; fields are
    /// clamped to their register ranges. Q is left unchanged.
    pub fn set_pll(&mut self, clk: u32, p: u8, r: u8, j: u8, d: u16) -> PllSettings {
        self.pll = PllSettings {
            q: self.pll.q,
            ..PllSettings::new(clk, p, r, j, d)
        };
        self.pll
    }

    /// Preset PLL parameters for a rate family in the configured mode.
    /// Returns the expected PLL input clock in Hz.
    pub fn set_pll_for_rate(&mut self, rate: SampleRate) -> u32 {
        self.pll = PllSettings::for_rate(rate, self.config.mode);
        self.pll.clk
    }

    pub fn pll(&self) -> PllSettings {
        self.pll
    }

    pub fn pll_fs_ref(&self) -> u32 {
        self.pll.fs_ref()
    }

    // ── AGC ────────────────────────────────────────────────────────────

    /// Program and enable the AGC.
    pub fn agc(&mut self, settings: &AgcSettings, channel: ChannelSel, codecs: CodecSel) -> Report {
        let [a, b, c] = settings.registers();
        self.each_codec(codecs, |bus, codec| {
            if channel.left() {
                bus.write_register(codec, reg::AGC_LEFT_A, a)?;
                bus.write_register(codec, reg::AGC_LEFT_B, b)?;
                bus.write_register(codec, reg::AGC_LEFT_C, c)?;
            }
            if channel.right() {
                bus.write_register(codec, reg::AGC_RIGHT_A, a)?;
                bus.write_register(codec, reg::AGC_RIGHT_B, b)?;
                bus.write_register(codec, reg::AGC_RIGHT_C, c)?;
            }
            Ok(())
        })
    }

    /// Switch the AGC on or off without touching its settings.
    pub fn agc_enable(&mut self, on: bool, channel: ChannelSel, codecs: CodecSel) -> Report {
        let value = if on { reg::AGC_ENABLE } else { 0 };
        self.each_codec(codecs, |bus, codec| {
            if channel.left() {
                bus.modify_register(codec, reg::AGC_LEFT_A, reg::AGC_ENABLE, value)?;
            }
            if channel.right() {
                bus.modify_register(codec, reg::AGC_RIGHT_A, reg::AGC_ENABLE, value)?;
            }
            Ok(())
        })
    }

    // ── Status and diagnostics ─────────────────────────────────────────

    pub fn overflow_flags(&mut self, codec: u8) -> Result<OverflowFlags, BusError> {
        let value = self.bus.read_register(codec, reg::OVERFLOW_PLL_R)?;
        Ok(OverflowFlags::from_register(value))
    }

    /// Switch register page (0 or 1). Anything left on page 1 must be put
    /// back before other operations run.
    pub fn set_reg_page(&mut self, page: u8, codecs: CodecSel) -> Report {
        let page = page.min(1);
        self.each_codec(codecs, |bus, codec| bus.write_register(codec, reg::PAGE_SELECT, page))
    }

    pub fn read_register(&mut self, register: u8, codec: u8) -> Result<u8, BusError> {
        self.bus.read_register(codec, register)
    }

    pub fn write_register(&mut self, register: u8, value: u8, codec: u8) -> Result<(), BusError> {
        self.bus.write_register(codec, register, value)
    }

    /// Switch the mux tree to `codec` without a transfer.
    pub fn select_codec(&mut self, codec: u8) -> Result<(), BusError> {
        self.bus.select(codec)
    }

    /// Log and return the discovered mux addresses.
    pub fn list_muxes(&self) -> &[u8] {
        self.bus.router().list();
        self.bus.router().muxes()
    }
}

/// A codec whose slot pair lies outside the frame is never addressed.
fn slot_offset(config: &AudioConfig, codec: u8) -> Result<u8, BusError> {
    config.slot_offset(codec).ok_or(BusError::NotProvisioned { codec })
}

/// Run `f` with `codec` on register page 1, switching back to page 0
/// whatever `f` returns.
fn on_page1<I2C, D, P, F>(bus: &mut CodecBus<I2C, D, P>, codec: u8, f: F) -> Result<(), BusError>
where
    I2C: I2c,
    D: DelayNs,
    P: OutputPin,
    F: FnOnce(&mut CodecBus<I2C, D, P>) -> Result<(), BusError>,
{
    bus.write_register(codec, reg::PAGE_SELECT, 1)?;
    let result = f(bus);
    let restored = bus.write_register(codec, reg::PAGE_SELECT, 0);
    result.and(restored)
}

/// Write 16-bit coefficients MSB first.
fn write_words<I2C, D, P>(bus: &mut CodecBus<I2C, D, P>, codec: u8, words: &[(u8, i16)]) -> Result<(), BusError>
where
    I2C: I2c,
    D: DelayNs,
    P: OutputPin,
{
    for &(register, word) in words {
        let [msb, lsb] = word.to_be_bytes();
        bus.write_register(codec, register, msb)?;
        bus.write_register(codec, register + 1, lsb)?;
    }
    Ok(())
}

fn read_words<I2C, D, P>(bus: &mut CodecBus<I2C, D, P>, codec: u8, offset: u8) -> Result<[u16; 10], BusError>
where
    I2C: I2c,
    D: DelayNs,
    P: OutputPin,
{
    let mut words = [0u16; 10];
    for (word, &register) in words.iter_mut().zip(DUMP_ORDER.iter()) {
        let msb = bus.read_register(codec, register + offset)?;
        let lsb = bus.read_register(codec, register + offset + 1)?;
        *word = u16::from_be_bytes([msb, lsb]);
    }
    Ok(words)
}

// ── AudioControl trait implementation ──────────────────────────────────────

impl<I2C, D, RST, P> AudioControl for CodecArray<I2C, D, RST, P>
where
    I2C: I2c,
    D: DelayNs,
    RST: OutputPin,
    P: OutputPin,
{
    type Error = Report;

    fn enable(&mut self) -> Result<(), Self::Error> {
        CodecArray::enable(self, CodecSel::All).into_result()
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        CodecArray::disable(self, CodecSel::All).into_result()
    }

    fn volume(&mut self, level: f32) -> Result<(), Self::Error> {
        CodecArray::volume(self, level, ChannelSel::Both, CodecSel::All).into_result()
    }

    fn input_level(&mut self, level_db: f32) -> Result<(), Self::Error> {
        CodecArray::input_level(self, level_db, ChannelSel::Both, CodecSel::All).into_result()
    }

    fn input_select(&mut self, input: u8) -> Result<(), Self::Error> {
        let source = if input == 0 { InputSource::Line } else { InputSource::Mic };
        CodecArray::input_select(self, source, ChannelSel::Both, CodecSel::All).into_result()
    }
}
