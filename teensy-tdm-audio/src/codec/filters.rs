//! Digital filter design and coefficient packing.
//!
//! The codec runs two cascaded biquads per DAC channel and a one-pole filter
//! per ADC channel, all with 16-bit two's complement coefficients on
//! register page 1. The biquad transfer function the hardware implements is
//!
//! ```text
//!          N0 + 2·N1·z⁻¹ + N2·z⁻²
//! H(z) = ---------------------------
//!         32768 − 2·D1·z⁻¹ − D2·z⁻²
//! ```
//!
//! so the tap-1 coefficients are halved and the feedback taps negated
//! relative to the textbook form. [`BiquadCoefficients`] is the textbook
//! form scaled by 32768; [`RegisterCoefficients`] is what gets written.

use core::f32::consts::PI;

use super::registers as reg;

/// Fixed-point unity for every coefficient.
pub const COEFFICIENT_SCALE: f32 = 32768.0;

/// Upper corner accepted by the ADC one-pole high-pass.
pub const ADC_HPF_MAX_HZ: u32 = 5000;

/// Effects stages per DAC channel.
pub const DAC_STAGES: u8 = 2;

/// A second-order filter to design.
///
/// Frequencies are in Hz, `gain_db` is the shelf gain, and `slope` the shelf
/// slope (1.0 is the steepest monotonic slope).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDesign {
    Highpass { frequency: f32, q: f32 },
    Lowpass { frequency: f32, q: f32 },
    Bandpass { frequency: f32, q: f32 },
    Notch { frequency: f32, q: f32 },
    LowShelf { frequency: f32, gain_db: f32, slope: f32 },
    HighShelf { frequency: f32, gain_db: f32, slope: f32 },
}

impl FilterDesign {
    /// Bilinear-transform coefficients for a stream at `sample_rate` Hz.
    pub fn coefficients(&self, sample_rate: f32) -> BiquadCoefficients {
        match *self {
            FilterDesign::Highpass { frequency, q } => {
                let (cos_w0, alpha, scale) = resonant(frequency, q, sample_rate);
                let b0 = (1.0 + cos_w0) / 2.0 * scale;
                BiquadCoefficients::from_f32([
                    b0,
                    -(1.0 + cos_w0) * scale,
                    b0,
                    -2.0 * cos_w0 * scale,
                    (1.0 - alpha) * scale,
                ])
            }
            FilterDesign::Lowpass { frequency, q } => {
                let (cos_w0, alpha, scale) = resonant(frequency, q, sample_rate);
                let b0 = (1.0 - cos_w0) / 2.0 * scale;
                BiquadCoefficients::from_f32([
                    b0,
                    (1.0 - cos_w0) * scale,
                    b0,
                    -2.0 * cos_w0 * scale,
                    (1.0 - alpha) * scale,
                ])
            }
            FilterDesign::Bandpass { frequency, q } => {
                let (cos_w0, alpha, scale) = resonant(frequency, q, sample_rate);
                BiquadCoefficients::from_f32([
                    alpha * scale,
                    0.0,
                    -alpha * scale,
                    -2.0 * cos_w0 * scale,
                    (1.0 - alpha) * scale,
                ])
            }
            FilterDesign::Notch { frequency, q } => {
                let (cos_w0, alpha, scale) = resonant(frequency, q, sample_rate);
                BiquadCoefficients::from_f32([
                    scale,
                    -2.0 * cos_w0 * scale,
                    scale,
                    -2.0 * cos_w0 * scale,
                    (1.0 - alpha) * scale,
                ])
            }
            FilterDesign::LowShelf {
                frequency,
                gain_db,
                slope,
            } => {
                let s = Shelf::new(frequency, gain_db, slope, sample_rate);
                let a = s.a;
                let scale = COEFFICIENT_SCALE / ((a + 1.0) + s.a_minus + s.sin_sq);
                BiquadCoefficients::from_f32([
                    a * ((a + 1.0) - s.a_minus + s.sin_sq) * scale,
                    2.0 * a * ((a - 1.0) - s.a_plus) * scale,
                    a * ((a + 1.0) - s.a_minus - s.sin_sq) * scale,
                    -2.0 * ((a - 1.0) + s.a_plus) * scale,
                    ((a + 1.0) + s.a_minus - s.sin_sq) * scale,
                ])
            }
            FilterDesign::HighShelf {
                frequency,
                gain_db,
                slope,
            } => {
                let s = Shelf::new(frequency, gain_db, slope, sample_rate);
                let a = s.a;
                let scale = COEFFICIENT_SCALE / ((a + 1.0) - s.a_minus + s.sin_sq);
                BiquadCoefficients::from_f32([
                    a * ((a + 1.0) + s.a_minus + s.sin_sq) * scale,
                    -2.0 * a * ((a - 1.0) + s.a_plus) * scale,
                    a * ((a + 1.0) + s.a_minus - s.sin_sq) * scale,
                    2.0 * ((a - 1.0) - s.a_plus) * scale,
                    ((a + 1.0) - s.a_minus - s.sin_sq) * scale,
                ])
            }
        }
    }
}

/// `(cos ω0, α, 32768 / (1 + α))` for the resonant designs.
fn resonant(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32) {
    let w0 = 2.0 * PI * frequency / sample_rate;
    let alpha = libm::sinf(w0) / (2.0 * q);
    (libm::cosf(w0), alpha, COEFFICIENT_SCALE / (1.0 + alpha))
}

struct Shelf {
    a: f32,
    a_minus: f32,
    a_plus: f32,
    sin_sq: f32,
}

impl Shelf {
    fn new(frequency: f32, gain_db: f32, slope: f32, sample_rate: f32) -> Self {
        let a = libm::powf(10.0, gain_db / 40.0);
        let w0 = 2.0 * PI * frequency / sample_rate;
        let cos_w0 = libm::cosf(w0);
        let root = libm::sqrtf((a * a + 1.0) * (1.0 / slope - 1.0) + 2.0 * a);
        Shelf {
            a,
            a_minus: (a - 1.0) * cos_w0,
            a_plus: (a + 1.0) * cos_w0,
            sin_sq: libm::sinf(w0) * root,
        }
    }
}

/// Textbook biquad `{b0, b1, b2, a1, a2}` scaled by 32768 (`a0` is unity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiquadCoefficients {
    pub b0: i32,
    pub b1: i32,
    pub b2: i32,
    pub a1: i32,
    pub a2: i32,
}

impl BiquadCoefficients {
    /// Truncate scaled values toward zero.
    fn from_f32(c: [f32; 5]) -> Self {
        BiquadCoefficients {
            b0: c[0] as i32,
            b1: c[1] as i32,
            b2: c[2] as i32,
            a1: c[3] as i32,
            a2: c[4] as i32,
        }
    }

    /// Hardware form: `N1 = b1 / 2`, `D1 = a1 / −2`, `D2 = −a2`, each clamped
    /// to 16 bits.
    ///
    /// The halving truncates toward zero, so an odd `b1` or `a1` loses its
    /// least significant bit: [`RegisterCoefficients::to_canonical`] gives it
    /// back one LSB closer to zero.
    pub fn to_registers(&self) -> RegisterCoefficients {
        RegisterCoefficients {
            n0: saturate_i16(self.b0),
            n1: saturate_i16(self.b1 / 2),
            n2: saturate_i16(self.b2),
            d1: saturate_i16(self.a1 / -2),
            d2: saturate_i16(-self.a2),
        }
    }
}

/// Coefficients as stored in the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterCoefficients {
    pub n0: i16,
    pub n1: i16,
    pub n2: i16,
    pub d1: i16,
    pub d2: i16,
}

impl RegisterCoefficients {
    /// All-pass, 0 dB response the codec resets to.
    pub const FLAT: RegisterCoefficients = RegisterCoefficients::from_words([
        0x6BE3, 0x9666, 0x675D, 0x7D83, 0x84EE,
    ]);

    /// Build from raw 16-bit register words in `N0, N1, N2, D1, D2` order.
    pub const fn from_words(words: [u16; 5]) -> Self {
        RegisterCoefficients {
            n0: words[0] as i16,
            n1: words[1] as i16,
            n2: words[2] as i16,
            d1: words[3] as i16,
            d2: words[4] as i16,
        }
    }

    /// Undo the hardware transform.
    pub fn to_canonical(&self) -> BiquadCoefficients {
        BiquadCoefficients {
            b0: self.n0 as i32,
            b1: self.n1 as i32 * 2,
            b2: self.n2 as i32,
            a1: self.d1 as i32 * -2,
            a2: -(self.d2 as i32),
        }
    }

    /// `(register, word)` pairs for one channel and stage, N taps first.
    pub fn placements(&self, stage: u8, right: bool) -> [(u8, i16); 5] {
        [
            (n_register(stage, 0, right), self.n0),
            (n_register(stage, 1, right), self.n1),
            (n_register(stage, 2, right), self.n2),
            (d_register(stage, 0, right), self.d1),
            (d_register(stage, 1, right), self.d2),
        ]
    }
}

/// Page 1 MSB register of N tap `index` (0..3) for a DAC effects stage.
pub const fn n_register(stage: u8, index: u8, right: bool) -> u8 {
    let left = reg::P1_DAC_LEFT_BASE + 2 * index + stage * reg::P1_DAC_N_STAGE_SPAN;
    if right {
        left + reg::P1_DAC_RIGHT_OFFSET
    } else {
        left
    }
}

/// Page 1 MSB register of D tap `index` (0..2) for a DAC effects stage.
pub const fn d_register(stage: u8, index: u8, right: bool) -> u8 {
    let left = reg::P1_DAC_D_BASE + 2 * index + stage * reg::P1_DAC_D_STAGE_SPAN;
    if right {
        left + reg::P1_DAC_RIGHT_OFFSET
    } else {
        left
    }
}

/// MSB registers read back by a left-channel dump: stage 0 `N0 N1 N2 D1 D2`
/// then stage 1. Add [`reg::P1_DAC_RIGHT_OFFSET`] for the right channel.
pub const DUMP_ORDER: [u8; 10] = [1, 3, 5, 13, 15, 7, 9, 11, 17, 19];

/// Coefficients read back from one codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterDump {
    pub codec: u8,
    /// Words in [`DUMP_ORDER`], when the left channel was requested.
    pub left: Option<[u16; 10]>,
    pub right: Option<[u16; 10]>,
    /// Digital filter control register.
    pub filter_control: u8,
}

/// ADC one-pole filter `(N0 + N1·z⁻¹) / (32768 − D1·z⁻¹)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnePole {
    pub n0: i16,
    pub n1: i16,
    pub d1: i16,
}

impl OnePole {
    /// DC-blocking high-pass with its corner at `fc` Hz:
    /// `D1 = round(32768 × e^(−2π·fc/fs))`, `N0 = D1`, `N1 = −D1`.
    pub fn highpass(fc: u32, sample_rate: f32) -> Self {
        let fc = fc.min(ADC_HPF_MAX_HZ) as f32;
        let d1 = COEFFICIENT_SCALE * libm::expf(-2.0 * PI * fc / sample_rate) + 0.5;
        let d1 = saturate_i16(d1 as i32);
        OnePole {
            n0: d1,
            n1: -d1,
            d1,
        }
    }

    /// `N0, N1, D1`, MSB first, in register order.
    pub fn bytes(&self) -> [u8; 6] {
        let [n0h, n0l] = self.n0.to_be_bytes();
        let [n1h, n1l] = self.n1.to_be_bytes();
        let [d1h, d1l] = self.d1.to_be_bytes();
        [n0h, n0l, n1h, n1l, d1h, d1l]
    }
}

fn saturate_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: i16, expected: u16, tolerance: i32) -> bool {
        (actual as i32 - expected as i16 as i32).abs() <= tolerance
    }

    #[test]
    fn butterworth_highpass_matches_reference_design() {
        // 200 Hz Butterworth from the vendor's filter design tool.
        let design = FilterDesign::Highpass {
            frequency: 200.0,
            q: core::f32::consts::FRAC_1_SQRT_2,
        };
        let regs = design.coefficients(44_100.0).to_registers();
        assert!(close(regs.n0, 0x7D71, 8), "{regs:?}");
        assert!(close(regs.n1, 0x828F, 8), "{regs:?}");
        assert!(close(regs.n2, 0x7D71, 8), "{regs:?}");
        assert!(close(regs.d1, 0x7D6A, 8), "{regs:?}");
        assert!(close(regs.d2, 0x8510, 8), "{regs:?}");
    }

    #[test]
    fn lowpass_taps_are_symmetric() {
        let c = FilterDesign::Lowpass {
            frequency: 1000.0,
            q: 0.707,
        }
        .coefficients(48_000.0);
        assert_eq!(c.b0, c.b2);
        assert!(c.b1 > 0 && c.a1 < 0);
    }

    #[test]
    fn bandpass_has_no_tap_one() {
        let c = FilterDesign::Bandpass {
            frequency: 1000.0,
            q: 2.0,
        }
        .coefficients(48_000.0);
        assert_eq!(c.b1, 0);
        assert_eq!(c.b0, -c.b2);
    }

    #[test]
    fn zero_gain_shelf_is_flat() {
        for design in [
            FilterDesign::LowShelf {
                frequency: 500.0,
                gain_db: 0.0,
                slope: 1.0,
            },
            FilterDesign::HighShelf {
                frequency: 5000.0,
                gain_db: 0.0,
                slope: 1.0,
            },
        ] {
            let c = design.coefficients(44_100.0);
            // With A = 1 numerator and denominator coincide.
            assert!((c.b0 - 32768).abs() <= 2, "{c:?}");
            assert!((c.b1 - c.a1).abs() <= 2, "{c:?}");
            assert!((c.b2 - c.a2).abs() <= 2, "{c:?}");
        }
    }

    #[test]
    fn register_transform_round_trips() {
        let canonical = BiquadCoefficients {
            b0: 1200,
            b1: -2400,
            b2: 1200,
            a1: -60_000,
            a2: 28_000,
        };
        let regs = canonical.to_registers();
        assert_eq!(regs.n1, -1200);
        assert_eq!(regs.d1, 30_000);
        assert_eq!(regs.d2, -28_000);
        assert_eq!(regs.to_canonical(), canonical);
    }

    #[test]
    fn flat_preset_words() {
        let flat = RegisterCoefficients::FLAT;
        assert_eq!(flat.n0, 0x6BE3);
        assert_eq!(flat.n1 as u16, 0x9666);
        assert_eq!(flat.d2 as u16, 0x84EE);
        assert_eq!(flat.to_canonical().to_registers(), flat);
    }

    #[test]
    fn coefficient_register_layout() {
        let regs = RegisterCoefficients::FLAT.placements(0, false);
        let addresses: [u8; 5] = core::array::from_fn(|i| regs[i].0);
        assert_eq!(addresses, [1, 3, 5, 13, 15]);

        let regs = RegisterCoefficients::FLAT.placements(1, true);
        let addresses: [u8; 5] = core::array::from_fn(|i| regs[i].0);
        assert_eq!(addresses, [33, 35, 37, 43, 45]);
    }

    #[test]
    fn dump_order_matches_layout() {
        for stage in 0..DAC_STAGES {
            let start = stage as usize * 5;
            let placements = RegisterCoefficients::FLAT.placements(stage, false);
            for (i, (register, _)) in placements.iter().enumerate() {
                assert_eq!(DUMP_ORDER[start + i], *register);
            }
        }
    }

    #[test]
    fn one_pole_highpass() {
        // 8 Hz at 44.1 kHz.
        let hpf = OnePole::highpass(8, 44_100.0);
        assert!((hpf.d1 as i32 - 0x7FDB).abs() <= 1, "{hpf:?}");
        assert_eq!(hpf.n0, hpf.d1);
        assert_eq!(hpf.n1, -hpf.d1);

        let bytes = hpf.bytes();
        assert_eq!(i16::from_be_bytes([bytes[2], bytes[3]]), hpf.n1);
    }

    #[test]
    fn one_pole_corner_is_clamped() {
        assert_eq!(OnePole::highpass(0, 48_000.0).d1, i16::MAX);
        assert_eq!(
            OnePole::highpass(20_000, 48_000.0),
            OnePole::highpass(ADC_HPF_MAX_HZ, 48_000.0)
        );
    }
}
