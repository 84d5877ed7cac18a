//! Construction-time configuration.
//!
//! Everything here is fixed before streaming starts. [`AudioConfig`] is
//! shared by the codec array (register encodings, slot offsets, PLL presets)
//! and the transport engine (frame layout, clock dividers).

use crate::constants::{FRAME_BIT_CLOCKS, MAX_CODECS};
use crate::error::ConfigWarning;

/// Supported sample rates: the 44.1 kHz and 48 kHz families and their doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRate {
    Hz44100,
    Hz48000,
    Hz88200,
    Hz96000,
}

impl SampleRate {
    /// Map a requested rate onto the nearest family.
    ///
    /// Rates divisible by 8000 use the 48 kHz base, everything else the
    /// 44.1 kHz base. Rates above 48 kHz select the dual-rate variant.
    pub const fn from_hz(hz: u32) -> Self {
        let base_48k = hz % 8000 == 0;
        let dual = hz > 48_000;
        match (base_48k, dual) {
            (true, false) => SampleRate::Hz48000,
            (true, true) => SampleRate::Hz96000,
            (false, false) => SampleRate::Hz44100,
            (false, true) => SampleRate::Hz88200,
        }
    }

    pub const fn hz(self) -> u32 {
        match self {
            SampleRate::Hz44100 => 44_100,
            SampleRate::Hz48000 => 48_000,
            SampleRate::Hz88200 => 88_200,
            SampleRate::Hz96000 => 96_000,
        }
    }

    /// `true` for the 48 kHz family.
    pub const fn is_base_48k(self) -> bool {
        matches!(self, SampleRate::Hz48000 | SampleRate::Hz96000)
    }

    /// `true` for the doubled rates.
    pub const fn is_dual_rate(self) -> bool {
        matches!(self, SampleRate::Hz88200 | SampleRate::Hz96000)
    }
}

/// Serial word length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLength {
    Bits16,
    Bits20,
    Bits24,
    Bits32,
}

impl SampleLength {
    pub const fn bits(self) -> u8 {
        match self {
            SampleLength::Bits16 => 16,
            SampleLength::Bits20 => 20,
            SampleLength::Bits24 => 24,
            SampleLength::Bits32 => 32,
        }
    }

    /// Two-bit word length code used by the codec's interface register.
    pub const fn word_code(self) -> u8 {
        match self {
            SampleLength::Bits16 => 0,
            SampleLength::Bits20 => 1,
            SampleLength::Bits24 => 2,
            SampleLength::Bits32 => 3,
        }
    }
}

/// Serial audio interface mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    I2s,
    /// DSP mode, used for TDM with one slot pair per codec.
    DspTdm,
    RightJustified,
    LeftJustified,
}

impl TransportMode {
    pub const fn code(self) -> u8 {
        match self {
            TransportMode::I2s => 0,
            TransportMode::DspTdm => 1,
            TransportMode::RightJustified => 2,
            TransportMode::LeftJustified => 3,
        }
    }

    pub const fn is_tdm(self) -> bool {
        matches!(self, TransportMode::DspTdm)
    }
}

/// Where the codecs take their sample clock from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// MCLK from the host drives the codec clock divider directly.
    Mclk,
    /// The codec's internal PLL multiplies a reference clock.
    Pll,
}

/// Diagnostic verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Off,
    /// One line per operation.
    Basic,
    /// Every register transaction.
    Detailed,
}

impl Verbosity {
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Off,
            1 => Verbosity::Basic,
            _ => Verbosity::Detailed,
        }
    }
}

/// How the control bus reaches the codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// One codec wired straight to the bus, no muxes.
    Direct,
    /// Codecs sit behind one 4-channel mux per board.
    Multiplexed,
}

/// Settle delays around bus traffic, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTiming {
    /// Wait before switching muxes so the last transaction has finished.
    pub transfer_settle_us: u32,
    /// Wait after each mux control write.
    pub mux_settle_us: u32,
    /// Bus free time between probe attempts.
    pub probe_gap_us: u32,
}

impl BusTiming {
    pub const fn new() -> Self {
        BusTiming {
            transfer_settle_us: 0,
            mux_settle_us: 0,
            probe_gap_us: 2,
        }
    }
}

impl Default for BusTiming {
    fn default() -> Self {
        Self::new()
    }
}

/// Board and stream configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    pub codecs: u8,
    pub sample_length: SampleLength,
    pub sample_rate: SampleRate,
    pub mode: TransportMode,
    pub clock: ClockSource,
    pub topology: Topology,
    pub verbosity: Verbosity,
    pub timing: BusTiming,
    /// Re-sync the codec's ADC/DAC on group delay drift.
    pub resync: bool,
    /// Slot shift applied to codec 0, for testing later slots.
    pub first_slot: u8,
}

impl AudioConfig {
    /// Defaults: 16-bit I2S at 44.1 kHz, MCLK clocking, codecs behind muxes.
    pub const fn new(codecs: u8) -> Self {
        AudioConfig {
            codecs,
            sample_length: SampleLength::Bits16,
            sample_rate: SampleRate::Hz44100,
            mode: TransportMode::I2s,
            clock: ClockSource::Mclk,
            topology: Topology::Multiplexed,
            verbosity: Verbosity::Off,
            timing: BusTiming::new(),
            resync: false,
            first_slot: 0,
        }
    }

    pub const fn with_sample_length(mut self, length: SampleLength) -> Self {
        self.sample_length = length;
        self
    }

    pub const fn with_sample_rate(mut self, rate: SampleRate) -> Self {
        self.sample_rate = rate;
        self
    }

    pub const fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }

    pub const fn with_clock(mut self, clock: ClockSource) -> Self {
        self.clock = clock;
        self
    }

    pub const fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub const fn with_timing(mut self, timing: BusTiming) -> Self {
        self.timing = timing;
        self
    }

    pub const fn with_resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }

    /// Resolve conflicting settings.
    ///
    /// The codec count is clamped to `1..=16`, and more than one codec
    /// forces DSP/TDM mode since I2S carries a single stereo pair. The
    /// count is then limited to the slot pairs one frame can carry at the
    /// configured sample length. The last correction applied is returned
    /// for the diagnostic stream.
    pub fn validated(mut self) -> (Self, Option<ConfigWarning>) {
        let mut warning = None;
        let clamped = self.codecs.clamp(1, MAX_CODECS as u8);
        if clamped != self.codecs {
            warning = Some(ConfigWarning::CodecCountClamped {
                requested: self.codecs,
                used: clamped,
            });
            self.codecs = clamped;
        }
        if self.codecs > 1 && !self.mode.is_tdm() {
            warning = Some(ConfigWarning::TdmForced {
                codecs: self.codecs,
                requested: self.mode,
            });
            self.mode = TransportMode::DspTdm;
        }
        let capacity = self.frame_capacity();
        if self.codecs > capacity {
            warning = Some(ConfigWarning::FrameFull {
                requested: self.codecs,
                used: capacity,
                bits: self.sample_length.bits(),
            });
            self.codecs = capacity;
        }
        (self, warning)
    }

    fn slot_position(&self, codec: u8) -> u32 {
        let tdm_shift = if self.mode.is_tdm() { 1 } else { 0 };
        codec as u32 * 2 * self.sample_length.bits() as u32 + self.first_slot as u32 + tdm_shift
    }

    /// Number of codecs whose slot pairs fit in one frame.
    ///
    /// A frame is [`FRAME_BIT_CLOCKS`] bit clocks long and every pair must
    /// start at an offset the codec's 8-bit offset register can hold.
    pub fn frame_capacity(&self) -> u8 {
        let pair = 2 * self.sample_length.bits() as u32;
        let mut fits = 0u8;
        while (fits as usize) < MAX_CODECS
            && (fits as u32 + 1) * pair <= FRAME_BIT_CLOCKS
            && self.slot_position(fits) <= u8::MAX as u32
        {
            fits += 1;
        }
        fits.max(1)
    }

    /// Bit-clock offset of a codec's first slot within the TDM frame.
    ///
    /// Each codec carries two channels of `sample_length` bits. In TDM the
    /// frame sync precedes the first slot by one bit clock. `None` when the
    /// codec's pair lies beyond the frame.
    pub fn slot_offset(&self, codec: u8) -> Option<u8> {
        if codec >= self.frame_capacity() {
            return None;
        }
        u8::try_from(self.slot_position(codec)).ok()
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new(1)
    }
}
