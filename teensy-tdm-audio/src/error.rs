//! Error and status types.
//!
//! Nothing in this crate panics on hardware trouble. Single-target codec
//! operations return [`BusError`]; operations that may fan out over several
//! codecs return a [`Report`] listing every codec that failed, so one dead
//! board never stops the rest from being configured.

use core::fmt;

use crate::config::TransportMode;

/// A configuration setting that was corrected during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// More than one codec needs TDM; the requested mode was replaced.
    TdmForced { codecs: u8, requested: TransportMode },
    /// The codec count was outside `1..=16`.
    CodecCountClamped { requested: u8, used: u8 },
    /// More codecs than slot pairs in one frame at this sample length.
    FrameFull { requested: u8, used: u8, bits: u8 },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::TdmForced { codecs, requested } => write!(
                f,
                "{codecs} codecs require TDM, mode {requested:?} changed to DspTdm"
            ),
            ConfigWarning::CodecCountClamped { requested, used } => {
                write!(f, "codec count {requested} out of range, using {used}")
            }
            ConfigWarning::FrameFull { requested, used, bits } => write!(
                f,
                "{requested} codecs do not fit a frame at {bits} bits, using {used}"
            ),
        }
    }
}

/// Transport engine lifecycle and setup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The DMA ring does not hold exactly two block periods.
    BufferLength { expected: usize, actual: usize },
    /// The channel count does not fit the sample format's frame.
    ChannelCount { channels: usize, max: usize },
    /// Lifecycle step called out of order.
    InvalidState,
    /// The serial audio port rejected its configuration.
    Port,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::BufferLength { expected, actual } => {
                write!(f, "DMA ring holds {actual} words, expected {expected}")
            }
            TransportError::ChannelCount { channels, max } => {
                write!(f, "{channels} channels requested, format carries at most {max}")
            }
            TransportError::InvalidState => f.write_str("transport lifecycle step out of order"),
            TransportError::Port => f.write_str("serial audio port configuration failed"),
        }
    }
}

#[cfg(feature = "aic3104")]
pub use codec_errors::*;

#[cfg(feature = "aic3104")]
mod codec_errors {
    use core::fmt;

    use embedded_hal::i2c::ErrorKind;
    use heapless::Vec;

    use crate::constants::MAX_CODECS;

    /// A failed register or mux transaction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BusError {
        /// The codec index is beyond what the discovered muxes can reach.
        NotProvisioned { codec: u8 },
        /// A mux control write was not acknowledged.
        Mux { address: u8, kind: ErrorKind },
        /// A codec register transfer did not complete.
        Transfer { codec: u8, kind: ErrorKind },
    }

    impl BusError {
        /// `true` for targets that are simply not fitted.
        pub fn is_absent(&self) -> bool {
            matches!(self, BusError::NotProvisioned { .. })
        }
    }

    impl fmt::Display for BusError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                BusError::NotProvisioned { codec } => write!(f, "codec {codec} is not provisioned"),
                BusError::Mux { address, kind } => {
                    write!(f, "mux 0x{address:02X} write failed: {kind}")
                }
                BusError::Transfer { codec, kind } => {
                    write!(f, "codec {codec} transfer failed: {kind}")
                }
            }
        }
    }

    /// One codec that could not be configured.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CodecFailure {
        pub codec: u8,
        pub error: BusError,
    }

    /// Outcome of an operation applied to one or more codecs.
    #[must_use]
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct Report {
        failures: Vec<CodecFailure, MAX_CODECS>,
        skipped: Vec<u8, MAX_CODECS>,
    }

    impl Report {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fold one codec's result into the report.
        ///
        /// Absent hardware is recorded as skipped, not failed.
        pub fn record(&mut self, codec: u8, result: Result<(), BusError>) {
            match result {
                Ok(()) => {}
                Err(error) if error.is_absent() => {
                    if !self.skipped.contains(&codec) {
                        let _ = self.skipped.push(codec);
                    }
                }
                Err(error) => {
                    if !self.failures.iter().any(|f| f.codec == codec) {
                        let _ = self.failures.push(CodecFailure { codec, error });
                    }
                }
            }
        }

        /// `true` when no reachable codec failed.
        pub fn is_ok(&self) -> bool {
            self.failures.is_empty()
        }

        pub fn failures(&self) -> &[CodecFailure] {
            &self.failures
        }

        /// Codecs beyond the discovered hardware.
        pub fn skipped(&self) -> &[u8] {
            &self.skipped
        }

        pub fn into_result(self) -> Result<(), Report> {
            if self.is_ok() {
                Ok(())
            } else {
                Err(self)
            }
        }
    }

    impl fmt::Display for Report {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            if self.failures.is_empty() {
                return f.write_str("all codecs ok");
            }
            f.write_str("failed codecs:")?;
            for failure in &self.failures {
                write!(f, " {}", failure.codec)?;
            }
            Ok(())
        }
    }

}
