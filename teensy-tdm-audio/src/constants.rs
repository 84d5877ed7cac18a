/// Number of samples per audio block, for every sample type.
pub const AUDIO_BLOCK_SAMPLES: usize = 128;

/// Number of audio blocks in each sample type's pool.
pub const POOL_SIZE: usize = 64;

/// Number of 32-bit words in a pool's allocation bitmap.
pub const POOL_BITMAP_WORDS: usize = POOL_SIZE.div_ceil(32);

/// Maximum number of codecs reachable through the mux tree.
pub const MAX_CODECS: usize = 16;

/// Bit clocks in one TDM frame, the span the codec slot offset covers.
pub const FRAME_BIT_CLOCKS: u32 = 256;

/// Codecs (and mux channels) per expansion board.
pub const CODECS_PER_BOARD: u8 = 4;

/// Highest number of muxes the probe will look for.
pub const MUX_MAX: usize = 8;

/// First mux address scanned by the probe.
pub const MUX_BASE_ADDRESS: u8 = 0x70;

/// 7-bit I2C address shared by every TLV320AIC3104.
pub const AIC3104_I2C_ADDRESS: u8 = 0x18;

/// Frequency of the i.MX RT audio PLL reference oscillator.
pub const AUDIO_PLL_REFERENCE_HZ: u32 = 24_000_000;
