//! Wire formats and frame (de)interleaving.
//!
//! A [`SampleFormat`] describes how one channel's samples sit in the 32-bit
//! DMA words and how they convert to and from the block sample type. The
//! transport engine is written once against this trait.
//!
//! ## Frame layout
//!
//! Frame `j` occupies words `j * W .. (j + 1) * W`, where `W` is
//! [`words_per_frame`]. Channel `c` lives in word `c / SLOTS_PER_WORD` of
//! its frame, at the bit position given by [`SampleFormat::slot_shift`].
//!
//! | Format | Block sample | Slots/word | Max channels | Placement |
//! |--------|--------------|------------|--------------|-----------|
//! | [`Tdm16`] | `i16` | 2 | 16 | even channel in the upper half |
//! | [`Tdm32`] | `f32` | 1 | 8 | full word, normalized by 2³¹−1 |
//! | [`I2s16`] | `i16` | 2 | 2 | left in the lower half |

use crate::block::{AudioBlockMut, AudioBlockRef, Sample};
use crate::constants::AUDIO_BLOCK_SAMPLES;

/// Conversion policy between block samples and wire slots.
pub trait SampleFormat {
    /// Block sample type.
    type Sample: Sample;

    /// Channels packed into one 32-bit DMA word.
    const SLOTS_PER_WORD: usize;

    /// Width of one channel slot on the wire.
    const SLOT_BITS: u32;

    /// Most channels a frame of this format carries.
    const MAX_CHANNELS: usize;

    /// Wire value sent for a channel without a block.
    const SILENCE: u32 = 0;

    /// Left shift of channel `channel` within its word.
    fn slot_shift(channel: usize) -> u32;

    /// Encode a sample as a slot value (low `SLOT_BITS` bits).
    fn to_wire(sample: Self::Sample) -> u32;

    /// Decode a slot value (low `SLOT_BITS` bits) into a sample.
    fn from_wire(slot: u32) -> Self::Sample;
}

/// Number of 32-bit words one frame of `channels` channels occupies.
pub const fn words_per_frame<F: SampleFormat>(channels: usize) -> usize {
    channels.div_ceil(F::SLOTS_PER_WORD)
}

const fn slot_mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// 16 channels of 16-bit samples, two per word.
#[derive(Debug, Clone, Copy)]
pub struct Tdm16;

impl SampleFormat for Tdm16 {
    type Sample = i16;
    const SLOTS_PER_WORD: usize = 2;
    const SLOT_BITS: u32 = 16;
    const MAX_CHANNELS: usize = 16;

    fn slot_shift(channel: usize) -> u32 {
        if channel % 2 == 0 {
            16
        } else {
            0
        }
    }

    fn to_wire(sample: i16) -> u32 {
        sample as u16 as u32
    }

    fn from_wire(slot: u32) -> i16 {
        slot as u16 as i16
    }
}

/// `1 / (2^31 - 1)`: full-scale wire word to ±1.0.
pub const I32_TO_F32_NORM: f32 = 4.656_612_875_245_797e-10;

/// `2^31 - 1`: ±1.0 to full-scale wire word.
pub const F32_TO_I32_NORM: f32 = 2_147_483_647.0;

/// 8 channels of 32-bit samples carried as normalized `f32`.
#[derive(Debug, Clone, Copy)]
pub struct Tdm32;

impl SampleFormat for Tdm32 {
    type Sample = f32;
    const SLOTS_PER_WORD: usize = 1;
    const SLOT_BITS: u32 = 32;
    const MAX_CHANNELS: usize = 8;

    fn slot_shift(_channel: usize) -> u32 {
        0
    }

    /// Scales by 2³¹−1 and saturates to ±(2³¹−1). NaN encodes as zero.
    fn to_wire(sample: f32) -> u32 {
        let scaled = (sample * F32_TO_I32_NORM) as i32;
        scaled.max(-i32::MAX) as u32
    }

    fn from_wire(slot: u32) -> f32 {
        slot as i32 as f32 * I32_TO_F32_NORM
    }
}

/// Stereo 16-bit I2S, left in the lower half of each word.
#[derive(Debug, Clone, Copy)]
pub struct I2s16;

impl SampleFormat for I2s16 {
    type Sample = i16;
    const SLOTS_PER_WORD: usize = 2;
    const SLOT_BITS: u32 = 16;
    const MAX_CHANNELS: usize = 2;

    fn slot_shift(channel: usize) -> u32 {
        if channel == 0 {
            0
        } else {
            16
        }
    }

    fn to_wire(sample: i16) -> u32 {
        sample as u16 as u32
    }

    fn from_wire(slot: u32) -> i16 {
        slot as u16 as i16
    }
}

/// Interleave one block period of every channel into `dest`.
///
/// Channels without a block are filled with [`SampleFormat::SILENCE`].
///
/// # Panics
///
/// Debug-asserts that `dest` holds exactly one block period.
pub fn interleave<F: SampleFormat>(dest: &mut [u32], channels: &[Option<AudioBlockRef<F::Sample>>]) {
    let words = words_per_frame::<F>(channels.len());
    debug_assert_eq!(dest.len(), words * AUDIO_BLOCK_SAMPLES);
    let mask = slot_mask(F::SLOT_BITS);

    for (j, frame) in dest.chunks_exact_mut(words).enumerate() {
        frame.fill(0);
        for (c, block) in channels.iter().enumerate() {
            let slot = match block {
                Some(block) => F::to_wire(block[j]),
                None => F::SILENCE,
            };
            frame[c / F::SLOTS_PER_WORD] |= (slot & mask) << F::slot_shift(c);
        }
    }
}

/// Split one block period from `src` into the per-channel blocks.
///
/// Missing blocks are skipped; their samples are dropped.
///
/// # Panics
///
/// Debug-asserts that `src` holds exactly one block period.
pub fn deinterleave<F: SampleFormat>(src: &[u32], channels: &mut [Option<AudioBlockMut<F::Sample>>]) {
    let words = words_per_frame::<F>(channels.len());
    debug_assert_eq!(src.len(), words * AUDIO_BLOCK_SAMPLES);
    let mask = slot_mask(F::SLOT_BITS);

    for (j, frame) in src.chunks_exact(words).enumerate() {
        for (c, block) in channels.iter_mut().enumerate() {
            if let Some(block) = block {
                let word = frame[c / F::SLOTS_PER_WORD];
                block[j] = F::from_wire((word >> F::slot_shift(c)) & mask);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::pool::leaked_pool;

    fn ramp_i16(start: i16) -> AudioBlockRef<i16> {
        let mut block = AudioBlockMut::alloc_from(leaked_pool()).unwrap();
        for (i, s) in block.iter_mut().enumerate() {
            *s = start.wrapping_add(i as i16);
        }
        block.into_shared()
    }

    fn constant_f32(value: f32) -> AudioBlockRef<f32> {
        let mut block = AudioBlockMut::alloc_from(leaked_pool()).unwrap();
        block.fill(value);
        block.into_shared()
    }

    #[test]
    fn frame_widths() {
        assert_eq!(words_per_frame::<Tdm16>(16), 8);
        assert_eq!(words_per_frame::<Tdm16>(3), 2);
        assert_eq!(words_per_frame::<Tdm32>(8), 8);
        assert_eq!(words_per_frame::<I2s16>(2), 1);
    }

    #[test]
    fn tdm16_puts_even_channel_high() {
        let channels = [Some(ramp_i16(100)), Some(ramp_i16(-5))];
        let mut buf = [0u32; AUDIO_BLOCK_SAMPLES];
        interleave::<Tdm16>(&mut buf, &channels);

        assert_eq!(buf[0], (100u32 << 16) | (-5i16 as u16 as u32));
        assert_eq!((buf[9] >> 16) as i16, 109);
        assert_eq!(buf[9] as i16, 4);
    }

    #[test]
    fn missing_channel_is_silence() {
        let channels = [None, Some(ramp_i16(1)), None];
        let mut buf = [0xFFFF_FFFFu32; AUDIO_BLOCK_SAMPLES * 2];
        interleave::<Tdm16>(&mut buf, &channels);

        for frame in buf.chunks_exact(2) {
            assert_eq!(frame[0] >> 16, 0);
            assert_eq!(frame[1], 0);
        }
        assert_eq!(buf[0] & 0xFFFF, 1);
    }

    #[test]
    fn i2s16_keeps_left_low() {
        let channels = [Some(ramp_i16(10)), Some(ramp_i16(1000))];
        let mut buf = [0u32; AUDIO_BLOCK_SAMPLES];
        interleave::<I2s16>(&mut buf, &channels);
        assert_eq!(buf[0] as i16, 10);
        assert_eq!((buf[0] >> 16) as i16, 1000);
    }

    #[test]
    fn tdm32_scales_and_saturates() {
        assert_eq!(Tdm32::to_wire(0.0), 0);
        assert_eq!(Tdm32::to_wire(1.0) as i32, i32::MAX);
        assert_eq!(Tdm32::to_wire(4.0) as i32, i32::MAX);
        assert_eq!(Tdm32::to_wire(-4.0) as i32, -i32::MAX);
        assert_eq!(Tdm32::to_wire(f32::NAN), 0);
        assert_eq!(Tdm32::to_wire(0.5) as i32, 1 << 30);
    }

    #[test]
    fn tdm32_decodes_full_scale() {
        assert!((Tdm32::from_wire(i32::MAX as u32) - 1.0).abs() < 1e-6);
        assert!((Tdm32::from_wire((-i32::MAX) as u32) + 1.0).abs() < 1e-6);
        assert_eq!(Tdm32::from_wire(0), 0.0);
    }

    #[test]
    fn deinterleave_fills_present_blocks() {
        let pool = leaked_pool::<f32>();
        let mut src = [0u32; AUDIO_BLOCK_SAMPLES * 2];
        for frame in src.chunks_exact_mut(2) {
            frame[0] = (1i32 << 30) as u32;
            frame[1] = (-(1i32 << 29)) as u32;
        }
        let mut blocks = [
            Some(AudioBlockMut::alloc_from(pool).unwrap()),
            Some(AudioBlockMut::alloc_from(pool).unwrap()),
        ];
        deinterleave::<Tdm32>(&src, &mut blocks);

        let first = blocks[0].as_ref().unwrap();
        let second = blocks[1].as_ref().unwrap();
        assert!((first[127] - 0.5).abs() < 1e-6);
        assert!((second[0] + 0.25).abs() < 1e-6);
    }

    #[test]
    fn interleave_then_deinterleave_sixteen_channels() {
        let pool = leaked_pool::<i16>();
        let channels: [Option<AudioBlockRef<i16>>; 16] =
            core::array::from_fn(|c| Some(ramp_i16(c as i16 * 1000 - 8000)));
        let mut ring = [0u32; AUDIO_BLOCK_SAMPLES * 8];
        interleave::<Tdm16>(&mut ring, &channels);

        let mut blocks: [Option<AudioBlockMut<i16>>; 16] =
            core::array::from_fn(|_| AudioBlockMut::alloc_from(pool));
        deinterleave::<Tdm16>(&ring, &mut blocks);

        for (sent, received) in channels.iter().zip(blocks.iter()) {
            assert_eq!(&sent.as_ref().unwrap()[..], &received.as_ref().unwrap()[..]);
        }
    }
}
