//! Crosspoint mixer: every input to every output with its own gain.

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::constants::AUDIO_BLOCK_SAMPLES;
use crate::dsp::{mul_q16, saturate16};
use crate::node::AudioNode;

/// Q16.16 unity gain.
pub const UNITY_GAIN: i32 = 65536;

/// Largest gain magnitude accepted by [`AudioMixerMatrix::gain`].
const MAX_GAIN: f32 = 32767.0;

/// `IN` inputs mixed into `OUT` outputs.
///
/// Output `o` is the saturated sum over inputs `i` of
/// `input[i] × gain[i][o] / 65536`. Absent inputs are silent; an output
/// whose block could not be allocated is skipped.
///
/// # Example
/// ```ignore
/// let mut matrix = AudioMixerMatrix::<8, 2>::new();
/// matrix.gain(0, 1, 0.5); // input 0 at half level into output 1
/// ```
pub struct AudioMixerMatrix<const IN: usize, const OUT: usize> {
    /// `[input][output]`, Q16.16.
    multiplier: [[i32; OUT]; IN],
}

impl<const IN: usize, const OUT: usize> AudioMixerMatrix<IN, OUT> {
    /// Every crosspoint at unity.
    pub const fn new() -> Self {
        AudioMixerMatrix {
            multiplier: [[UNITY_GAIN; OUT]; IN],
        }
    }

    /// Set the gain from `input` to `output`, clamped to ±32767.
    /// Out-of-range channel indices are ignored.
    pub fn gain(&mut self, input: usize, output: usize, level: f32) {
        if input >= IN || output >= OUT {
            return;
        }
        let level = level.clamp(-MAX_GAIN, MAX_GAIN);
        self.multiplier[input][output] = (level * UNITY_GAIN as f32) as i32;
    }

    /// Q16.16 gain of one crosspoint.
    pub fn multiplier(&self, input: usize, output: usize) -> Option<i32> {
        self.multiplier.get(input)?.get(output).copied()
    }
}

impl<const IN: usize, const OUT: usize> Default for AudioMixerMatrix<IN, OUT> {
    fn default() -> Self {
        Self::new()
    }
}

/// Saturating `dst += src × mult`.
fn add_with_gain(dst: &mut [i16; AUDIO_BLOCK_SAMPLES], src: &[i16; AUDIO_BLOCK_SAMPLES], mult: i32) {
    if mult == UNITY_GAIN {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = d.saturating_add(s);
        }
    } else {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            let gained = saturate16(mul_q16(s as i32, mult));
            *d = d.saturating_add(gained);
        }
    }
}

impl<const IN: usize, const OUT: usize> AudioNode for AudioMixerMatrix<IN, OUT> {
    type Sample = i16;

    const NUM_INPUTS: usize = IN;
    const NUM_OUTPUTS: usize = OUT;

    fn update(&mut self, inputs: &[Option<AudioBlockRef>], outputs: &mut [Option<AudioBlockMut>]) {
        for (output, slot) in outputs.iter_mut().take(OUT).enumerate() {
            let Some(out) = slot.as_mut() else {
                continue;
            };
            out.fill(0);
            for (input, block) in inputs.iter().take(IN).enumerate() {
                let Some(block) = block else {
                    continue;
                };
                let mult = self.multiplier[input][output];
                if mult != 0 {
                    add_with_gain(out, block, mult);
                }
            }
        }
    }
}
