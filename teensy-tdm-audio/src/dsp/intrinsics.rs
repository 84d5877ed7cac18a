//! Saturating fixed-point primitives for the mixing paths.
//!
//! On Cortex-M4/M7 with the DSP extension `saturate16` is a single `SSAT`;
//! elsewhere (host tests included) a plain clamp does the same job.

/// Clamp an `i32` to the `i16` range.
#[inline(always)]
pub fn saturate16(val: i32) -> i16 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "ssat {out}, #16, {val}",
                out = out(reg) out,
                val = in(reg) val,
            );
        }
        out as i16
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        val.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}

/// `sample × gain / 65536` for a Q16.16 gain, saturated to `i32`.
///
/// The product is formed in 64 bits so gains far above unity cannot wrap.
#[inline(always)]
pub fn mul_q16(sample: i32, gain: i32) -> i32 {
    let product = (sample as i64 * gain as i64) >> 16;
    product.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturate16_clamps_both_ends() {
        assert_eq!(saturate16(40_000), i16::MAX);
        assert_eq!(saturate16(-40_000), i16::MIN);
        assert_eq!(saturate16(-1234), -1234);
    }

    #[test]
    fn mul_q16_unity_and_half() {
        assert_eq!(mul_q16(12_345, 65_536), 12_345);
        assert_eq!(mul_q16(-10_000, 32_768), -5_000);
    }

    #[test]
    fn mul_q16_never_wraps() {
        assert_eq!(mul_q16(i32::MAX, i32::MAX), i32::MAX);
        assert_eq!(mul_q16(i32::MIN, i32::MAX), i32::MIN);
    }
}
