//! q0.32 unsigned fixed-point values.
//!
//! A [`Phase32`] represents a fraction in [0, 1) as the full range of a
//! `u32`. Arithmetic on it is modular: addition wraps, and the wraparound
//! itself is meaningful (see [`crate::phase`]). Conversions from `f32` are
//! saturating on both ends.

use static_assertions::const_assert_eq;

use crate::map::constrain01;

/// Position within one cycle, as a q0.32 unsigned fixed-point fraction.
pub type Phase32 = u32;

/// Largest representable fraction (just below 1.0).
pub const PHASE32_MAX: Phase32 = u32::MAX;

/// The 0.5 midpoint.
pub const PHASE32_HALF: Phase32 = 0x8000_0000;

/// Reciprocal of [`PHASE32_MAX`], for fixed-to-float conversion.
pub const INV_PHASE32_MAX: f32 = 1.0 / PHASE32_MAX as f32;

const_assert_eq!(core::mem::size_of::<Phase32>(), 4);
const_assert_eq!(PHASE32_HALF, 1u32 << 31);

/// Converts a float in [0, 1] to q0.32, saturating outside that range.
#[inline]
pub fn phase32_from_f32(x: f32) -> Phase32 {
    if x <= 0.0 {
        0
    } else if x >= 1.0 {
        PHASE32_MAX
    } else {
        // x * (PHASE32_MAX + 1), written to stay in f32 range.
        (x + x * PHASE32_MAX as f32) as Phase32
    }
}

/// Converts a q0.32 value back to a float in [0, 1].
#[inline]
pub fn phase32_to_f32(x: Phase32) -> f32 {
    constrain01(x as f32 * INV_PHASE32_MAX)
}

/// Fixed-point fraction division: `x / y` in q0.32, saturating.
#[inline]
pub fn fixed32_div(x: Phase32, y: Phase32) -> Phase32 {
    if y == 0 {
        if x == 0 { 0 } else { PHASE32_MAX }
    } else {
        let q = ((x as u64) << 32) / y as u64;
        q.min(PHASE32_MAX as u64) as Phase32
    }
}

/// Fixed-point fraction multiplication: `x * y` in q0.32.
#[inline]
pub fn fixed32_mul(x: Phase32, y: Phase32) -> Phase32 {
    ((x as u64 * y as u64) >> 32) as Phase32
}

/// Scales a fixed-point signal centered at [`PHASE32_HALF`] by a fixed-point
/// amplitude, keeping the result centered.
#[inline]
pub fn amplify_phase32(x: Phase32, amplitude: Phase32) -> Phase32 {
    // Shift to signed range around zero.
    let centered = (x ^ PHASE32_HALF) as i32;

    // Apply amplitude scaling (64-bit intermediate keeps the full range).
    let scaled = ((centered as i64 * amplitude as i64) >> 32) as i32;

    // Back to the unsigned range.
    (scaled as u32) ^ PHASE32_HALF
}

/// Scales a float signal centered at 0.5 by a fixed-point amplitude.
#[inline]
pub fn amplify_f32(x: f32, amplitude: Phase32) -> f32 {
    phase32_to_f32(amplitude) * (x - 0.5) + 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f32_saturates() {
        assert_eq!(phase32_from_f32(-0.5), 0);
        assert_eq!(phase32_from_f32(0.0), 0);
        assert_eq!(phase32_from_f32(1.0), PHASE32_MAX);
        assert_eq!(phase32_from_f32(2.0), PHASE32_MAX);
    }

    #[test]
    fn from_f32_midpoint() {
        let half = phase32_from_f32(0.5);
        let err = (half as i64 - PHASE32_HALF as i64).abs();
        // Within float rounding of the exact midpoint.
        assert!(err < 512, "half={half} err={err}");
    }

    #[test]
    fn roundtrip_within_float_precision() {
        for &x in &[0.0f32, 0.125, 0.25, 0.5, 0.75, 0.999, 1.0] {
            let back = phase32_to_f32(phase32_from_f32(x));
            assert!((back - x).abs() < 1e-6, "x={x} back={back}");
        }
    }

    #[test]
    fn div_saturates() {
        assert_eq!(fixed32_div(0, 0), 0);
        assert_eq!(fixed32_div(1, 0), PHASE32_MAX);
        assert_eq!(fixed32_div(PHASE32_MAX, PHASE32_MAX), PHASE32_MAX);
        // 0.25 / 0.5 = 0.5
        let q = fixed32_div(1 << 30, 1 << 31);
        assert_eq!(q, 1 << 31);
    }

    #[test]
    fn mul_fractions() {
        // 0.5 * 0.5 = 0.25
        let p = fixed32_mul(PHASE32_HALF, PHASE32_HALF);
        assert_eq!(p, 1 << 30);
    }

    #[test]
    fn amplify_full_keeps_signal() {
        for &x in &[0u32, 1 << 30, PHASE32_HALF, 3 << 30, PHASE32_MAX] {
            let y = amplify_phase32(x, PHASE32_MAX);
            let diff = (y as i64 - x as i64).abs();
            assert!(diff < 4, "x={x} y={y}");
        }
    }

    #[test]
    fn amplify_zero_collapses_to_midpoint() {
        assert_eq!(amplify_phase32(0, 0), PHASE32_HALF);
        assert_eq!(amplify_phase32(PHASE32_MAX, 0), PHASE32_HALF);
    }

    #[test]
    fn amplify_half_halves_excursion() {
        let y = amplify_phase32(PHASE32_MAX, PHASE32_HALF);
        let expected = PHASE32_HALF as u64 + (PHASE32_HALF as u64) / 2;
        let diff = (y as i64 - expected as i64).abs();
        assert!(diff < 4, "y={y}");
    }

    #[test]
    fn amplify_f32_midpoint_fixed() {
        let v = amplify_f32(0.5, PHASE32_HALF);
        assert!((v - 0.5).abs() < 1e-6);
        let v = amplify_f32(1.0, PHASE32_HALF);
        assert!((v - 0.75).abs() < 1e-3);
    }
}
