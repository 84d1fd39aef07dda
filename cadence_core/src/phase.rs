//! Phase-accumulator stepping.
//!
//! A cycle is a full trip of a [`Phase32`] through its 32-bit range. The
//! accumulator is advanced once per step by a fraction derived from the
//! oscillation period and the sample rate; the unsigned overflow (or
//! underflow, when moving backwards) of that addition is the authoritative
//! "cycle completed" signal consumed by every periodic unit. Fixed-point
//! phase avoids float drift over long runtimes and makes the cycle boundary
//! a cheap carry check instead of an epsilon comparison.

use crate::fixed::{phase32_from_f32, Phase32, PHASE32_MAX};
use crate::map::wrap01;

/// Seconds-per-minute conversion for BPM parameters.
pub const HZ_TO_BPM: f32 = 60.0;
/// Inverse of [`HZ_TO_BPM`].
pub const BPM_TO_HZ: f32 = 1.0 / 60.0;

/// Safe reciprocal: `1/x`, with `f32::MAX` standing in for 1/0.
#[inline]
pub fn invert(x: f32) -> f32 {
    if x == 0.0 { f32::MAX } else { 1.0 / x }
}

/// Converts a period in seconds to a frequency in Hz.
#[inline]
pub fn period_to_frequency(period: f32) -> f32 {
    invert(period)
}

/// Converts a frequency in Hz to a period in seconds.
#[inline]
pub fn frequency_to_period(frequency: f32) -> f32 {
    invert(frequency)
}

/// Converts a time offset in seconds to a phase fraction of the period.
#[inline]
pub fn time_to_phase(period: f32, time: f32) -> f32 {
    if period == 0.0 { 0.0 } else { time / period }
}

/// Converts a time offset and a frequency to a phase fraction.
#[inline]
pub fn frequency_and_time_to_phase(frequency: f32, time: f32) -> f32 {
    time * frequency
}

// Carry/borrow detection shared by both update paths.
#[inline]
fn phase32_step(phase: &mut Phase32, increment: Phase32, forward: bool) -> bool {
    if forward {
        let overflow = increment > PHASE32_MAX - *phase;
        *phase = phase.wrapping_add(increment);
        overflow
    } else {
        let underflow = increment > *phase;
        *phase = phase.wrapping_sub(increment);
        underflow
    }
}

/// Advances the accumulator for one step at the given period and sample
/// rate. Returns true exactly when the phase wrapped (cycle completed).
/// A zero effective period counts as an immediate wrap.
#[inline]
pub fn phase32_update(phase: &mut Phase32, period: f32, sample_rate: f32, forward: bool) -> bool {
    let samples_per_cycle = period * sample_rate;
    if samples_per_cycle == 0.0 {
        true
    } else {
        phase32_step(phase, phase32_from_f32(1.0 / samples_per_cycle), forward)
    }
}

/// Hot-path variant taking `delta_scale = Δt·2³²` premultiplied by the
/// engine, so each oscillator pays one multiply per step.
#[inline]
pub fn phase32_update_scaled(
    phase: &mut Phase32,
    frequency: f32,
    delta_scale: f32,
    forward: bool,
) -> bool {
    let inc = (frequency * delta_scale).round();
    let inc = if inc >= PHASE32_MAX as f32 {
        PHASE32_MAX
    } else if inc <= 0.0 {
        0
    } else {
        inc as Phase32
    };
    phase32_step(phase, inc, forward)
}

/// Applies a phase offset (fraction of a period, wrapped into [0, 1))
/// outside the per-step update path.
#[inline]
pub fn phase32_add_phase(phase: Phase32, shift: f32) -> Phase32 {
    phase.wrapping_add(phase32_from_f32(wrap01(shift)))
}

/// Applies a time offset (seconds) outside the per-step update path.
#[inline]
pub fn phase32_add_time(phase: Phase32, period: f32, time: f32) -> Phase32 {
    phase32_add_phase(phase, time_to_phase(period, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_zero_is_sentinel() {
        assert_eq!(invert(0.0), f32::MAX);
        assert_eq!(invert(2.0), 0.5);
        assert_eq!(period_to_frequency(0.25), 4.0);
    }

    #[test]
    fn zero_period_always_wraps() {
        let mut p: Phase32 = 12345;
        assert!(phase32_update(&mut p, 0.0, 100.0, true));
        assert!(phase32_update(&mut p, 1.0, 0.0, true));
    }

    #[test]
    fn overflow_once_per_cycle() {
        // Period 0.1 s at 100 Hz: one wrap every 10 calls, ±1 for rounding.
        let mut phase: Phase32 = 0;
        let mut wraps = 0;
        for _ in 0..1000 {
            if phase32_update(&mut phase, 0.1, 100.0, true) {
                wraps += 1;
            }
        }
        assert!((99..=101).contains(&wraps), "wraps={wraps}");
    }

    #[test]
    fn overflow_cadence_long_period() {
        let mut phase: Phase32 = 0;
        let mut wraps = 0;
        for _ in 0..10_000 {
            if phase32_update(&mut phase, 2.0, 50.0, true) {
                wraps += 1;
            }
        }
        // 10_000 steps / 100 steps-per-cycle.
        assert!((99..=101).contains(&wraps), "wraps={wraps}");
    }

    #[test]
    fn underflow_when_reversed() {
        let mut phase: Phase32 = 10;
        // Large backward increment must underflow right away.
        assert!(phase32_update(&mut phase, 0.5, 2.0, false));
    }

    #[test]
    fn scaled_update_matches_direct() {
        let sample_rate = 250.0f32;
        let period = 0.5f32;
        let delta_scale = (1.0 / sample_rate) * 2.0f32.powi(32);

        let mut a: Phase32 = 0;
        let mut b: Phase32 = 0;
        let mut wraps_a = 0;
        let mut wraps_b = 0;
        for _ in 0..5000 {
            if phase32_update(&mut a, period, sample_rate, true) {
                wraps_a += 1;
            }
            if phase32_update_scaled(&mut b, period_to_frequency(period), delta_scale, true) {
                wraps_b += 1;
            }
        }
        assert!((wraps_a as i32 - wraps_b as i32).abs() <= 1);
    }

    #[test]
    fn add_phase_wraps_negative_shifts() {
        let p: Phase32 = 0x4000_0000; // 0.25
        let shifted = phase32_add_phase(p, -0.25);
        // -0.25 ≡ +0.75: lands near 0 (mod 2^32).
        assert!(shifted < 1 << 16 || shifted > u32::MAX - (1 << 16), "shifted={shifted}");
    }

    #[test]
    fn add_time_uses_period() {
        let p: Phase32 = 0;
        let shifted = phase32_add_time(p, 2.0, 1.0); // half a period
        let err = (shifted as i64 - (1i64 << 31)).abs();
        assert!(err < 1 << 12, "shifted={shifted}");
    }
}
