//! Triangle / sawtooth wave.

use cadence_core::easing::EasingFn;
use cadence_core::fixed::{fixed32_div, phase32_to_f32, Phase32, PHASE32_MAX};

use crate::events::EventKind;
use crate::osc::wave::{wave_surface, WaveCore, DEFAULT_SKEW};
use crate::tick::Tick;
use crate::unit::{Timeable, Unit};

/// Triangle wave: linear rise to the skew point, then linear fall. A skew
/// of 1 gives a rising sawtooth, 0 a falling one. Rise and fall edges can
/// each carry an optional easing curve.
#[derive(Debug, Clone, Copy)]
pub struct TriangleWave {
    wave: WaveCore,
    rise_easing: Option<EasingFn>,
    fall_easing: Option<EasingFn>,
    value: f32,
}

impl Default for TriangleWave {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TriangleWave {
    /// Triangle wave with the given period (seconds), symmetric.
    pub fn new(period: f32) -> Self {
        Self::with_skew(period, DEFAULT_SKEW)
    }

    /// Triangle wave with the given period (seconds) and skew in [0, 1].
    pub fn with_skew(period: f32, skew: f32) -> Self {
        let mut triangle = Self {
            wave: WaveCore::new(period, skew),
            rise_easing: None,
            fall_easing: None,
            value: 0.0,
        };
        triangle.refresh();
        triangle
    }

    /// Applies an easing curve to the rising edge.
    pub fn set_rise_easing(&mut self, easing: Option<EasingFn>) {
        self.rise_easing = easing;
        self.refresh();
    }

    /// Applies an easing curve to the falling edge.
    pub fn set_fall_easing(&mut self, easing: Option<EasingFn>) {
        self.fall_easing = easing;
        self.refresh();
    }

    fn sample(&self, t: Phase32) -> f32 {
        let skew32 = self.wave.skew32();
        if t <= skew32 {
            let ramp = fixed32_div(t, skew32);
            match self.rise_easing {
                None => self.wave.amplified_fixed(ramp),
                Some(ease) => self.wave.amplified_float(ease(phase32_to_f32(ramp))),
            }
        } else {
            let ramp = fixed32_div(PHASE32_MAX - t, PHASE32_MAX - skew32);
            match self.fall_easing {
                None => self.wave.amplified_fixed(ramp),
                Some(ease) => self.wave.amplified_float(ease(phase32_to_f32(ramp))),
            }
        }
    }
}

wave_surface!(TriangleWave);

impl Unit for TriangleWave {
    fn begin(&mut self, _tick: &mut Tick) {
        self.start();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.wave.advance(tick);
        self.refresh();
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        kind == EventKind::Bang && self.passed_cycle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::easing::ease_in_quad;

    #[test]
    fn rises_then_falls() {
        let triangle = TriangleWave::with_skew(1.0, 0.5);
        assert!(triangle.at_phase(0.0) < 1e-3);
        assert!((triangle.at_phase(0.25) - 0.5).abs() < 1e-3);
        assert!((triangle.at_phase(0.5) - 1.0).abs() < 1e-3);
        assert!((triangle.at_phase(0.75) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn full_skew_is_a_sawtooth() {
        let triangle = TriangleWave::with_skew(1.0, 1.0);
        assert!((triangle.at_phase(0.25) - 0.25).abs() < 1e-3);
        assert!((triangle.at_phase(0.75) - 0.75).abs() < 1e-3);
    }

    #[test]
    fn rise_easing_bends_the_edge() {
        let mut triangle = TriangleWave::with_skew(1.0, 1.0);
        triangle.set_rise_easing(Some(ease_in_quad));
        // Quadratic easing sits below the linear ramp mid-rise.
        assert!((triangle.at_phase(0.5) - 0.25).abs() < 1e-3);
        // Fall edge untouched (there is none at skew 1).
        triangle.set_rise_easing(None);
        assert!((triangle.at_phase(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn amplitude_scales_about_midpoint() {
        let mut triangle = TriangleWave::new(1.0);
        triangle.set_amplitude(0.5);
        assert!((triangle.at_phase(0.5) - 0.75).abs() < 1e-3);
        assert!((triangle.at_phase(0.0) - 0.25).abs() < 1e-3);
    }

    #[test]
    fn steps_track_phase() {
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let mut triangle = TriangleWave::new(1.0);
        triangle.start();
        let mut rng = SmallRng::seed_from_u64(0);
        // Quarter period at 100 Hz.
        for i in 0..25u32 {
            let mut tick = Tick::new(i as f64 * 0.01, 100.0, i, &mut rng);
            triangle.step(&mut tick);
        }
        assert!((triangle.value() - 0.5).abs() < 0.05, "value={}", triangle.value());
    }
}
