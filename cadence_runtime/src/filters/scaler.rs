//! Adaptive quantile scaler (per-step Robbins–Monro updates).

use cadence_core::average::{apply_update, moving_average_alpha};
use cadence_core::map::{constrain01, map_to_01_clamped};

use crate::filters::StepAggregate;
use crate::tick::Tick;
use crate::unit::{MovingFilterUnit, TimeWindowed, Unit};

/// Default quantile span (fraction of probability mass covered).
pub const SCALER_DEFAULT_SPAN: f32 = 0.99;

// Lowest allowed quantile level (avoids the ill-defined zero quantile).
const MINIMUM_QUANTILE_LEVEL: f32 = 1e-4;

// Floor on the Robbins–Monro step scale.
const MINIMUM_ETA_SCALE: f32 = 1e-5;

/// Rescales its input into [0, 1] by tracking a low/high quantile pair
/// with stochastic (Robbins–Monro) updates, applied once per step on the
/// per-step mean. Robust to outliers; `low ≤ high` always holds.
#[derive(Debug, Clone, Copy)]
pub struct Scaler {
    time_window: f32,
    quantile_level: f32,
    low_quantile: f32,
    high_quantile: f32,
    mean_value: f32,
    agg: StepAggregate,
    n_samples: u32,
    pre_initialized: bool,
    calibrating: bool,
    value: f32,
    sample_rate: f32,
}

impl Default for Scaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scaler {
    /// Scaler with an infinite window and the default span.
    pub fn new() -> Self {
        Self::with_span(-1.0, SCALER_DEFAULT_SPAN)
    }

    /// Scaler over a finite adaptation window (seconds).
    pub fn with_time_window(seconds: f32) -> Self {
        Self::with_span(seconds, SCALER_DEFAULT_SPAN)
    }

    /// Scaler with a custom window and quantile span.
    pub fn with_span(time_window: f32, span: f32) -> Self {
        let mut scaler = Self {
            time_window: -1.0,
            quantile_level: MINIMUM_QUANTILE_LEVEL,
            low_quantile: f32::MAX,
            high_quantile: -f32::MAX,
            mean_value: 0.5,
            agg: StepAggregate::default(),
            n_samples: 0,
            pre_initialized: false,
            calibrating: true,
            value: 0.5,
            sample_rate: f32::MAX,
        };
        scaler.set_time_window(time_window);
        scaler.set_span(span);
        scaler
    }

    /// Sets the span (in [0, 1]) of probability mass the quantile pair
    /// covers.
    pub fn set_span(&mut self, span: f32) {
        self.quantile_level = (0.5 * (1.0 - constrain01(span))).max(MINIMUM_QUANTILE_LEVEL);
    }

    /// Returns the current span.
    pub fn span(&self) -> f32 {
        1.0 - 2.0 * self.quantile_level
    }

    /// Current low quantile estimate.
    pub fn low_quantile(&self) -> f32 {
        self.low_quantile
    }

    /// Current high quantile estimate.
    pub fn high_quantile(&self) -> f32 {
        self.high_quantile
    }

    /// Re-seeds with a prior estimate of the input range.
    pub fn reset_range(&mut self, min_value: f32, max_value: f32) {
        self.reset();
        let (min_value, max_value) = if min_value <= max_value {
            (min_value, max_value)
        } else {
            (max_value, min_value)
        };
        self.low_quantile = min_value;
        self.high_quantile = max_value;
        self.mean_value = 0.5 * (min_value + max_value);
        self.pre_initialized = true;
    }

    fn alpha(&self) -> f32 {
        constrain01(moving_average_alpha(
            self.sample_rate,
            self.time_window,
            self.n_samples,
            self.pre_initialized,
        ))
    }

    fn update_quantile(q: &mut f32, level: f32, eta: f32, x: f32) {
        let indicator = if x <= *q { 1.0 } else { 0.0 };
        *q += eta * (level - indicator);
    }
}

impl Unit for Scaler {
    fn begin(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
        if !self.calibrating {
            self.agg.finish_step();
            return;
        }
        // Run once a sample has ever arrived; idle steps repeat the last
        // step mean.
        if self.agg.is_empty() && self.n_samples == 0 {
            return;
        }
        let x = self.agg.mean();
        self.agg.finish_step();

        let alpha = self.alpha();
        apply_update(&mut self.mean_value, x, alpha);

        // Rescale the step from the inter-quantile range to the full span.
        let scale = ((self.high_quantile - self.mean_value).abs()
            + (self.mean_value - self.low_quantile).abs())
            / (1.0 + f32::EPSILON - 2.0 * self.quantile_level);
        let eta = alpha * scale.max(MINIMUM_ETA_SCALE);

        Self::update_quantile(&mut self.low_quantile, self.quantile_level, eta, x);
        Self::update_quantile(&mut self.high_quantile, 1.0 - self.quantile_level, eta, x);

        if self.low_quantile > self.high_quantile {
            let mid = 0.5 * (self.low_quantile + self.high_quantile);
            self.low_quantile = mid;
            self.high_quantile = mid;
        }

        self.n_samples = self.n_samples.saturating_add(1);
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn put(&mut self, value: f32) -> f32 {
        if self.calibrating {
            if !self.pre_initialized && self.n_samples == 0 && self.agg.is_empty() {
                self.low_quantile = value;
                self.high_quantile = value;
                self.mean_value = value;
            }
            self.agg.put(value);
        }
        self.value = map_to_01_clamped(value, self.low_quantile, self.high_quantile);
        self.value
    }
}

impl TimeWindowed for Scaler {
    fn set_time_window(&mut self, seconds: f32) {
        self.time_window = if seconds < 0.0 { -1.0 } else { seconds };
    }

    fn time_window(&self) -> f32 {
        self.time_window
    }

    fn infinite_time_window(&mut self) {
        self.time_window = -1.0;
    }

    fn time_window_is_infinite(&self) -> bool {
        self.time_window < 0.0
    }
}

impl MovingFilterUnit for Scaler {
    fn reset(&mut self) {
        self.low_quantile = f32::MAX;
        self.high_quantile = -f32::MAX;
        self.mean_value = 0.5;
        self.value = 0.5;
        self.agg.reset();
        self.n_samples = 0;
        self.pre_initialized = false;
    }

    fn pause_calibrating(&mut self) {
        self.calibrating = false;
    }

    fn resume_calibrating(&mut self) {
        self.calibrating = true;
    }

    fn is_calibrating(&self) -> bool {
        self.calibrating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn run_step(scaler: &mut Scaler, i: u32, rate: f32) {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut tick = Tick::new(i as f64 / rate as f64, rate, i, &mut rng);
        scaler.step(&mut tick);
    }

    #[test]
    fn first_sample_maps_to_midpoint() {
        let mut scaler = Scaler::new();
        assert!((scaler.put(42.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn quantiles_stay_ordered_under_random_input() {
        let mut scaler = Scaler::with_time_window(0.5);
        let mut rng = SmallRng::seed_from_u64(99);
        for i in 0..5000u32 {
            let v = (rng.random::<f32>() - 0.5) * 20.0;
            scaler.put(v);
            if rng.random::<f32>() < 0.3 {
                scaler.put(v * 2.0); // occasional extra sub-sample
            }
            run_step(&mut scaler, i, 100.0);
            assert!(
                scaler.low_quantile() <= scaler.high_quantile(),
                "step {i}: low={} high={}",
                scaler.low_quantile(),
                scaler.high_quantile()
            );
        }
    }

    #[test]
    fn uniform_stream_spreads_quantiles() {
        let mut scaler = Scaler::new();
        let mut rng = SmallRng::seed_from_u64(7);
        for i in 0..20_000u32 {
            scaler.put(rng.random::<f32>() * 10.0);
            run_step(&mut scaler, i, 100.0);
        }
        // Quantile pair should approximate the [0, 10] span.
        assert!(scaler.low_quantile() < 2.0, "low={}", scaler.low_quantile());
        assert!(scaler.high_quantile() > 8.0, "high={}", scaler.high_quantile());
        // Midpoint input lands near mid-scale, extremes near the edges.
        assert!((scaler.put(5.0) - 0.5).abs() < 0.2);
        assert!(scaler.put(0.0) < 0.2);
        assert!(scaler.put(10.0) > 0.8);
    }

    #[test]
    fn seeded_range_maps_midpoint_to_half() {
        let mut scaler = Scaler::new();
        scaler.reset_range(0.0, 10.0);
        let mut out = 0.0;
        for i in 0..2000u32 {
            out = scaler.put(5.0);
            run_step(&mut scaler, i, 100.0);
        }
        assert!((out - 0.5).abs() < 0.05, "out={out}");
    }

    #[test]
    fn paused_calibration_freezes_quantiles() {
        let mut scaler = Scaler::new();
        scaler.reset_range(0.0, 1.0);
        scaler.pause_calibrating();
        for i in 0..100u32 {
            scaler.put(500.0);
            run_step(&mut scaler, i, 100.0);
        }
        assert_eq!(scaler.low_quantile(), 0.0);
        assert_eq!(scaler.high_quantile(), 1.0);
        // Still filters through the frozen quantiles.
        assert_eq!(scaler.put(500.0), 1.0);
    }
}
