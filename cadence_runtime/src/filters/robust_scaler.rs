//! Outlier-robust quantile scaler (per-put Robbins–Monro updates).

use cadence_core::average::{apply_update, moving_average_alpha, MovingAverage};
use cadence_core::map::{constrain01, map_to_01_clamped};

use crate::filters::StepAggregate;
use crate::tick::Tick;
use crate::unit::{MovingFilterUnit, TimeWindowed, Unit};

/// Default quantile span (fraction of probability mass covered).
pub const ROBUST_SCALER_DEFAULT_SPAN: f32 = 0.99;

// Lowest allowed quantile level (avoids the ill-defined zero quantile).
const MINIMUM_QUANTILE_LEVEL: f32 = 1e-4;
const MAXIMUM_QUANTILE_LEVEL: f32 = 0.5;

// Number of standard deviations covering the full signal range.
const STDDEV_TO_RANGE: f32 = 6.0;

// Floor on the Robbins–Monro step size.
const MINIMUM_ETA: f32 = 1e-5;

// Cheap inverse normal CDF for 0 < p < 1.
fn normal_quantile_fast(p: f32) -> f32 {
    if p <= 0.0 {
        return -6.0;
    }
    if p >= 1.0 {
        return 6.0;
    }
    let x = 2.0 * p - 1.0;
    1.4142 * x * (1.0 + 0.147 * x * x)
}

/// Rescales its input into [0, 1] by nudging a low/high quantile pair on
/// every `put()` (Robbins–Monro), with the step size scaled by a running
/// estimate of the signal's deviation. Compared to [`crate::filters::Scaler`]
/// it reacts per sample instead of per step, prevents overshooting past the
/// sample, and supports a Gaussian-prior range seeding. `low ≤ high`
/// always holds.
#[derive(Debug, Clone, Copy)]
pub struct RobustScaler {
    time_window: f32,
    quantile_level: f32,
    low_quantile: f32,
    high_quantile: f32,
    std_dev: MovingAverage,
    dev_agg: StepAggregate,
    step_alpha: f32,
    n_samples: u32,
    pre_initialized: bool,
    calibrating: bool,
    value: f32,
    sample_rate: f32,
}

impl Default for RobustScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl RobustScaler {
    /// Scaler with an infinite window and the default span.
    pub fn new() -> Self {
        Self::with_span(-1.0, ROBUST_SCALER_DEFAULT_SPAN)
    }

    /// Scaler over a finite adaptation window (seconds).
    pub fn with_time_window(seconds: f32) -> Self {
        Self::with_span(seconds, ROBUST_SCALER_DEFAULT_SPAN)
    }

    /// Scaler with a custom window and quantile span.
    pub fn with_span(time_window: f32, span: f32) -> Self {
        let mut scaler = Self {
            time_window: -1.0,
            quantile_level: MINIMUM_QUANTILE_LEVEL,
            low_quantile: 0.5,
            high_quantile: 0.5,
            std_dev: MovingAverage::new(),
            dev_agg: StepAggregate::default(),
            step_alpha: 1.0,
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
        self.quantile_level =
            ((1.0 - constrain01(span)) * MAXIMUM_QUANTILE_LEVEL).max(MINIMUM_QUANTILE_LEVEL);
    }

    /// Returns the current span.
    pub fn span(&self) -> f32 {
        if self.quantile_level <= MINIMUM_QUANTILE_LEVEL {
            1.0
        } else {
            1.0 - 2.0 * self.quantile_level
        }
    }

    /// Sets the low quantile level in [0, 0.5]; the high level becomes
    /// its complement.
    pub fn set_low_quantile_level(&mut self, level: f32) {
        let level = level.clamp(0.0, MAXIMUM_QUANTILE_LEVEL);
        self.quantile_level = level.max(MINIMUM_QUANTILE_LEVEL);
    }

    /// Low quantile level.
    pub fn low_quantile_level(&self) -> f32 {
        self.quantile_level
    }

    /// High quantile level (complement of the low one).
    pub fn high_quantile_level(&self) -> f32 {
        1.0 - self.quantile_level
    }

    /// Current low quantile estimate.
    pub fn low_quantile(&self) -> f32 {
        self.low_quantile
    }

    /// Current high quantile estimate.
    pub fn high_quantile(&self) -> f32 {
        self.high_quantile
    }

    /// Re-seeds with a prior estimate of the mean value.
    pub fn reset_mean(&mut self, estimated_mean: f32) {
        self.reset();
        self.low_quantile = estimated_mean;
        self.high_quantile = estimated_mean;
        self.pre_initialized = true;
    }

    /// Re-seeds with a prior estimate of the input range, assumed to span
    /// ±3σ of a Gaussian: the quantile pair starts at the positions the
    /// configured levels would have under that prior.
    pub fn reset_range(&mut self, estimated_min: f32, estimated_max: f32) {
        self.reset();
        let (min_value, max_value) = if estimated_min <= estimated_max {
            (estimated_min, estimated_max)
        } else {
            (estimated_max, estimated_min)
        };

        if min_value == max_value {
            self.low_quantile = min_value;
            self.high_quantile = min_value;
        } else {
            let mean = 0.5 * (min_value + max_value);
            let std_dev = (max_value - min_value) / STDDEV_TO_RANGE;

            // Map the quantile level onto the ±3σ truncated support.
            const PHI_NEG_3: f32 = 0.001_349_898;
            const PHI_POS_3: f32 = 0.998_650_1;
            let p_low = PHI_NEG_3 + self.quantile_level * (PHI_POS_3 - PHI_NEG_3);
            let variation = std_dev * normal_quantile_fast(p_low);

            self.low_quantile = mean + variation;
            self.high_quantile = mean - variation;
        }
        self.std_dev
            .reset_to((max_value - min_value) / STDDEV_TO_RANGE);
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
}

impl Unit for RobustScaler {
    fn begin(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
        if !self.calibrating {
            self.dev_agg.finish_step();
            return;
        }
        let alpha = self.alpha();
        self.dev_agg.finish_step();

        // Finite window: decay the quantiles toward their midpoint so the
        // range can re-tighten.
        if !self.time_window_is_infinite() {
            let mid = 0.5 * (self.low_quantile + self.high_quantile);
            apply_update(&mut self.low_quantile, mid, alpha);
            apply_update(&mut self.high_quantile, mid, alpha);
        }

        self.n_samples = self.n_samples.saturating_add(1);
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn put(&mut self, value: f32) -> f32 {
        if self.calibrating {
            let alpha = self.alpha();

            if !self.pre_initialized && self.n_samples == 0 && self.dev_agg.is_empty() {
                self.low_quantile = value;
                self.high_quantile = value;
            }

            // Deviation from the quantile midpoint estimates the signal's
            // spread; folded per step like any other filter statistic.
            let mid = 0.5 * (self.low_quantile + self.high_quantile);
            let deviation = (value - mid).abs();
            if self.dev_agg.is_empty() {
                self.step_alpha = alpha;
                self.dev_agg.put(deviation);
                self.std_dev.update(self.dev_agg.mean(), self.step_alpha);
            } else {
                let previous = self.dev_agg.put(deviation);
                self.std_dev
                    .amend(previous, self.dev_agg.mean(), self.step_alpha);
            }

            // Robbins–Monro step, rescaled from deviation to full range.
            let eta = alpha.max(MINIMUM_ETA) * STDDEV_TO_RANGE * self.std_dev.get();
            let eta_level = eta * self.quantile_level;

            if value <= self.low_quantile {
                self.low_quantile -= eta - eta_level;
                self.high_quantile -= eta_level;
                // Prevent overshooting past the sample.
                self.low_quantile = self.low_quantile.max(value);
                self.high_quantile = self.high_quantile.max(value);
            } else if value <= self.high_quantile {
                self.low_quantile += eta_level;
                self.high_quantile -= eta_level;
                self.low_quantile = self.low_quantile.min(value);
                self.high_quantile = self.high_quantile.max(value);
            } else {
                self.low_quantile += eta_level;
                self.high_quantile += eta - eta_level;
                self.low_quantile = self.low_quantile.min(value);
                self.high_quantile = self.high_quantile.min(value);
            }

            if self.low_quantile > self.high_quantile {
                let mid = 0.5 * (self.low_quantile + self.high_quantile);
                self.low_quantile = mid;
                self.high_quantile = mid;
            }
        }

        self.value = map_to_01_clamped(value, self.low_quantile, self.high_quantile);
        self.value
    }
}

impl TimeWindowed for RobustScaler {
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

impl MovingFilterUnit for RobustScaler {
    fn reset(&mut self) {
        self.low_quantile = 0.5;
        self.high_quantile = 0.5;
        self.value = 0.5;
        self.std_dev.reset();
        self.dev_agg.reset();
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
