//! Adaptive z-score normalizer.

use cadence_core::average::MovingStats;
use cadence_core::map::constrain;

use crate::tick::Tick;
use crate::unit::{MovingFilterUnit, TimeWindowed, Unit};

/// Default target mean of normalized values.
pub const NORMALIZER_DEFAULT_MEAN: f32 = 0.5;
/// Default target standard deviation of normalized values.
pub const NORMALIZER_DEFAULT_STD_DEV: f32 = 0.15;

/// Renormalizes its input on the run, using exponential moving estimates
/// of the input's own mean and standard deviation:
/// `output = (input − mean)/stddev × target_stddev + target_mean`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    stats: MovingStats,
    target_mean: f32,
    target_std_dev: f32,
    clamp_n_std_dev: Option<f32>,
    calibrating: bool,
    value: f32,
    sample_rate: f32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Normalizer around mean 0.5, standard deviation 0.15, infinite
    /// window.
    pub fn new() -> Self {
        Self::with_targets(NORMALIZER_DEFAULT_MEAN, NORMALIZER_DEFAULT_STD_DEV)
    }

    /// Normalizer with the default targets over a finite window (seconds).
    pub fn with_time_window(seconds: f32) -> Self {
        let mut normalizer = Self::new();
        normalizer.set_time_window(seconds);
        normalizer
    }

    /// Normalizer with custom target mean and standard deviation.
    pub fn with_targets(mean: f32, std_dev: f32) -> Self {
        Self {
            stats: MovingStats::new(),
            target_mean: mean,
            target_std_dev: std_dev.abs(),
            clamp_n_std_dev: None,
            calibrating: true,
            value: mean,
            sample_rate: f32::MAX,
        }
    }

    /// Sets the target mean.
    pub fn set_target_mean(&mut self, mean: f32) {
        self.target_mean = mean;
    }

    /// Returns the target mean.
    pub fn target_mean(&self) -> f32 {
        self.target_mean
    }

    /// Sets the target standard deviation.
    pub fn set_target_std_dev(&mut self, std_dev: f32) {
        self.target_std_dev = std_dev.abs();
    }

    /// Returns the target standard deviation.
    pub fn target_std_dev(&self) -> f32 {
        self.target_std_dev
    }

    /// Clamps outputs to ±`n_std_dev` target deviations around the target
    /// mean. `None` disables clamping.
    pub fn set_clamp_std_dev(&mut self, n_std_dev: Option<f32>) {
        self.clamp_n_std_dev = n_std_dev.map(f32::abs);
    }

    /// Re-seeds with prior estimates of the input's mean and standard
    /// deviation.
    pub fn reset_to(&mut self, mean: f32, std_dev: f32) {
        self.stats.reset_to(mean, std_dev.abs());
        self.value = self.target_mean;
    }

    /// Input value below which a sample counts as a low outlier.
    pub fn low_outlier_threshold(&self, n_std_dev: f32) -> f32 {
        self.stats.mean() - n_std_dev.abs() * self.stats.std_dev()
    }

    /// Input value above which a sample counts as a high outlier.
    pub fn high_outlier_threshold(&self, n_std_dev: f32) -> f32 {
        self.stats.mean() + n_std_dev.abs() * self.stats.std_dev()
    }

    /// True if the raw value is an outlier against the input statistics.
    pub fn is_outlier(&self, value: f32, n_std_dev: f32) -> bool {
        self.stats.is_outlier(value, n_std_dev)
    }

    /// Mean of the input stream seen so far.
    pub fn input_mean(&self) -> f32 {
        self.stats.mean()
    }

    /// Standard deviation of the input stream seen so far.
    pub fn input_std_dev(&self) -> f32 {
        self.stats.std_dev()
    }

    fn apply(&self, value: f32) -> f32 {
        let out = self
            .stats
            .normalize_to(value, self.target_mean, self.target_std_dev);
        match self.clamp_n_std_dev {
            Some(n) => {
                let spread = n * self.target_std_dev;
                constrain(out, self.target_mean - spread, self.target_mean + spread)
            }
            None => out,
        }
    }
}

impl Unit for Normalizer {
    fn begin(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn put(&mut self, value: f32) -> f32 {
        if self.calibrating {
            self.stats.update(value, self.sample_rate);
        }
        self.value = self.apply(value);
        self.value
    }
}

impl TimeWindowed for Normalizer {
    fn set_time_window(&mut self, seconds: f32) {
        self.stats.set_time_window(seconds);
    }

    fn time_window(&self) -> f32 {
        self.stats.time_window()
    }

    fn infinite_time_window(&mut self) {
        self.stats.infinite_time_window();
    }

    fn time_window_is_infinite(&self) -> bool {
        self.stats.time_window_is_infinite()
    }
}

impl MovingFilterUnit for Normalizer {
    fn reset(&mut self) {
        self.stats.reset();
        self.value = self.target_mean;
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

    fn feed(normalizer: &mut Normalizer, values: impl Iterator<Item = f32>, rate: f32) {
        let mut rng = SmallRng::seed_from_u64(11);
        for (i, v) in values.enumerate() {
            normalizer.put(v);
            let mut tick = Tick::new(i as f64 / rate as f64, rate, i as u32, &mut rng);
            normalizer.step(&mut tick);
        }
    }

    #[test]
    fn first_sample_maps_to_target_mean() {
        let mut normalizer = Normalizer::new();
        assert!((normalizer.put(123.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn renormalizes_a_biased_stream() {
        let mut normalizer = Normalizer::new();
        let mut rng = SmallRng::seed_from_u64(5);
        // Input centered on 10 with spread 2.
        let values: Vec<f32> = (0..5000)
            .map(|_| 10.0 + (rng.random::<f32>() - 0.5) * 4.0)
            .collect();
        feed(&mut normalizer, values.into_iter(), 100.0);
        // Output of the mean input value sits at the target mean.
        let out = normalizer.put(10.0);
        assert!((out - 0.5).abs() < 0.05, "out={out}");
        assert!((normalizer.input_mean() - 10.0).abs() < 0.1);
    }

    #[test]
    fn clamped_output_stays_in_band() {
        let mut normalizer = Normalizer::new();
        normalizer.set_clamp_std_dev(Some(2.0));
        normalizer.reset_to(0.0, 1.0);
        let out = normalizer.put(1000.0);
        let max = 0.5 + 2.0 * NORMALIZER_DEFAULT_STD_DEV;
        assert!(out <= max + 1e-6, "out={out}");
    }

    #[test]
    fn outlier_thresholds_bracket_the_mean(){
        let mut normalizer = Normalizer::new();
        normalizer.reset_to(5.0, 2.0);
        assert!((normalizer.low_outlier_threshold(1.5) - 2.0).abs() < 1e-5);
        assert!((normalizer.high_outlier_threshold(1.5) - 8.0).abs() < 1e-5);
    }

    #[test]
    fn paused_calibration_stops_learning() {
        let mut normalizer = Normalizer::new();
        normalizer.reset_to(0.0, 1.0);
        normalizer.pause_calibrating();
        for _ in 0..100 {
            normalizer.put(50.0);
        }
        // Statistics untouched: mean still at the prior.
        assert!((normalizer.input_mean() - 0.0).abs() < 1e-6);
    }
}
