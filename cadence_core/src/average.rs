//! Exponential moving average machinery.
//!
//! The update rule is always `value += α·(new − value)`; everything else is
//! the policy that chooses α. For a finite time window the filter behaves
//! like a cumulative mean until roughly `window × sample_rate` samples have
//! been seen (so the first samples are not overweighted), then settles on
//! the standard EMA constant `2/(n+1)`. A pre-initialized filter skips the
//! cumulative phase: its seed is treated as if it had already stabilized.

use crate::map::constrain01;

/// Sentinel for an unbounded time window.
pub const INFINITE_TIME_WINDOW: f32 = -1.0;

/// Sentinel for no smoothing at all.
pub const NO_TIME_WINDOW: f32 = 0.0;

/// A pre-initialized value over an infinite window is treated as if it had
/// stabilized over this many seconds of samples.
pub const PRE_INITIALIZED_STABILIZATION_TIME: f32 = 60.0;

/// Applies a single update on `running` with mixing factor `alpha`.
#[inline]
pub fn apply_update(running: &mut f32, new_value: f32, alpha: f32) {
    *running += alpha * (new_value - *running);
}

/// Amends the latest update, replacing `previous` with `new_value`.
/// Must be called with the same `alpha` as the update being amended.
#[inline]
pub fn amend_update(running: &mut f32, previous: f32, new_value: f32, alpha: f32) {
    *running += alpha * (new_value - previous);
}

/// Returns the value a single update would produce, without mutating.
#[inline]
pub fn compute_update(mut running: f32, new_value: f32, alpha: f32) -> f32 {
    apply_update(&mut running, new_value, alpha);
    running
}

/// Standard EMA constant over `n` samples: `2/(n+1)`, capped at 1.
#[inline]
pub fn exponential_alpha(n_samples: f32) -> f32 {
    if n_samples > 1.0 {
        2.0 / (n_samples + 1.0)
    } else {
        1.0
    }
}

/// Cumulative-mean constant after `n` samples: `1/(n+1)`.
#[inline]
pub fn simple_alpha(n_samples: u32) -> f32 {
    1.0 / (n_samples as f32 + 1.0)
}

/// Full alpha policy from sample rate, time window, sample count, and
/// whether the filter was seeded with a prior value.
pub fn moving_average_alpha(
    sample_rate: f32,
    time_window: f32,
    n_samples: u32,
    pre_initialized: bool,
) -> f32 {
    if time_window >= 0.0 {
        // Finite time window.
        let n_target = time_window * sample_rate;
        if pre_initialized {
            exponential_alpha(n_target)
        } else if (n_samples as f32 + 1.0) < n_target {
            // Cumulative mean while the window fills up.
            simple_alpha(n_samples)
        } else {
            exponential_alpha(n_target)
        }
    } else {
        // Infinite time window.
        if pre_initialized {
            let n_stabilized = sample_rate * PRE_INITIALIZED_STABILIZATION_TIME;
            if (n_samples as f32) <= n_stabilized {
                exponential_alpha(n_stabilized)
            } else {
                simple_alpha(n_samples)
            }
        } else {
            // Simple average over all values.
            simple_alpha(n_samples)
        }
    }
}

/// An exponential moving average with the alpha policy above.
///
/// The never-updated state is an explicit flag: the first sample after a
/// reset seeds the running value exactly instead of blending.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverage {
    value: f32,
    time_window: f32,
    n_samples: u32,
    started: bool,
    pre_initialized: bool,
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl MovingAverage {
    /// Creates an average with an infinite time window.
    pub fn new() -> Self {
        Self {
            value: 0.0,
            time_window: INFINITE_TIME_WINDOW,
            n_samples: 0,
            started: false,
            pre_initialized: false,
        }
    }

    /// Creates an average over the given time window (seconds).
    pub fn with_time_window(seconds: f32) -> Self {
        let mut avg = Self::new();
        avg.set_time_window(seconds);
        avg
    }

    /// Clears all state; the next update seeds the value.
    pub fn reset(&mut self) {
        self.n_samples = 0;
        self.started = false;
        self.pre_initialized = false;
    }

    /// Resets to a prior estimate, treated as already stabilized.
    pub fn reset_to(&mut self, initial_value: f32) {
        self.reset();
        self.value = initial_value;
        self.started = true;
        self.pre_initialized = true;
    }

    /// Sets the time window to infinite.
    pub fn infinite_time_window(&mut self) {
        self.time_window = INFINITE_TIME_WINDOW;
    }

    /// Changes the time window (seconds). Negative values mean infinite.
    pub fn set_time_window(&mut self, seconds: f32) {
        self.time_window = if seconds < 0.0 {
            INFINITE_TIME_WINDOW
        } else {
            seconds
        };
    }

    /// Returns the time window (seconds).
    pub fn time_window(&self) -> f32 {
        self.time_window
    }

    /// Returns true if the time window is infinite.
    pub fn time_window_is_infinite(&self) -> bool {
        self.time_window == INFINITE_TIME_WINDOW
    }

    /// Sets the window from a cutoff frequency (Hz); zero or negative
    /// disables (infinite window).
    pub fn set_cutoff(&mut self, hz: f32) {
        if hz <= 0.0 {
            self.infinite_time_window();
        } else {
            self.set_time_window(1.0 / hz);
        }
    }

    /// Returns the cutoff frequency (Hz), 0 when infinite.
    pub fn cutoff(&self) -> f32 {
        if self.time_window_is_infinite() {
            0.0
        } else {
            1.0 / self.time_window
        }
    }

    /// Mixing factor for the current state at the given sample rate.
    pub fn alpha(&self, sample_rate: f32) -> f32 {
        constrain01(moving_average_alpha(
            sample_rate,
            self.time_window,
            self.n_samples,
            self.pre_initialized,
        ))
    }

    /// Updates with an externally supplied alpha; returns the new value.
    pub fn update(&mut self, new_value: f32, alpha: f32) -> f32 {
        if self.started {
            apply_update(&mut self.value, new_value, alpha);
        } else {
            self.value = new_value;
            self.started = true;
        }
        self.n_samples = self.n_samples.saturating_add(1);
        self.value
    }

    /// Updates computing alpha from the sample rate; returns the new value.
    pub fn update_with_rate(&mut self, new_value: f32, sample_rate: f32) -> f32 {
        let alpha = self.alpha(sample_rate);
        self.update(new_value, alpha)
    }

    /// Amends the latest update (same alpha as when it was applied).
    pub fn amend(&mut self, previous_value: f32, new_value: f32, alpha: f32) {
        amend_update(&mut self.value, previous_value, new_value, alpha);
    }

    /// Applies a raw correction to the running value.
    pub fn delta(&mut self, d: f32) {
        self.value += d;
    }

    /// Current value. Undefined before the first update or seed.
    pub fn get(&self) -> f32 {
        self.value
    }

    /// Returns true once a sample or seed has been absorbed.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of samples since the last reset.
    pub fn n_samples(&self) -> u32 {
        self.n_samples
    }
}

/// Mean and variance over time via exponential moving averages.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovingStats {
    avg: MovingAverage,
    var: f32,
}

impl MovingStats {
    /// Infinite time window.
    pub fn new() -> Self {
        Self {
            avg: MovingAverage::new(),
            var: 0.0,
        }
    }

    /// Finite time window (seconds).
    pub fn with_time_window(seconds: f32) -> Self {
        Self {
            avg: MovingAverage::with_time_window(seconds),
            var: 0.0,
        }
    }

    pub fn infinite_time_window(&mut self) {
        self.avg.infinite_time_window();
    }

    pub fn set_time_window(&mut self, seconds: f32) {
        self.avg.set_time_window(seconds);
    }

    pub fn time_window(&self) -> f32 {
        self.avg.time_window()
    }

    pub fn time_window_is_infinite(&self) -> bool {
        self.avg.time_window_is_infinite()
    }

    /// Clears the statistics.
    pub fn reset(&mut self) {
        self.avg.reset();
        self.var = 0.0;
    }

    /// Resets to prior estimates of mean and standard deviation.
    pub fn reset_to(&mut self, mean: f32, std_dev: f32) {
        self.avg.reset_to(mean);
        self.var = std_dev * std_dev;
    }

    /// Mixing factor for the current state.
    pub fn alpha(&self, sample_rate: f32) -> f32 {
        self.avg.alpha(sample_rate)
    }

    /// Absorbs a value; returns the z-score of the value against the
    /// updated statistics.
    pub fn update(&mut self, value: f32, sample_rate: f32) -> f32 {
        let alpha = self.avg.alpha(sample_rate);
        self.avg.update(value, alpha);
        let centered = value - self.avg.get();
        apply_update(&mut self.var, centered * centered, alpha);
        self.normalize(value)
    }

    /// Exponential moving mean of the samples.
    pub fn mean(&self) -> f32 {
        self.avg.get()
    }

    /// Exponential moving variance of the samples (never negative).
    pub fn var(&self) -> f32 {
        self.var.max(0.0)
    }

    /// Standard deviation of the samples.
    pub fn std_dev(&self) -> f32 {
        self.var().sqrt()
    }

    /// Z-score of a value against the current statistics.
    pub fn normalize(&self, value: f32) -> f32 {
        (value - self.mean()) / self.std_dev().max(f32::MIN_POSITIVE)
    }

    /// Rescales a value to a target mean and standard deviation.
    pub fn normalize_to(&self, value: f32, target_mean: f32, target_std_dev: f32) -> f32 {
        self.normalize(value) * target_std_dev + target_mean
    }

    /// True if the value lies `n_std_dev` deviations away from the mean.
    pub fn is_outlier(&self, value: f32, n_std_dev: f32) -> bool {
        self.normalize(value).abs() >= n_std_dev.abs()
    }

    /// True if the value lies `n_std_dev` deviations below the mean.
    pub fn is_low_outlier(&self, value: f32, n_std_dev: f32) -> bool {
        self.normalize(value) <= -n_std_dev.abs()
    }

    /// True if the value lies `n_std_dev` deviations above the mean.
    pub fn is_high_outlier(&self, value: f32, n_std_dev: f32) -> bool {
        self.normalize(value) >= n_std_dev.abs()
    }

    pub fn is_started(&self) -> bool {
        self.avg.is_started()
    }

    pub fn n_samples(&self) -> u32 {
        self.avg.n_samples()
    }
}
