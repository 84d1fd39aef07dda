//! Running min/max rescaler.

use cadence_core::average::{apply_update, moving_average_alpha};
use cadence_core::map::map_to_01_clamped;

use crate::filters::StepAggregate;
use crate::tick::Tick;
use crate::unit::{MovingFilterUnit, TimeWindowed, Unit};

/// Rescales its input into [0, 1] against the running minimum and maximum.
/// The raw extremes are smoothed before use, and with a finite time window
/// they decay toward the recent signal so the range can re-tighten after a
/// spike. Identical inputs map to exactly 0.5 (degenerate range).
#[derive(Debug, Clone, Copy)]
pub struct MinMaxScaler {
    time_window: f32,
    min_value: f32,
    max_value: f32,
    smoothed_min: f32,
    smoothed_max: f32,
    agg: StepAggregate,
    n_samples: u32,
    calibrating: bool,
    value: f32,
    sample_rate: f32,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxScaler {
    /// Scaler with an infinite window (extremes never decay).
    pub fn new() -> Self {
        let mut scaler = Self {
            time_window: -1.0,
            min_value: f32::MAX,
            max_value: -f32::MAX,
            smoothed_min: 0.5,
            smoothed_max: 0.5,
            agg: StepAggregate::default(),
            n_samples: 0,
            calibrating: true,
            value: 0.5,
            sample_rate: f32::MAX,
        };
        scaler.reset();
        scaler
    }

    /// Scaler whose extremes decay over a finite window (seconds).
    pub fn with_time_window(seconds: f32) -> Self {
        let mut scaler = Self::new();
        scaler.set_time_window(seconds);
        scaler
    }

    /// Running minimum.
    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    /// Running maximum.
    pub fn max_value(&self) -> f32 {
        self.max_value
    }
}

impl Unit for MinMaxScaler {
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
        if self.agg.is_empty() && self.min_value == f32::MAX {
            return;
        }
        let step_mean = self.agg.mean();
        self.agg.finish_step();

        let alpha = moving_average_alpha(self.sample_rate, self.time_window, self.n_samples, false);

        // Finite window: pull the extremes back toward the recent signal.
        if !self.time_window_is_infinite() {
            apply_update(&mut self.min_value, step_mean, alpha);
            apply_update(&mut self.max_value, step_mean, alpha);
        }

        apply_update(&mut self.smoothed_min, self.min_value, alpha);
        apply_update(&mut self.smoothed_max, self.max_value, alpha);

        self.n_samples = self.n_samples.saturating_add(1);
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn put(&mut self, value: f32) -> f32 {
        if self.calibrating {
            if value < self.min_value {
                self.min_value = value;
                if self.n_samples == 0 {
                    self.smoothed_min = value;
                }
            }
            if value > self.max_value {
                self.max_value = value;
                if self.n_samples == 0 {
                    self.smoothed_max = value;
                }
            }
            self.agg.put(value);
        }
        self.value = map_to_01_clamped(value, self.smoothed_min, self.smoothed_max);
        self.value
    }
}

impl TimeWindowed for MinMaxScaler {
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

impl MovingFilterUnit for MinMaxScaler {
    fn reset(&mut self) {
        self.min_value = f32::MAX;
        self.max_value = -f32::MAX;
        self.smoothed_min = 0.5;
        self.smoothed_max = 0.5;
        self.value = 0.5;
        self.agg.reset();
        self.n_samples = 0;
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
