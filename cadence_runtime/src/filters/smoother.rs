//! Exponential smoothing filter.

use cadence_core::average::{compute_update, MovingAverage};

use crate::filters::StepAggregate;
use crate::tick::Tick;
use crate::unit::{MovingFilterUnit, TimeWindowed, Unit};

/// Default smoothing window (seconds).
pub const DEFAULT_SMOOTH_WINDOW: f32 = 0.1;

/// Exponential moving average of its input.
///
/// On steps where no value was put, the previous value is re-fed so the
/// average keeps converging at the sample rate. Multiple puts within one
/// step are folded into the step average through amendment.
#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    avg: MovingAverage,
    agg: StepAggregate,
    step_alpha: f32,
    calibrating: bool,
    sample_rate: f32,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new()
    }
}

impl Smoother {
    /// Smoother with the default window.
    pub fn new() -> Self {
        Self::with_time_window(DEFAULT_SMOOTH_WINDOW)
    }

    /// Smoother over a given time window (seconds).
    pub fn with_time_window(seconds: f32) -> Self {
        Self {
            avg: MovingAverage::with_time_window(seconds),
            agg: StepAggregate::default(),
            step_alpha: 1.0,
            calibrating: true,
            sample_rate: f32::MAX,
        }
    }

    /// Re-seeds the average with a prior value.
    pub fn reset_to(&mut self, value: f32) {
        self.avg.reset_to(value);
        self.agg.reset();
    }

    /// The value the filter would report after absorbing `value`, without
    /// mutating any state.
    pub fn filter_preview(&self, value: f32) -> f32 {
        if self.avg.is_started() {
            compute_update(self.avg.get(), value, self.avg.alpha(self.sample_rate))
        } else {
            value
        }
    }
}

impl Unit for Smoother {
    fn begin(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.sample_rate = tick.sample_rate();
        if !self.calibrating {
            self.agg.finish_step();
            return;
        }
        if self.agg.is_empty() {
            // No values this step: repeat the previous one.
            let alpha = self.avg.alpha(self.sample_rate);
            self.avg.update(self.agg.mean(), alpha);
        } else {
            self.agg.finish_step();
        }
    }

    fn value(&self) -> f32 {
        self.avg.get()
    }

    fn put(&mut self, value: f32) -> f32 {
        if self.calibrating {
            if self.agg.is_empty() {
                self.step_alpha = self.avg.alpha(self.sample_rate);
                self.agg.put(value);
                self.avg.update(self.agg.mean(), self.step_alpha);
            } else {
                let previous = self.agg.put(value);
                self.avg.amend(previous, self.agg.mean(), self.step_alpha);
            }
        }
        self.value()
    }
}

impl TimeWindowed for Smoother {
    fn set_time_window(&mut self, seconds: f32) {
        self.avg.set_time_window(seconds);
    }

    fn time_window(&self) -> f32 {
        self.avg.time_window()
    }

    fn infinite_time_window(&mut self) {
        self.avg.infinite_time_window();
    }

    fn time_window_is_infinite(&self) -> bool {
        self.avg.time_window_is_infinite()
    }
}

impl MovingFilterUnit for Smoother {
    fn reset(&mut self) {
        self.avg.reset();
        self.agg.reset();
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
