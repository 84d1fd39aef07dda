//! Per-step sub-sample folding.
//!
//! Filters update their statistics once per step, but `put()` may be
//! called any number of times between steps. The aggregate keeps the
//! running average of the sub-samples; past a fixed cap, new samples are
//! blended in with a proportional weight instead of growing the count, so
//! the step update stays equivalent to having seen the per-step average.

use cadence_core::average::apply_update;

/// Sub-sample count cap per step.
pub const MAX_SUB_SAMPLES: u8 = 127;

/// Running per-step average of `put()` sub-samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepAggregate {
    mean: f32,
    count: u8,
}

impl StepAggregate {
    /// Absorbs one sub-sample; returns the mean as it was before.
    pub fn put(&mut self, value: f32) -> f32 {
        let previous = self.mean;
        if self.count == 0 {
            self.mean = value;
            self.count = 1;
        } else if self.count < MAX_SUB_SAMPLES {
            self.count += 1;
            apply_update(&mut self.mean, value, 1.0 / self.count as f32);
        } else {
            apply_update(&mut self.mean, value, 1.0 / (MAX_SUB_SAMPLES as f32 + 1.0));
        }
        previous
    }

    /// Per-step mean so far. Retains the last step's mean after
    /// [`StepAggregate::finish_step`], supporting repeat-last-value steps.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Sub-samples folded in this step.
    pub fn count(&self) -> u8 {
        self.count
    }

    /// True if no sub-sample arrived this step.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Closes the step: clears the count, keeps the mean.
    pub fn finish_step(&mut self) {
        self.count = 0;
    }

    /// Clears everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_put_is_the_mean() {
        let mut agg = StepAggregate::default();
        agg.put(4.0);
        assert_eq!(agg.mean(), 4.0);
        assert_eq!(agg.count(), 1);
    }

    #[test]
    fn multiple_puts_average() {
        let mut agg = StepAggregate::default();
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            agg.put(v);
        }
        assert!((agg.mean() - 2.5).abs() < 1e-6);
        assert_eq!(agg.count(), 4);
    }

    #[test]
    fn finish_step_keeps_mean() {
        let mut agg = StepAggregate::default();
        agg.put(7.0);
        agg.finish_step();
        assert!(agg.is_empty());
        assert_eq!(agg.mean(), 7.0);
        // Next step's first sample replaces the old mean.
        agg.put(1.0);
        assert_eq!(agg.mean(), 1.0);
    }

    #[test]
    fn capped_count_keeps_blending() {
        let mut agg = StepAggregate::default();
        for _ in 0..1000 {
            agg.put(2.0);
        }
        assert_eq!(agg.count(), MAX_SUB_SAMPLES);
        assert!((agg.mean() - 2.0).abs() < 1e-6);
        // A differing sample still moves the mean, proportionally.
        agg.put(130.0);
        assert!(agg.mean() > 2.0 && agg.mean() < 4.0);
    }
}
