//! Threshold classifier.

use crate::events::EventKind;
use crate::tick::Tick;
use crate::unit::{DigitalUnit, EdgeState, Unit};

/// What relation to the threshold switches the output on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMode {
    /// On while the value is above the threshold.
    #[default]
    High,
    /// On while the value is below the threshold.
    Low,
    /// On for the step where the value crosses the threshold upward.
    Rising,
    /// On for the step where the value crosses the threshold downward.
    Falling,
    /// On for the step of any crossing, in either direction.
    Change,
}

/// Converts an analog signal into on/off against a threshold, with an
/// optional hysteresis band: after a rising detection the input must fall
/// below the reset threshold before another one can fire (and vice versa
/// for falling).
#[derive(Debug, Clone, Copy)]
pub struct Thresholder {
    mode: ThresholdMode,
    threshold: f32,
    reset_threshold: f32,
    was_low: bool,
    was_high: bool,
    on: bool,
    edge: EdgeState,
}

impl Thresholder {
    /// Thresholder with no hysteresis.
    pub fn new(threshold: f32, mode: ThresholdMode) -> Self {
        Self::with_reset(threshold, mode, threshold)
    }

    /// Thresholder with a distinct reset threshold. The reset level is
    /// clamped to the proper side of the threshold for the chosen mode.
    pub fn with_reset(threshold: f32, mode: ThresholdMode, reset_threshold: f32) -> Self {
        let reset_threshold = match mode {
            ThresholdMode::Rising => reset_threshold.min(threshold),
            ThresholdMode::Falling => reset_threshold.max(threshold),
            _ => threshold,
        };
        Self {
            mode,
            threshold,
            reset_threshold,
            was_low: false,
            was_high: false,
            on: false,
            edge: EdgeState::default(),
        }
    }

    /// Detection mode.
    pub fn mode(&self) -> ThresholdMode {
        self.mode
    }

    /// Threshold value.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Unit for Thresholder {
    fn step(&mut self, _tick: &mut Tick) {
        self.edge.set(self.on);
    }

    fn value(&self) -> f32 {
        crate::unit::digital_to_analog(self.on)
    }

    fn put(&mut self, value: f32) -> f32 {
        let high = value > self.threshold;
        let low = value < self.threshold;
        let rising = high && self.was_low;
        let falling = low && self.was_high;

        if rising {
            self.was_low = false;
        }
        if falling {
            self.was_high = false;
        }

        self.on = match self.mode {
            ThresholdMode::High => high,
            ThresholdMode::Low => low,
            ThresholdMode::Rising => rising,
            ThresholdMode::Falling => falling,
            ThresholdMode::Change => rising || falling,
        };

        if value < self.reset_threshold {
            self.was_low = true;
        } else if value > self.reset_threshold {
            self.was_high = true;
        }

        self.value()
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        self.edge.event_triggered(kind)
    }
}

impl DigitalUnit for Thresholder {
    fn is_on(&self) -> bool {
        self.on
    }
}
