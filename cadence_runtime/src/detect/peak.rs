//! Peak detector.

use cadence_core::map::map_to_01;

use crate::events::EventKind;
use crate::tick::Tick;
use crate::unit::{DigitalUnit, EdgeState, Unit};

/// What shape of signal feature triggers the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakMode {
    /// On whenever the value is at or above the threshold.
    High,
    /// On whenever the value is at or below the threshold.
    Low,
    /// On for the step where the value crosses the threshold upward.
    Rising,
    /// On for the step where the value crosses the threshold downward.
    Falling,
    /// On after the value crossed up and fell back from its apex.
    #[default]
    Max,
    /// On after the value crossed down and rose back from its apex.
    Min,
}

impl PeakMode {
    // Low/Falling/Min work on the sign-flipped signal.
    fn inverted(self) -> bool {
        matches!(self, PeakMode::Low | PeakMode::Falling | PeakMode::Min)
    }

    fn is_level(self) -> bool {
        matches!(self, PeakMode::High | PeakMode::Low)
    }

    fn is_crossing(self) -> bool {
        matches!(self, PeakMode::Rising | PeakMode::Falling)
    }
}

/// Detects levels, crossings, or apexes in its input. Apex modes report a
/// peak only after the signal falls back from its maximum by a tolerance
/// (a fraction of the span between threshold and apex), and re-arm only
/// once the signal drops below a reset threshold.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    mode: PeakMode,
    threshold: f32,
    reset_threshold: f32,
    fallback_tolerance: f32,
    peak_value: f32,
    was_low: bool,
    crossed: bool,
    on: bool,
    edge: EdgeState,
}

impl PeakDetector {
    /// Detector for the given threshold and mode, with no reset drop and
    /// a 10% fallback tolerance.
    pub fn new(threshold: f32, mode: PeakMode) -> Self {
        Self::with_tolerance(threshold, mode, 0.0, 0.1)
    }

    /// Detector with explicit re-arm drop and fallback tolerance.
    ///
    /// `reset_min_drop` is how far below the threshold (above, in
    /// inverted modes) the signal must fall before another detection can
    /// arm. `fallback_tolerance` is the fraction of the apex-to-threshold
    /// span the signal must fall back before an apex is reported.
    pub fn with_tolerance(
        threshold: f32,
        mode: PeakMode,
        reset_min_drop: f32,
        fallback_tolerance: f32,
    ) -> Self {
        let threshold = if mode.inverted() { -threshold } else { threshold };
        Self {
            mode,
            threshold,
            reset_threshold: threshold - reset_min_drop.max(0.0),
            fallback_tolerance: fallback_tolerance.max(0.0),
            peak_value: -f32::MAX,
            was_low: false,
            crossed: false,
            on: false,
            edge: EdgeState::default(),
        }
    }

    /// Detection mode.
    pub fn mode(&self) -> PeakMode {
        self.mode
    }

    /// Re-arms the detector from scratch.
    pub fn reset(&mut self) {
        self.peak_value = -f32::MAX;
        self.was_low = false;
        self.crossed = false;
        self.on = false;
        self.edge = EdgeState::default();
    }
}

impl Unit for PeakDetector {
    fn step(&mut self, _tick: &mut Tick) {
        self.edge.set(self.on);
    }

    fn value(&self) -> f32 {
        crate::unit::digital_to_analog(self.on)
    }

    fn put(&mut self, value: f32) -> f32 {
        let value = if self.mode.inverted() { -value } else { value };

        self.peak_value = self.peak_value.max(value);

        let high = value >= self.threshold;
        let rising = high && self.was_low;
        if rising {
            self.was_low = false;
            self.crossed = true;
        }

        // Apex detected once the signal falls below the threshold again,
        // or falls back from its peak by the tolerance fraction.
        let falling_back = self.crossed
            && (!high
                || map_to_01(value, self.peak_value, self.threshold) >= self.fallback_tolerance);
        if falling_back {
            self.crossed = false;
            self.peak_value = -f32::MAX;
        }

        if value < self.reset_threshold {
            self.was_low = true;
        }

        self.on = if self.mode.is_level() {
            high
        } else if self.mode.is_crossing() {
            rising
        } else {
            falling_back
        };
        self.value()
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        self.edge.event_triggered(kind)
    }
}

impl DigitalUnit for PeakDetector {
    fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_mode_is_a_level_test() {
        let mut detector = PeakDetector::new(0.5, PeakMode::High);
        assert_eq!(detector.put(0.4), 0.0);
        assert_eq!(detector.put(0.6), 1.0);
        assert_eq!(detector.put(0.5), 1.0);
        assert_eq!(detector.put(0.2), 0.0);
    }

    #[test]
    fn low_mode_flips_the_test() {
        let mut detector = PeakDetector::new(0.5, PeakMode::Low);
        assert_eq!(detector.put(0.6), 0.0);
        assert_eq!(detector.put(0.4), 1.0);
    }

    #[test]
    fn rising_fires_once_per_crossing() {
        let mut detector = PeakDetector::new(0.5, PeakMode::Rising);
        detector.put(0.2); // arm
        assert!(detector.put(0.7) > 0.5);
        // Stays high: no refire.
        assert_eq!(detector.put(0.8), 0.0);
        detector.put(0.1); // re-arm
        assert!(detector.put(0.9) > 0.5);
    }

    #[test]
    fn max_mode_fires_after_the_apex() {
        let mut detector = PeakDetector::with_tolerance(0.5, PeakMode::Max, 0.0, 0.1);
        detector.put(0.1); // arm
        detector.put(0.6);
        detector.put(0.9); // apex
        assert!(detector.is_off());
        // Falling back past 10% of the apex-to-threshold span.
        detector.put(0.8);
        assert!(detector.is_on());
        // Not reported twice for the same peak.
        detector.put(0.7);
        assert!(detector.is_off());
    }

    #[test]
    fn reset_drop_prevents_chatter() {
        let mut detector = PeakDetector::with_tolerance(0.5, PeakMode::Rising, 0.2, 0.1);
        detector.put(0.1);
        assert!(detector.put(0.6) > 0.5);
        // Dips below threshold but not below reset (0.3): no re-arm.
        detector.put(0.4);
        assert_eq!(detector.put(0.7), 0.0);
        // Below reset threshold: re-arms.
        detector.put(0.2);
        assert!(detector.put(0.7) > 0.5);
    }
}
