//! Signal-shape detectors.
//!
//! Stateful classifiers turning an analog stream into on/off decisions:
//! level and crossing tests with hysteresis, and apex detection.

mod peak;
mod threshold;

pub use peak::{PeakDetector, PeakMode};
pub use threshold::{ThresholdMode, Thresholder};
