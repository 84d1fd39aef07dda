//! The schedulable node and its capability traits.
//!
//! A [`Unit`] is a stateful node driven by an engine: `begin()` once, then
//! `step()` every tick, in registration order. Values flow through the
//! uniform get/put surface: `value()` reads the unit's current output
//! (typically in [0, 1]), `put()` pushes an input into it.
//!
//! Capabilities the C++ original expressed through virtual multiple
//! inheritance are individual traits here: a unit is digital, timeable, or
//! time-windowed by implementing the matching trait, with no diamond.

use std::any::Any;

use crate::events::EventKind;
use crate::tick::Tick;

/// Converts an analog value to a digital one.
#[inline]
pub fn analog_to_digital(value: f32) -> bool {
    value >= 0.5
}

/// Converts a digital value to an analog one.
#[inline]
pub fn digital_to_analog(on: bool) -> f32 {
    if on { 1.0 } else { 0.0 }
}

/// Blanket downcast support for trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A stateful node with a begin/step lifecycle, owned by one engine.
pub trait Unit: AsAny {
    /// One-time initialization, called by the engine in registration order.
    fn begin(&mut self, _tick: &mut Tick) {}

    /// Per-tick update, called by the engine in registration order.
    fn step(&mut self, tick: &mut Tick);

    /// Current output value (typically in [0, 1]).
    fn value(&self) -> f32;

    /// Pushes a value into the unit and returns its new output.
    /// Read-only units ignore the input.
    fn put(&mut self, _value: f32) -> f32 {
        self.value()
    }

    /// Polled by the event manager once per step.
    fn event_triggered(&self, _kind: EventKind) -> bool {
        false
    }
}

/// Digital (on/off) surface.
pub trait DigitalUnit: Unit {
    /// Returns true iff the unit is "on".
    fn is_on(&self) -> bool;

    /// Returns true iff the unit is "off".
    fn is_off(&self) -> bool {
        !self.is_on()
    }

    /// Value as 0 or 1.
    fn get_int(&self) -> u8 {
        self.is_on() as u8
    }
}

/// Start/stop/pause surface of time-based units.
pub trait Timeable {
    /// Starts or restarts from zero.
    fn start(&mut self);

    /// Interrupts and resets to zero.
    fn stop(&mut self);

    /// Interrupts, preserving elapsed time.
    fn pause(&mut self);

    /// Resumes after a pause.
    fn resume(&mut self);

    /// Returns true iff currently running.
    fn is_running(&self) -> bool;

    /// Forces the current time (seconds).
    fn set_time(&mut self, seconds: f32);

    /// Adds (or subtracts) time (seconds).
    fn add_time(&mut self, seconds: f32);

    /// Toggles pause/resume.
    fn toggle_pause(&mut self) {
        if self.is_running() {
            self.pause();
        } else {
            self.resume();
        }
    }
}

/// Time-window configuration shared by the moving filters.
pub trait TimeWindowed {
    /// Changes the time window (seconds). Negative means infinite.
    fn set_time_window(&mut self, seconds: f32);

    /// Returns the time window (seconds).
    fn time_window(&self) -> f32;

    /// Sets the time window to infinite.
    fn infinite_time_window(&mut self);

    /// Returns true if the time window is infinite.
    fn time_window_is_infinite(&self) -> bool;

    /// Sets the window from a cutoff frequency (Hz); non-positive means
    /// infinite.
    fn set_cutoff(&mut self, hz: f32) {
        if hz <= 0.0 {
            self.infinite_time_window();
        } else {
            self.set_time_window(1.0 / hz);
        }
    }

    /// Returns the cutoff frequency (Hz), 0 when infinite.
    fn cutoff(&self) -> f32 {
        if self.time_window_is_infinite() {
            0.0
        } else {
            1.0 / self.time_window()
        }
    }
}

/// Reset and calibration toggling shared by the moving filters. While
/// calibration is paused the filter keeps filtering through its frozen
/// statistics without learning from new samples.
pub trait MovingFilterUnit: TimeWindowed {
    /// Re-seeds the filter to its initial state.
    fn reset(&mut self);

    /// Freezes statistics updates.
    fn pause_calibrating(&mut self);

    /// Resumes statistics updates (default state).
    fn resume_calibrating(&mut self);

    /// Returns true iff statistics updates are active.
    fn is_calibrating(&self) -> bool;

    /// Toggles calibration.
    fn toggle_calibrating(&mut self) {
        if self.is_calibrating() {
            self.pause_calibrating();
        } else {
            self.resume_calibrating();
        }
    }
}

/// Rise/fall/change bookkeeping for digital sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeState {
    on: bool,
    change: i8,
}

impl EdgeState {
    /// Records a new on/off value, capturing the transition.
    #[inline]
    pub fn set(&mut self, new_on: bool) {
        self.change = new_on as i8 - self.on as i8;
        self.on = new_on;
    }

    /// Current value.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Difference between current and previous value.
    #[inline]
    pub fn change_state(&self) -> i8 {
        self.change
    }

    /// True if the value rose on the last set.
    #[inline]
    pub fn rose(&self) -> bool {
        self.change > 0
    }

    /// True if the value fell on the last set.
    #[inline]
    pub fn fell(&self) -> bool {
        self.change < 0
    }

    /// True if the value changed on the last set.
    #[inline]
    pub fn changed(&self) -> bool {
        self.change != 0
    }

    /// Maps the standard digital events onto the edge state.
    pub fn event_triggered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Change => self.changed(),
            EventKind::Rise => self.rose(),
            EventKind::Fall => self.fell(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analog_digital_conversion() {
        assert!(analog_to_digital(0.5));
        assert!(analog_to_digital(1.0));
        assert!(!analog_to_digital(0.49));
        assert_eq!(digital_to_analog(true), 1.0);
        assert_eq!(digital_to_analog(false), 0.0);
    }

    #[test]
    fn edge_transitions() {
        let mut edge = EdgeState::default();
        edge.set(true);
        assert!(edge.rose() && edge.changed() && !edge.fell());
        edge.set(true);
        assert!(!edge.changed());
        edge.set(false);
        assert!(edge.fell() && edge.changed());
        assert!(edge.event_triggered(EventKind::Fall));
        assert!(edge.event_triggered(EventKind::Change));
        assert!(!edge.event_triggered(EventKind::Rise));
    }
}
