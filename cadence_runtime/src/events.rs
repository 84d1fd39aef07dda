//! Event listeners.
//!
//! A listener is a (unit, event kind, callback) entry in a bounded table,
//! registered through the engine and polled once per step after every unit
//! has stepped: if the unit reports the event as currently true, the
//! callback runs. Listeners for a unit are dropped when the unit is
//! removed.

use heapless::Vec;

/// Kinds of events a unit can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Digital value changed this step.
    Change,
    /// Digital value rose this step.
    Rise,
    /// Digital value fell this step.
    Fall,
    /// Periodic pulse fired this step (metronomes, wave cycle ends).
    Bang,
    /// A timed process completed this step.
    Finish,
}

/// Maximum number of registered listeners per engine.
pub const MAX_LISTENERS: usize = 8;

pub(crate) struct Listener {
    pub(crate) slot: usize,
    pub(crate) kind: EventKind,
    pub(crate) callback: Box<dyn FnMut()>,
}

/// Bounded listener table.
#[derive(Default)]
pub(crate) struct EventManager {
    listeners: Vec<Listener, MAX_LISTENERS>,
}

impl EventManager {
    pub(crate) fn add(&mut self, listener: Listener) -> Result<(), ()> {
        self.listeners.push(listener).map_err(|_| ())
    }

    pub(crate) fn clear_slot(&mut self, slot: usize) {
        self.listeners.retain(|l| l.slot != slot);
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Runs every listener whose event is currently true, as reported by
    /// `triggered(slot, kind)`.
    pub(crate) fn step(&mut self, triggered: impl Fn(usize, EventKind) -> bool) {
        for listener in self.listeners.iter_mut() {
            if triggered(listener.slot, listener.kind) {
                (listener.callback)();
            }
        }
    }
}
