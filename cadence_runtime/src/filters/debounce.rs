//! Digital debouncing.

use crate::events::EventKind;
use crate::tick::Tick;
use crate::unit::{analog_to_digital, DigitalUnit, EdgeState, TimeWindowed, Unit};

/// Default debouncing window (seconds).
pub const DEFAULT_DEBOUNCE_WINDOW: f32 = 0.02;

/// How the debouncer decides a transition is real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceMode {
    /// Report a change only after the raw input held the new state for
    /// the whole window (default).
    #[default]
    Stable,
    /// Report a change immediately, then ignore the input for the whole
    /// window.
    LockOut,
    /// Report a change immediately, then require the input to settle for
    /// the whole window before another change can be reported.
    PromptDetect,
}

/// Debouncing state machine over a raw on/off signal. Time is fed in
/// explicitly, so the machine is testable without a clock. A zero window
/// passes the raw signal through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: f32,
    mode: DebounceMode,
    debounced: bool,
    last_raw: bool,
    mark: f64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW, DebounceMode::Stable)
    }
}

impl Debouncer {
    /// Debouncer with the given window (seconds) and mode.
    pub fn new(window: f32, mode: DebounceMode) -> Self {
        Self {
            window: window.max(0.0),
            mode,
            debounced: false,
            last_raw: false,
            mark: 0.0,
        }
    }

    /// Changes the debouncing window (seconds).
    pub fn set_window(&mut self, seconds: f32) {
        self.window = seconds.max(0.0);
    }

    /// Debouncing window (seconds).
    pub fn window(&self) -> f32 {
        self.window
    }

    /// Changes the debounce mode.
    pub fn set_mode(&mut self, mode: DebounceMode) {
        self.mode = mode;
    }

    /// Debounce mode.
    pub fn mode(&self) -> DebounceMode {
        self.mode
    }

    /// Re-seeds the machine to a known state.
    pub fn reset(&mut self, raw: bool, now: f64) {
        self.debounced = raw;
        self.last_raw = raw;
        self.mark = now;
    }

    /// Debounced value as of the last update.
    pub fn debounced(&self) -> bool {
        self.debounced
    }

    fn window_elapsed(&self, now: f64) -> bool {
        now - self.mark >= self.window as f64
    }

    /// Absorbs a raw reading at the given moment; returns the debounced
    /// value.
    pub fn update(&mut self, raw: bool, now: f64) -> bool {
        match self.mode {
            DebounceMode::Stable => {
                // Any flicker restarts the stability window.
                if raw != self.last_raw {
                    self.mark = now;
                    self.last_raw = raw;
                }
                if raw != self.debounced && self.window_elapsed(now) {
                    self.debounced = raw;
                }
            }
            DebounceMode::LockOut => {
                if raw != self.debounced && self.window_elapsed(now) {
                    self.debounced = raw;
                    self.mark = now;
                }
            }
            DebounceMode::PromptDetect => {
                if raw != self.last_raw {
                    if raw != self.debounced && self.window_elapsed(now) {
                        self.debounced = raw;
                    }
                    // Every edge restarts the settling window.
                    self.mark = now;
                    self.last_raw = raw;
                }
            }
        }
        self.debounced
    }
}

/// Digital input unit debouncing host-supplied raw values: `put()` feeds
/// the raw signal (≥ 0.5 = on), `step()` settles it through the machine.
#[derive(Debug, Clone, Copy)]
pub struct DebouncedInput {
    debouncer: Debouncer,
    raw: bool,
    edge: EdgeState,
}

impl Default for DebouncedInput {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW, DebounceMode::Stable)
    }
}

impl DebouncedInput {
    /// Input with the given debouncing window (seconds) and mode.
    pub fn new(window: f32, mode: DebounceMode) -> Self {
        Self {
            debouncer: Debouncer::new(window, mode),
            raw: false,
            edge: EdgeState::default(),
        }
    }

    /// Disables debouncing (raw pass-through).
    pub fn no_debounce(&mut self) {
        self.debouncer.set_window(0.0);
    }

    /// Changes the debounce mode.
    pub fn set_mode(&mut self, mode: DebounceMode) {
        self.debouncer.set_mode(mode);
    }

    /// Debounce mode.
    pub fn mode(&self) -> DebounceMode {
        self.debouncer.mode()
    }
}

impl Unit for DebouncedInput {
    fn begin(&mut self, tick: &mut Tick) {
        self.debouncer.reset(self.raw, tick.seconds());
        self.edge.set(self.raw);
    }

    fn step(&mut self, tick: &mut Tick) {
        let debounced = self.debouncer.update(self.raw, tick.seconds());
        self.edge.set(debounced);
    }

    fn value(&self) -> f32 {
        crate::unit::digital_to_analog(self.is_on())
    }

    fn put(&mut self, value: f32) -> f32 {
        self.raw = analog_to_digital(value);
        self.value()
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        self.edge.event_triggered(kind)
    }
}

impl DigitalUnit for DebouncedInput {
    fn is_on(&self) -> bool {
        self.edge.is_on()
    }
}

impl TimeWindowed for DebouncedInput {
    fn set_time_window(&mut self, seconds: f32) {
        self.debouncer.set_window(seconds);
    }

    fn time_window(&self) -> f32 {
        self.debouncer.window()
    }

    fn infinite_time_window(&mut self) {
        // An unbounded window would never settle; treated as no window.
        self.debouncer.set_window(0.0);
    }

    fn time_window_is_infinite(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_mode_waits_out_bounces() {
        let mut deb = Debouncer::new(0.02, DebounceMode::Stable);
        deb.reset(false, 0.0);
        // Bouncing contact: flickers for 10 ms.
        assert!(!deb.update(true, 0.001));
        assert!(!deb.update(false, 0.005));
        assert!(!deb.update(true, 0.010));
        // Still within the window of the last edge.
        assert!(!deb.update(true, 0.025));
        // Held stable for 20 ms since the last edge.
        assert!(deb.update(true, 0.031));
    }

    #[test]
    fn lock_out_reports_first_edge() {
        let mut deb = Debouncer::new(0.02, DebounceMode::LockOut);
        deb.reset(false, -1.0);
        // First edge accepted immediately.
        assert!(deb.update(true, 0.001));
        // Bounces ignored during the lockout.
        assert!(deb.update(false, 0.005));
        assert!(deb.update(true, 0.010));
        // After the lockout the signal may change again.
        assert!(!deb.update(false, 0.030));
    }

    #[test]
    fn prompt_detect_requires_settling() {
        let mut deb = Debouncer::new(0.02, DebounceMode::PromptDetect);
        deb.reset(false, -1.0);
        // First edge accepted immediately.
        assert!(deb.update(true, 0.001));
        // A bounce down is ignored (window not elapsed) but restarts it.
        assert!(deb.update(false, 0.005));
        assert!(deb.update(true, 0.010));
        // Stable long enough: the next edge is prompt again.
        assert!(!deb.update(false, 0.050));
    }

    #[test]
    fn zero_window_passes_through() {
        let mut deb = Debouncer::new(0.0, DebounceMode::Stable);
        deb.reset(false, 0.0);
        assert!(deb.update(true, 0.0));
        assert!(!deb.update(false, 0.0));
    }

    #[test]
    fn unit_debounces_and_reports_edges() {
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let mut input = DebouncedInput::new(0.02, DebounceMode::Stable);
        let mut rng = SmallRng::seed_from_u64(0);
        {
            let mut tick = Tick::new(0.0, 100.0, 0, &mut rng);
            input.begin(&mut tick);
        }
        input.put(1.0);
        // First step marks the edge; the 20 ms window elapses two steps
        // later at the 10 ms step rate.
        let mut rose_at = None;
        for i in 1..=5u32 {
            let mut tick = Tick::new(i as f64 * 0.01, 100.0, i, &mut rng);
            input.step(&mut tick);
            if input.event_triggered(EventKind::Rise) {
                rose_at = Some(i);
            }
        }
        assert_eq!(rose_at, Some(3));
        assert!(input.is_on());
    }
}
