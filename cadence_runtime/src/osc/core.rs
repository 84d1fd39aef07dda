//! Shared oscillator state.
//!
//! [`OscCore`] holds the period/frequency/BPM parameter views, the phase
//! accumulator with its run state and direction, and the optional cycle
//! jitter. Wave units and the metronome embed it and call
//! [`OscCore::step_phase`] once per step; the returned overflow flag is the
//! cycle-completed signal.

use cadence_core::fixed::{phase32_from_f32, phase32_to_f32, Phase32};
use cadence_core::map::{constrain01, wrap01};
use cadence_core::phase::{
    frequency_to_period, period_to_frequency, phase32_add_phase, phase32_add_time,
    phase32_update_scaled, time_to_phase, BPM_TO_HZ, HZ_TO_BPM,
};

use crate::tick::Tick;
use crate::unit::Timeable;

// Clamp bound for the per-cycle jitter ratio.
const JITTER_RATIO_MAX: f32 = 32.0;

/// Phase accumulator with period/frequency/BPM views, run state, direction
/// and per-cycle jitter.
#[derive(Debug, Clone, Copy)]
pub struct OscCore {
    period: f32,
    frequency: f32, // cached reciprocal of period
    phase_shift: f32,
    phase32: Phase32,
    overflowed: bool,
    running: bool,
    forward: bool,
    jitter: f32,
    // Frequency ratio for the current cycle; redrawn after each overflow.
    jitter_ratio: Option<f32>,
}

impl OscCore {
    /// Core with the given period (seconds), stopped, at phase 0.
    pub fn new(period: f32) -> Self {
        let period = period.max(0.0);
        Self {
            period,
            frequency: period_to_frequency(period),
            phase_shift: 0.0,
            phase32: 0,
            overflowed: false,
            running: false,
            forward: true,
            jitter: 0.0,
            jitter_ratio: None,
        }
    }

    // ─── Rate views ─────────────────────────────────────────────────

    /// Sets the period (seconds); negative values clamp to zero.
    pub fn set_period(&mut self, period: f32) {
        let period = period.max(0.0);
        if self.period != period {
            self.period = period;
            self.frequency = period_to_frequency(period);
        }
    }

    /// Period (seconds).
    pub fn period(&self) -> f32 {
        self.period
    }

    /// Sets the frequency (Hz); negative values clamp to zero.
    pub fn set_frequency(&mut self, frequency: f32) {
        let frequency = frequency.max(0.0);
        if self.frequency != frequency {
            self.frequency = frequency;
            self.period = frequency_to_period(frequency);
        }
    }

    /// Frequency (Hz).
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Sets the frequency in beats per minute.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.set_frequency(bpm * BPM_TO_HZ);
    }

    /// Frequency in beats per minute.
    pub fn bpm(&self) -> f32 {
        self.frequency * HZ_TO_BPM
    }

    // ─── Phase ──────────────────────────────────────────────────────

    /// Repositions the accumulator to an absolute phase (fraction of a
    /// period, wrapped into [0, 1)).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase32 = phase32_from_f32(wrap01(phase));
    }

    /// Current phase as a fraction of the period.
    pub fn phase(&self) -> f32 {
        phase32_to_f32(self.phase32)
    }

    /// Raw phase accumulator.
    pub fn phase32(&self) -> Phase32 {
        self.phase32
    }

    /// Changes the phase shift. The accumulator is adjusted by the
    /// difference so the visible value does not jump at the new origin.
    pub fn set_phase_shift(&mut self, phase_shift: f32) {
        if self.phase_shift != phase_shift {
            self.phase32 = phase32_add_phase(self.phase32, self.phase_shift - phase_shift);
            self.phase_shift = phase_shift;
        }
    }

    /// Current phase shift (fraction of a period).
    pub fn phase_shift(&self) -> f32 {
        self.phase_shift
    }

    /// Converts a time offset (seconds) to a phase fraction of the period.
    pub fn time_to_phase(&self, time: f32) -> f32 {
        time_to_phase(self.period, time)
    }

    // ─── Direction ──────────────────────────────────────────────────

    /// True iff the oscillator moves forward in time.
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Sets the direction of oscillation.
    pub fn set_forward(&mut self, forward: bool) {
        self.forward = forward;
    }

    /// Moves forward in time.
    pub fn forward(&mut self) {
        self.forward = true;
    }

    /// Moves backward in time.
    pub fn reverse(&mut self) {
        self.forward = false;
    }

    /// Toggles the direction of oscillation.
    pub fn toggle_reverse(&mut self) {
        self.forward = !self.forward;
    }

    // ─── Jitter ─────────────────────────────────────────────────────

    /// Sets the jitter level in [0, 1]. At 0 the oscillator is exactly
    /// deterministic; at 1 each cycle runs at a rate ratio drawn from an
    /// exponential-like distribution, producing Poisson-process-like
    /// irregular periods.
    pub fn set_jitter(&mut self, level: f32) {
        self.jitter = constrain01(level);
        if self.jitter == 0.0 {
            self.jitter_ratio = None;
        }
    }

    /// Current jitter level.
    pub fn jitter(&self) -> f32 {
        self.jitter
    }

    // Rate ratio for the current cycle, drawn once per cycle.
    fn cycle_ratio(&mut self, tick: &mut Tick) -> f32 {
        match self.jitter_ratio {
            Some(ratio) => ratio,
            None => {
                let neg_log_u = -tick.random_open01().ln();
                let raw = (1.0 / neg_log_u).clamp(1.0 / JITTER_RATIO_MAX, JITTER_RATIO_MAX);
                let ratio = 1.0 + self.jitter * (raw - 1.0);
                self.jitter_ratio = Some(ratio);
                ratio
            }
        }
    }

    // ─── Stepping ───────────────────────────────────────────────────

    /// Advances the phase accumulator for one step. Returns true exactly
    /// when the phase wrapped (cycle completed); false while stopped.
    pub fn step_phase(&mut self, tick: &mut Tick) -> bool {
        if !self.running {
            self.overflowed = false;
            return false;
        }
        let frequency = if self.jitter > 0.0 {
            self.frequency * self.cycle_ratio(tick)
        } else {
            self.frequency
        };
        self.overflowed =
            phase32_update_scaled(&mut self.phase32, frequency, tick.phase_scale(), self.forward);
        if self.overflowed {
            self.jitter_ratio = None;
        }
        self.overflowed
    }

    /// True on the step where the phase wrapped.
    pub fn passed_cycle(&self) -> bool {
        self.overflowed
    }
}

impl Timeable for OscCore {
    fn start(&mut self) {
        self.set_time(0.0);
        self.overflowed = false;
        self.jitter_ratio = None;
        self.running = true;
    }

    fn stop(&mut self) {
        self.set_time(0.0);
        self.running = false;
    }

    fn pause(&mut self) {
        self.running = false;
    }

    fn resume(&mut self) {
        self.running = true;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_time(&mut self, seconds: f32) {
        self.phase32 = phase32_add_time(
            phase32_from_f32(wrap01(self.phase_shift)),
            self.period,
            seconds,
        );
    }

    fn add_time(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.phase32 = phase32_add_time(self.phase32, self.period, seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn count_cycles(core: &mut OscCore, steps: u32, rate: f32, seed: u64) -> u32 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut cycles = 0;
        for i in 0..steps {
            let mut tick = Tick::new(i as f64 / rate as f64, rate, i, &mut rng);
            if core.step_phase(&mut tick) {
                cycles += 1;
            }
        }
        cycles
    }

    #[test]
    fn rate_views_are_consistent() {
        let mut core = OscCore::new(2.0);
        assert_eq!(core.frequency(), 0.5);
        core.set_frequency(4.0);
        assert_eq!(core.period(), 0.25);
        core.set_bpm(120.0);
        assert_eq!(core.frequency(), 2.0);
        assert_eq!(core.bpm(), 120.0);
    }

    #[test]
    fn negative_period_clamps() {
        let mut core = OscCore::new(1.0);
        core.set_period(-5.0);
        assert_eq!(core.period(), 0.0);
    }

    #[test]
    fn stopped_core_never_cycles() {
        let mut core = OscCore::new(0.01);
        assert_eq!(count_cycles(&mut core, 1000, 100.0, 1), 0);
    }

    #[test]
    fn cycles_once_per_period() {
        let mut core = OscCore::new(0.1);
        core.start();
        // 0.1 s period at 100 Hz: 100 cycles over 1000 steps, ±1.
        let cycles = count_cycles(&mut core, 1000, 100.0, 2);
        assert!((99..=101).contains(&cycles), "cycles={cycles}");
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let mut a = OscCore::new(0.05);
        let mut b = OscCore::new(0.05);
        a.start();
        b.start();
        // Different RNG seeds, identical cycle counts.
        assert_eq!(
            count_cycles(&mut a, 2000, 100.0, 3),
            count_cycles(&mut b, 2000, 100.0, 4)
        );
    }

    #[test]
    fn jitter_keeps_long_run_rate() {
        let mut core = OscCore::new(0.1);
        core.set_jitter(1.0);
        core.start();
        // Irregular cycle-to-cycle, but the mean rate stays in the
        // neighborhood of the nominal one.
        let cycles = count_cycles(&mut core, 20_000, 100.0, 5);
        assert!((1000..=4000).contains(&cycles), "cycles={cycles}");
    }

    #[test]
    fn phase_shift_adjusts_accumulator() {
        let mut core = OscCore::new(1.0);
        core.set_phase(0.25);
        let before = core.phase();
        core.set_phase_shift(0.25);
        // Accumulator moved by the shift delta; value origin preserved.
        assert!((core.phase() - (before + 0.75).fract()).abs() < 1e-3);
        assert_eq!(core.phase_shift(), 0.25);
    }

    #[test]
    fn pause_preserves_phase() {
        let mut core = OscCore::new(1.0);
        core.start();
        core.set_phase(0.5);
        core.pause();
        assert!(!core.is_running());
        assert!((core.phase() - 0.5).abs() < 1e-3);
        core.resume();
        assert!(core.is_running());
        core.stop();
        assert!(core.phase() < 1e-3);
    }
}
