//! Shared wave state.
//!
//! A wave is an oscillator plus an output shape: an amplitude scaling the
//! signal about its 0.5 midpoint and a skew controlling the rise/fall
//! asymmetry of the cycle. [`WaveCore`] holds those parameters and the
//! skew-crossing bookkeeping; the concrete wave units supply the shape
//! function.

use cadence_core::fixed::{
    amplify_f32, amplify_phase32, phase32_from_f32, phase32_to_f32, Phase32, PHASE32_MAX,
};
use cadence_core::map::constrain01;

use crate::osc::OscCore;
use crate::tick::Tick;

/// Default skew (symmetric rise/fall).
pub const DEFAULT_SKEW: f32 = 0.5;

/// Oscillator core plus amplitude/skew wave parameters.
#[derive(Debug, Clone, Copy)]
pub struct WaveCore {
    pub(crate) osc: OscCore,
    amplitude: Phase32,
    skew32: Phase32,
    pre_skew: bool,
    passed_skew: bool,
}

impl WaveCore {
    /// Wave state with the given period (seconds) and skew in [0, 1].
    pub fn new(period: f32, skew: f32) -> Self {
        Self {
            osc: OscCore::new(period),
            amplitude: PHASE32_MAX,
            skew32: phase32_from_f32(constrain01(skew)),
            pre_skew: true,
            passed_skew: false,
        }
    }

    /// Sets the amplitude in [0, 1], centered at 0.5.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = phase32_from_f32(constrain01(amplitude));
    }

    /// Amplitude in [0, 1].
    pub fn amplitude(&self) -> f32 {
        phase32_to_f32(self.amplitude)
    }

    /// Sets the skew in [0, 1] (fraction of the period spent rising).
    pub fn set_skew(&mut self, skew: f32) {
        self.skew32 = phase32_from_f32(constrain01(skew));
    }

    /// Skew in [0, 1].
    pub fn skew(&self) -> f32 {
        phase32_to_f32(self.skew32)
    }

    /// Skew as a raw fixed-point fraction.
    pub fn skew32(&self) -> Phase32 {
        self.skew32
    }

    /// True if the given phase lies in the rising part of the cycle.
    pub fn is_pre_skew(&self, t: Phase32) -> bool {
        t <= self.skew32
    }

    /// Advances the phase and the skew-crossing state for one step.
    /// Returns true when the cycle completed.
    pub fn advance(&mut self, tick: &mut Tick) -> bool {
        let overflowed = self.osc.step_phase(tick);
        let pre = self.is_pre_skew(self.osc.phase32());
        self.passed_skew = self.pre_skew && !pre;
        self.pre_skew = pre;
        overflowed
    }

    /// True on the step where the phase crossed the skew point.
    pub fn passed_skew(&self) -> bool {
        self.passed_skew
    }

    /// Converts a fixed-point shape value to an amplified float output.
    pub fn amplified_fixed(&self, v: Phase32) -> f32 {
        phase32_to_f32(amplify_phase32(v, self.amplitude))
    }

    /// Amplifies a float shape value about the 0.5 midpoint.
    pub fn amplified_float(&self, v: f32) -> f32 {
        amplify_f32(v, self.amplitude)
    }
}

// Shared parameter/preview/lifecycle surface of the wave units. Each unit
// defines `wave: WaveCore`, `value: f32` and `fn sample(&self, t) -> f32`.
macro_rules! wave_surface {
    ($wave:ty) => {
        impl $wave {
            // Recomputes the output after a phase or parameter change.
            fn refresh(&mut self) {
                self.value = self.sample(self.wave.osc.phase32());
            }

            /// Sets the period (seconds).
            pub fn set_period(&mut self, period: f32) {
                self.wave.osc.set_period(period);
            }

            /// Period (seconds).
            pub fn period(&self) -> f32 {
                self.wave.osc.period()
            }

            /// Sets the frequency (Hz).
            pub fn set_frequency(&mut self, frequency: f32) {
                self.wave.osc.set_frequency(frequency);
            }

            /// Frequency (Hz).
            pub fn frequency(&self) -> f32 {
                self.wave.osc.frequency()
            }

            /// Sets the frequency in beats per minute.
            pub fn set_bpm(&mut self, bpm: f32) {
                self.wave.osc.set_bpm(bpm);
            }

            /// Frequency in beats per minute.
            pub fn bpm(&self) -> f32 {
                self.wave.osc.bpm()
            }

            /// Repositions the wave at an absolute phase (fraction of a
            /// period).
            pub fn set_phase(&mut self, phase: f32) {
                self.wave.osc.set_phase(phase);
                self.refresh();
            }

            /// Current phase (fraction of a period).
            pub fn phase(&self) -> f32 {
                self.wave.osc.phase()
            }

            /// Changes the phase shift without a value jump.
            pub fn set_phase_shift(&mut self, phase_shift: f32) {
                self.wave.osc.set_phase_shift(phase_shift);
                self.refresh();
            }

            /// Current phase shift (fraction of a period).
            pub fn phase_shift(&self) -> f32 {
                self.wave.osc.phase_shift()
            }

            /// Sets the amplitude in [0, 1], centered at 0.5.
            pub fn set_amplitude(&mut self, amplitude: f32) {
                self.wave.set_amplitude(amplitude);
                self.refresh();
            }

            /// Amplitude in [0, 1].
            pub fn amplitude(&self) -> f32 {
                self.wave.amplitude()
            }

            /// Sets the skew in [0, 1].
            pub fn set_skew(&mut self, skew: f32) {
                self.wave.set_skew(skew);
                self.refresh();
            }

            /// Skew in [0, 1].
            pub fn skew(&self) -> f32 {
                self.wave.skew()
            }

            /// Sets the jitter level in [0, 1] (0 = deterministic).
            pub fn set_jitter(&mut self, level: f32) {
                self.wave.osc.set_jitter(level);
            }

            /// Current jitter level.
            pub fn jitter(&self) -> f32 {
                self.wave.osc.jitter()
            }

            /// True iff the wave moves forward in time.
            pub fn is_forward(&self) -> bool {
                self.wave.osc.is_forward()
            }

            /// Reverses the direction of oscillation.
            pub fn reverse(&mut self) {
                self.wave.osc.reverse();
            }

            /// Moves forward in time.
            pub fn forward(&mut self) {
                self.wave.osc.forward();
            }

            /// Toggles the direction of oscillation.
            pub fn toggle_reverse(&mut self) {
                self.wave.osc.toggle_reverse();
            }

            /// True on the step where the wave completed a cycle.
            pub fn passed_cycle(&self) -> bool {
                self.wave.osc.passed_cycle()
            }

            /// True on the step where the wave crossed the skew point.
            pub fn passed_skew(&self) -> bool {
                self.wave.passed_skew()
            }

            /// Value the wave would have after a phase shift (fraction of
            /// a period; wrapped). Does not mutate.
            pub fn shift_by(&self, phase_shift: f32) -> f32 {
                self.sample(cadence_core::phase::phase32_add_phase(
                    self.wave.osc.phase32(),
                    phase_shift,
                ))
            }

            /// Value the wave would have after a time shift (seconds).
            pub fn shift_by_time(&self, time_shift: f32) -> f32 {
                self.shift_by(cadence_core::phase::frequency_and_time_to_phase(
                    self.frequency(),
                    time_shift,
                ))
            }

            /// Value of the wave at an absolute phase (wrapped into
            /// [0, 1)).
            pub fn at_phase(&self, phase: f32) -> f32 {
                self.sample(cadence_core::fixed::phase32_from_f32(
                    cadence_core::map::wrap01(phase),
                ))
            }
        }

        impl crate::unit::Timeable for $wave {
            fn start(&mut self) {
                self.wave.osc.start();
                self.refresh();
            }

            fn stop(&mut self) {
                self.wave.osc.stop();
                self.refresh();
            }

            fn pause(&mut self) {
                self.wave.osc.pause();
            }

            fn resume(&mut self) {
                self.wave.osc.resume();
            }

            fn is_running(&self) -> bool {
                self.wave.osc.is_running()
            }

            fn set_time(&mut self, seconds: f32) {
                self.wave.osc.set_time(seconds);
                self.refresh();
            }

            fn add_time(&mut self, seconds: f32) {
                self.wave.osc.add_time(seconds);
                self.refresh();
            }
        }
    };
}

pub(crate) use wave_surface;
