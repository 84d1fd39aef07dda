//! Sine wave.

use cadence_core::fixed::{fixed32_div, Phase32, PHASE32_HALF, PHASE32_MAX};
use cadence_core::trig::cos_q31;

use crate::events::EventKind;
use crate::osc::wave::{wave_surface, WaveCore, DEFAULT_SKEW};
use crate::tick::Tick;
use crate::unit::{Timeable, Unit};

/// Sine wave through the fixed-point cosine table. The skew remaps the
/// phase so it still controls rise/fall asymmetry: the wave peaks at the
/// skew point instead of mid-period.
#[derive(Debug, Clone, Copy)]
pub struct SineWave {
    wave: WaveCore,
    value: f32,
}

impl Default for SineWave {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SineWave {
    /// Sine wave with the given period (seconds), symmetric.
    pub fn new(period: f32) -> Self {
        Self::with_skew(period, DEFAULT_SKEW)
    }

    /// Sine wave with the given period (seconds) and skew in [0, 1].
    pub fn with_skew(period: f32, skew: f32) -> Self {
        let mut sine = Self {
            wave: WaveCore::new(period, skew),
            value: 0.0,
        };
        sine.refresh();
        sine
    }

    fn sample(&self, t: Phase32) -> f32 {
        let skew32 = self.wave.skew32();
        // Remap the phase so the peak lands on the skew point. The
        // symmetric case skips the division.
        let remapped = if skew32 == PHASE32_HALF {
            t
        } else if t < skew32 {
            fixed32_div(t, skew32) / 2
        } else {
            fixed32_div(t - skew32, PHASE32_MAX - skew32) / 2 + PHASE32_HALF
        };
        let raw = (PHASE32_HALF as i64 - cos_q31(remapped) as i64) as Phase32;
        self.wave.amplified_fixed(raw)
    }
}

wave_surface!(SineWave);

impl Unit for SineWave {
    fn begin(&mut self, _tick: &mut Tick) {
        self.start();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.wave.advance(tick);
        self.refresh();
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        kind == EventKind::Bang && self.passed_cycle()
    }
}
