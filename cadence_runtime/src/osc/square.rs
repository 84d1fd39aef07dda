//! Square wave.

use cadence_core::fixed::{Phase32, PHASE32_MAX};

use crate::events::EventKind;
use crate::osc::wave::{wave_surface, WaveCore, DEFAULT_SKEW};
use crate::tick::Tick;
use crate::unit::{DigitalUnit, EdgeState, Timeable, Unit};

/// Square (pulse) wave: on while the phase lies at or before the skew
/// point, off after. The skew is the duty cycle.
#[derive(Debug, Clone, Copy)]
pub struct SquareWave {
    wave: WaveCore,
    edge: EdgeState,
    value: f32,
}

impl Default for SquareWave {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SquareWave {
    /// Square wave with the given period (seconds) and a 50% duty cycle.
    pub fn new(period: f32) -> Self {
        Self::with_skew(period, DEFAULT_SKEW)
    }

    /// Square wave with the given period (seconds) and duty cycle in
    /// [0, 1].
    pub fn with_skew(period: f32, skew: f32) -> Self {
        let mut square = Self {
            wave: WaveCore::new(period, skew),
            edge: EdgeState::default(),
            value: 0.0,
        };
        square.refresh();
        square
    }

    fn sample(&self, t: Phase32) -> f32 {
        self.wave
            .amplified_fixed(if self.wave.is_pre_skew(t) { PHASE32_MAX } else { 0 })
    }
}

wave_surface!(SquareWave);

impl Unit for SquareWave {
    fn begin(&mut self, _tick: &mut Tick) {
        self.start();
    }

    fn step(&mut self, tick: &mut Tick) {
        self.wave.advance(tick);
        self.edge
            .set(self.wave.is_pre_skew(self.wave.osc.phase32()));
        self.refresh();
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn event_triggered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Bang => self.passed_cycle(),
            _ => self.edge.event_triggered(kind),
        }
    }
}

impl DigitalUnit for SquareWave {
    fn is_on(&self) -> bool {
        self.edge.is_on()
    }
}
