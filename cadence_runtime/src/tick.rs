//! Per-step context handed to units.
//!
//! A [`Tick`] is the only view a unit gets of the engine: the reference
//! time frozen for the whole step, the current sample rate and its derived
//! quantities, the step counter, and the engine's random source.

use rand::rngs::SmallRng;
use rand::Rng;

/// Context for one `begin()` or `step()` call.
pub struct Tick<'a> {
    seconds: f64,
    sample_rate: f32,
    sample_period: f32,
    phase_scale: f32,
    n_steps: u32,
    rng: &'a mut SmallRng,
}

impl<'a> Tick<'a> {
    /// Builds a tick. Normally done by the engine; public so units can be
    /// exercised standalone in tests.
    pub fn new(seconds: f64, sample_rate: f32, n_steps: u32, rng: &'a mut SmallRng) -> Self {
        let sample_rate = sample_rate.max(f32::MIN_POSITIVE);
        let sample_period = 1.0 / sample_rate;
        Self {
            seconds,
            sample_rate,
            sample_period,
            phase_scale: sample_period * 2.0f32.powi(32),
            n_steps,
            rng,
        }
    }

    /// Reference time in seconds, stable for the whole step.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Current sample rate (Hz).
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current sample period (seconds).
    #[inline]
    pub fn sample_period(&self) -> f32 {
        self.sample_period
    }

    /// Premultiplied `Δt·2³²` for phase-accumulator updates.
    #[inline]
    pub fn phase_scale(&self) -> f32 {
        self.phase_scale
    }

    /// Number of completed steps (wraps).
    #[inline]
    pub fn n_steps(&self) -> u32 {
        self.n_steps
    }

    /// Uniform random value in [0, 1).
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform random value in (0, 1]; never returns zero exactly.
    #[inline]
    pub fn random_open01(&mut self) -> f32 {
        let r = self.rng.random::<u32>() | 1;
        const TWO_NEG_32: f32 = 1.0 / 4_294_967_296.0;
        (r as f32 + 1.0) * TWO_NEG_32
    }

    /// Poisson-process approximation: fires roughly once per `time_window`
    /// seconds regardless of the step rate.
    pub fn random_trigger(&mut self, time_window: f32) -> bool {
        if time_window <= 0.0 {
            return true;
        }
        let p = (self.sample_period / time_window).min(1.0);
        self.random() < p
    }
}
