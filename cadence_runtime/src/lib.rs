//! # Cadence Runtime
//!
//! A reactive-signal runtime: an [`Engine`](engine::Engine) scheduler
//! drives an ordered set of stateful [`Unit`](unit::Unit)s once per loop
//! iteration, on top of the fixed-point phase arithmetic and online
//! statistics of `cadence_core`.
//!
//! The host owns the loop: call [`Engine::begin`](engine::Engine::begin)
//! once, then [`Engine::step`](engine::Engine::step) repeatedly. Units
//! exchange values through the uniform get/put surface, wired together
//! with [`Engine::patch`](engine::Engine::patch); units registered
//! earlier step earlier, and that order decides whether a reader sees a
//! source's this-step or previous-step output.
//!
//! # Module Structure
//!
//! - [`engine`] - the scheduler: registration, timestep, sample-rate governor
//! - [`unit`] - the `Unit` trait and its capability traits
//! - [`tick`] - per-step context handed to units
//! - [`events`] - event kinds and the bounded listener table
//! - [`settings`] - TOML-loadable engine settings
//! - [`error`] - error types
//! - [`filters`] - smoothing, normalization and rescaling filters
//! - [`osc`] - square/triangle/sine wave oscillators
//! - [`time`] - chronometers, timers, alarms, metronomes, ramps
//! - [`detect`] - peak detectors and thresholders
//! - [`fields`] - proportion-indexed fields
//!
//! # Example
//!
//! ```
//! use cadence_core::clock::ManualClock;
//! use cadence_runtime::engine::Engine;
//! use cadence_runtime::filters::Smoother;
//! use cadence_runtime::osc::TriangleWave;
//!
//! let mut engine = Engine::<ManualClock, 8>::new(ManualClock::with_tick(100));
//! let wave = engine.add(TriangleWave::new(2.0)).unwrap();
//! let smooth = engine.add(Smoother::new()).unwrap();
//! engine.patch(wave, smooth).unwrap();
//!
//! engine.begin();
//! for _ in 0..100 {
//!     engine.step();
//! }
//! let _ = engine.value(smooth);
//! ```

pub mod detect;
pub mod engine;
pub mod error;
pub mod events;
pub mod fields;
pub mod filters;
pub mod osc;
pub mod settings;
pub mod tick;
pub mod time;
pub mod unit;

pub use engine::{Engine, UnitKey};
pub use error::{EngineError, SettingsError};
pub use events::EventKind;
pub use settings::EngineSettings;
pub use tick::Tick;
pub use unit::{DigitalUnit, MovingFilterUnit, Timeable, TimeWindowed, Unit};
