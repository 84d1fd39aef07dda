//! # Cadence Core
//!
//! Signal and time primitives for the Cadence reactive-signal runtime.
//! Everything in this crate is pure state + arithmetic: fixed-point phase
//! accumulation, online statistics, easing curves, range mapping, and the
//! overflow-safe microsecond ledger the scheduler builds its clock on.
//!
//! # Module Structure
//!
//! - [`fixed`] - q0.32 fixed-point values and conversions
//! - [`phase`] - phase-accumulator stepping and period/frequency conversions
//! - [`trig`] - fixed-point cosine lookup
//! - [`average`] - exponential moving average machinery and statistics
//! - [`stats`] - true incremental sample statistics
//! - [`easing`] - easing function family
//! - [`map`] - range mapping, constraining and wrapping
//! - [`clock`] - wrapping 32-bit clock sources and the 64-bit fold

pub mod average;
pub mod clock;
pub mod easing;
pub mod fixed;
pub mod map;
pub mod phase;
pub mod stats;
pub mod trig;
