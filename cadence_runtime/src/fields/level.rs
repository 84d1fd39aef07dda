//! Level field.

use cadence_core::easing::EasingFn;
use cadence_core::map::{constrain01, map_to_01_clamped};

use crate::fields::Field;
use crate::tick::Tick;
use crate::unit::Unit;

/// A spatial field split by a level: positions at or below the level read
/// one state, positions above the other. Optional left/right skews turn
/// the hard edge into a ramp around the level, with optional easing.
///
/// The level is the unit's value; `put()` moves it.
#[derive(Debug, Clone, Copy)]
pub struct LevelField {
    level: f32,
    left_skew: f32,
    right_skew: f32,
    falling: bool,
    easing: Option<EasingFn>,
}

impl Default for LevelField {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelField {
    /// Falling field at level 0 with a hard edge.
    pub fn new() -> Self {
        Self {
            level: 0.0,
            left_skew: 0.0,
            right_skew: 0.0,
            falling: true,
            easing: None,
        }
    }

    /// Moves the level (clamped to [0, 1]).
    pub fn set_level(&mut self, level: f32) {
        self.level = constrain01(level);
    }

    /// Current level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Widens the ramp on the low side of the level (fraction in [0, 1]).
    pub fn set_left_skew(&mut self, skew: f32) {
        self.left_skew = constrain01(skew);
    }

    /// Widens the ramp on the high side of the level (fraction in [0, 1]).
    pub fn set_right_skew(&mut self, skew: f32) {
        self.right_skew = constrain01(skew);
    }

    /// High below the level, low above (default).
    pub fn falling(&mut self) {
        self.falling = true;
    }

    /// Low below the level, high above.
    pub fn rising(&mut self) {
        self.falling = false;
    }

    /// Sets the easing curve applied to the ramp (`None` = linear).
    pub fn set_easing(&mut self, easing: Option<EasingFn>) {
        self.easing = easing;
    }
}

impl Field for LevelField {
    fn at(&self, proportion: f32) -> f32 {
        // Hard edge when no skew.
        if self.left_skew == 0.0 && self.right_skew == 0.0 {
            return if (proportion <= self.level) != self.falling {
                0.0
            } else {
                1.0
            };
        }

        // Ramp spanning from below the level (left skew) to above it
        // (right skew).
        let start = self.level * (1.0 - self.left_skew);
        let end = self.level * (1.0 - self.right_skew) + self.right_skew;
        let mut ramp = map_to_01_clamped(proportion, start, end);
        if let Some(ease) = self.easing {
            ramp = ease(ramp);
        }
        if self.falling {
            ramp = 1.0 - ramp;
        }
        ramp
    }
}

impl Unit for LevelField {
    fn step(&mut self, _tick: &mut Tick) {}

    fn value(&self) -> f32 {
        self.level
    }

    fn put(&mut self, value: f32) -> f32 {
        self.set_level(value);
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_edge_splits_the_field() {
        let mut field = LevelField::new();
        field.set_level(0.5);
        // Falling: high at or below the level.
        assert_eq!(field.at(0.2), 1.0);
        assert_eq!(field.at(0.5), 1.0);
        assert_eq!(field.at(0.8), 0.0);

        field.rising();
        assert_eq!(field.at(0.2), 0.0);
        assert_eq!(field.at(0.8), 1.0);
    }

    #[test]
    fn skew_turns_edge_into_ramp() {
        let mut field = LevelField::new();
        field.set_level(0.5);
        field.set_left_skew(0.5);
        field.set_right_skew(0.5);
        // Ramp from 0.25 to 0.75, inverted by the falling default.
        assert_eq!(field.at(0.0), 1.0);
        assert!((field.at(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(field.at(1.0), 0.0);
    }

    #[test]
    fn put_moves_the_level() {
        let mut field = LevelField::new();
        field.put(0.7);
        assert_eq!(field.level(), 0.7);
        field.put(1.4);
        assert_eq!(field.level(), 1.0);
    }

    #[test]
    fn populate_samples_cell_centers() {
        let mut field = LevelField::new();
        field.set_level(0.5);
        let mut cells = [0.0f32; 4];
        field.populate(&mut cells);
        // Cell centers 0.125, 0.375, 0.625, 0.875 against level 0.5.
        assert_eq!(cells, [1.0, 1.0, 0.0, 0.0]);
    }
}
