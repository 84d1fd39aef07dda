//! Pivot field.

use cadence_core::easing::EasingFn;
use cadence_core::map::{constrain01, map_to_01};

use crate::fields::Field;
use crate::tick::Tick;
use crate::unit::Unit;

/// Shape of a pivot field around its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotMode {
    /// Low before the value, high after.
    Rising,
    /// High before the value, low after (default).
    #[default]
    Falling,
    /// High inside a band around the value, low outside.
    Bump,
    /// Low inside a band around the value, high outside.
    Notch,
}

/// A spatial field pivoting around a center: positions are first remapped
/// relative to the center, then compared to the field's value as an edge
/// (rising/falling) or a band (bump/notch). A ramp width softens the
/// transition; the ramp shift slides the ramp across the edge.
#[derive(Debug, Clone, Copy)]
pub struct PivotField {
    mode: PivotMode,
    value: f32,
    center: f32,
    ramp_width: f32,
    ramp_shift: f32,
    half_bump_width: f32,
    easing: Option<EasingFn>,
}

impl Default for PivotField {
    fn default() -> Self {
        Self::new()
    }
}

impl PivotField {
    /// Falling field pivoting around 0.5 with a hard edge.
    pub fn new() -> Self {
        Self {
            mode: PivotMode::Falling,
            value: 0.0,
            center: 0.5,
            ramp_width: 0.0,
            ramp_shift: 0.5,
            half_bump_width: 0.125,
            easing: None,
        }
    }

    /// Sets the field shape.
    pub fn set_mode(&mut self, mode: PivotMode) {
        self.mode = mode;
    }

    /// Field shape.
    pub fn mode(&self) -> PivotMode {
        self.mode
    }

    /// Sets the pivot center (clamped to [0, 1]).
    pub fn set_center(&mut self, center: f32) {
        self.center = constrain01(center);
    }

    /// Pivot center.
    pub fn center(&self) -> f32 {
        self.center
    }

    /// Sets the ramp width (fraction in [0, 1]; 0 = hard edge).
    pub fn set_ramp_width(&mut self, width: f32) {
        self.ramp_width = constrain01(width);
    }

    /// Slides the ramp across the edge (0 = fully before, 1 = fully
    /// after, 0.5 = centered).
    pub fn set_ramp_shift(&mut self, shift: f32) {
        self.ramp_shift = constrain01(shift);
    }

    /// Sets the bump/notch band width (fraction in [0, 1]).
    pub fn set_bump_width(&mut self, width: f32) {
        self.half_bump_width = constrain01(width) / 2.0;
    }

    /// Sets the easing curve applied to the ramp (`None` = linear).
    pub fn set_easing(&mut self, easing: Option<EasingFn>) {
        self.easing = easing;
    }

    // Remaps a proportion to [0, 1] relative to a center: the center maps
    // to 0, the nearest extremity to 1.
    fn remap_from_center(proportion: f32, center: f32) -> f32 {
        map_to_01(
            proportion,
            center,
            if proportion < center { 0.0 } else { 1.0 },
        )
    }

    // Ramp positioned by width and shift around `edge`.
    fn ramp(&self, proportion: f32, edge: f32) -> f32 {
        constrain01((proportion - edge) / self.ramp_width - 2.0 * self.ramp_shift + 1.5)
    }
}

impl Field for PivotField {
    fn at(&self, proportion: f32) -> f32 {
        let bump_mode = matches!(self.mode, PivotMode::Bump | PivotMode::Notch);
        let falling = matches!(self.mode, PivotMode::Falling | PivotMode::Bump);

        let proportion = Self::remap_from_center(proportion, self.center);

        // Hard edge / band.
        if self.ramp_width <= 0.0 {
            let inside = if bump_mode {
                (proportion - self.value).abs() < self.half_bump_width
            } else {
                proportion <= self.value
            };
            return if inside != falling { 0.0 } else { 1.0 };
        }

        // Ramped edge / band.
        let mut ramp = if bump_mode {
            let remapped = Self::remap_from_center(proportion, self.value);
            self.ramp(remapped, self.half_bump_width)
        } else {
            self.ramp(proportion, self.value)
        };
        if let Some(ease) = self.easing {
            ramp = ease(ramp);
        }
        if falling {
            ramp = 1.0 - ramp;
        }
        ramp
    }
}

impl Unit for PivotField {
    fn step(&mut self, _tick: &mut Tick) {}

    fn value(&self) -> f32 {
        self.value
    }

    fn put(&mut self, value: f32) -> f32 {
        self.value = constrain01(value);
        self.value
    }
}
