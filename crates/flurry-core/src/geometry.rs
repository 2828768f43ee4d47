//! Surface geometry.

use serde::{Deserialize, Serialize};

/// Size of the drawable surface, in surface units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and positive.
    ///
    /// A zero-sized or NaN viewport is what a host reports when it has no
    /// surface to offer, so everything downstream treats it as unavailable.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Closed interval `[min, max]` used for every randomized particle property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Check if the value lies inside the interval (inclusive).
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Linear interpolation between `min` and `max`, `t` in 0.0-1.0.
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    /// Position of `value` inside the interval, clamped to 0.0-1.0.
    pub fn normalize(&self, value: f32) -> f32 {
        let width = self.max - self.min;
        if width <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / width).clamp(0.0, 1.0)
    }
}
