//! Particle field configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Span};

/// Default glyph palette, from small dots to large crystals.
const DEFAULT_GLYPHS: &[char] = &['*', '·', '•', '❄', '❅', '❆', '✦', '✧', '°'];

/// Tunables for a particle field.
///
/// Velocities are in surface units per reference frame; `reference_frame_ms`
/// is the frame length the fall speeds were tuned against, so a slower or
/// faster refresh still covers the same distance per second vertically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Target number of particles in the pool.
    pub count: usize,
    /// Particle size range.
    pub size: Span,
    /// Vertical velocity range, strictly positive.
    pub fall_speed: Span,
    /// Horizontal drift velocity range, may be signed.
    pub drift: Span,
    /// Opacity range, within 0.0-1.0.
    pub opacity: Span,
    /// Rotation speed range, radians per frame.
    pub rotation_speed: Span,
    /// Peak wind force.
    pub wind_strength: f32,
    /// Wind oscillation frequency, radians per second.
    pub wind_frequency: f32,
    /// Horizontal damping applied to drift plus wind.
    pub damping: f32,
    /// Frame length the velocities are expressed against.
    pub reference_frame_ms: f32,
    /// How far above the viewport a particle may start.
    pub spawn_margin: f32,
    /// How far below the viewport a particle may travel before respawning.
    pub despawn_margin: f32,
    /// How far past either side a particle may travel before wrapping.
    pub wrap_margin: f32,
    /// Vertical band above the viewport where particles respawn.
    pub respawn_band: Span,
    /// Glyphs a particle may be drawn with.
    pub glyphs: Vec<char>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: 40,
            size: Span::new(8.0, 20.0),
            fall_speed: Span::new(0.5, 2.0),
            drift: Span::new(-0.3, 0.3),
            opacity: Span::new(0.4, 1.0),
            rotation_speed: Span::new(-0.05, 0.05),
            wind_strength: 0.5,
            wind_frequency: 0.3,
            damping: 0.9,
            reference_frame_ms: 16.6,
            spawn_margin: 100.0,
            despawn_margin: 20.0,
            wrap_margin: 20.0,
            respawn_band: Span::new(-100.0, -10.0),
            glyphs: DEFAULT_GLYPHS.to_vec(),
        }
    }
}

impl FieldConfig {
    /// Check every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::ZeroCount);
        }

        check_range("size", self.size, |s| s.min > 0.0, "min must be positive")?;
        check_range(
            "fall_speed",
            self.fall_speed,
            |s| s.min > 0.0,
            "min must be positive",
        )?;
        check_range(
            "opacity",
            self.opacity,
            |s| s.min >= 0.0 && s.max <= 1.0,
            "must lie within 0.0-1.0",
        )?;
        check_ordered("drift", self.drift)?;
        check_ordered("rotation_speed", self.rotation_speed)?;

        if !(self.respawn_band.min <= self.respawn_band.max) {
            return Err(ConfigError::InvalidRange {
                name: "respawn_band",
                min: self.respawn_band.min,
                max: self.respawn_band.max,
                reason: "max must not be below min",
            });
        }
        if self.respawn_band.min < -self.spawn_margin {
            return Err(ConfigError::InvalidRange {
                name: "respawn_band",
                min: self.respawn_band.min,
                max: self.respawn_band.max,
                reason: "must stay within spawn_margin above the viewport",
            });
        }

        check_value("wind_strength", self.wind_strength, |v| v >= 0.0, "non-negative")?;
        check_value("wind_frequency", self.wind_frequency, |v| v >= 0.0, "non-negative")?;
        check_value("damping", self.damping, |v| v >= 0.0, "non-negative")?;
        check_value(
            "reference_frame_ms",
            self.reference_frame_ms,
            |v| v > 0.0,
            "positive",
        )?;
        check_value("spawn_margin", self.spawn_margin, |v| v >= 0.0, "non-negative")?;
        check_value("despawn_margin", self.despawn_margin, |v| v >= 0.0, "non-negative")?;
        check_value("wrap_margin", self.wrap_margin, |v| v >= 0.0, "non-negative")?;

        if self.glyphs.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }

        Ok(())
    }
}

/// `max > min` plus a range-specific rule.
fn check_range(
    name: &'static str,
    span: Span,
    rule: impl Fn(Span) -> bool,
    reason: &'static str,
) -> Result<(), ConfigError> {
    if !(span.max > span.min) {
        return Err(ConfigError::InvalidRange {
            name,
            min: span.min,
            max: span.max,
            reason: "max must exceed min",
        });
    }
    if !rule(span) {
        return Err(ConfigError::InvalidRange {
            name,
            min: span.min,
            max: span.max,
            reason,
        });
    }
    Ok(())
}

/// Signed ranges may be degenerate (`min == max`) but not inverted.
fn check_ordered(name: &'static str, span: Span) -> Result<(), ConfigError> {
    if span.min <= span.max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            name,
            min: span.min,
            max: span.max,
            reason: "max must not be below min",
        })
    }
}

fn check_value(
    name: &'static str,
    value: f32,
    rule: impl Fn(f32) -> bool,
    requirement: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && rule(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value,
            requirement,
        })
    }
}
