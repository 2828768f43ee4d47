//! A single snowflake.

use flurry_core::{Bounds, FieldConfig, Span};
use rand::Rng;

/// State for a single snowflake.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Creation sequence number; lower is older.
    pub id: u64,
    /// Horizontal position in surface units.
    pub x: f32,
    /// Vertical position in surface units.
    pub y: f32,
    /// Horizontal drift per reference frame.
    pub vx: f32,
    /// Fall speed per reference frame, always positive.
    pub vy: f32,
    pub size: f32,
    pub opacity: f32,
    /// Current rotation in radians.
    pub rotation: f32,
    pub rotation_speed: f32,
    glyph: char,
}

impl Particle {
    /// Create a particle with randomized state.
    ///
    /// `x` is drawn from `[0, width]` and `y` from `spawn_y`.
    pub fn spawn<R: Rng>(
        id: u64,
        rng: &mut R,
        config: &FieldConfig,
        bounds: Bounds,
        spawn_y: Span,
    ) -> Self {
        let glyph = if config.glyphs.is_empty() {
            '*'
        } else {
            config.glyphs[rng.random_range(0..config.glyphs.len())]
        };

        Self {
            id,
            x: sample(rng, Span::new(0.0, bounds.width)),
            y: sample(rng, spawn_y),
            vx: sample(rng, config.drift),
            vy: sample(rng, config.fall_speed),
            size: sample(rng, config.size),
            opacity: sample(rng, config.opacity),
            rotation: sample(rng, Span::new(0.0, std::f32::consts::TAU)),
            rotation_speed: sample(rng, config.rotation_speed),
            glyph,
        }
    }

    /// Glyph chosen at creation.
    pub fn glyph(&self) -> char {
        self.glyph
    }

    /// Move the particle to a fresh point above the viewport.
    pub fn respawn<R: Rng>(&mut self, rng: &mut R, bounds: Bounds, band: Span) {
        self.y = sample(rng, band);
        self.x = sample(rng, Span::new(0.0, bounds.width));
    }
}

/// Uniform sample from a closed interval, tolerating degenerate ranges.
pub(crate) fn sample<R: Rng>(rng: &mut R, span: Span) -> f32 {
    if span.max > span.min {
        rng.random_range(span.min..=span.max)
    } else {
        span.min
    }
}
