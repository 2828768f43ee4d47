//! Render target abstraction.

use flurry_core::Bounds;
use thiserror::Error;

use crate::Particle;

/// Everything a render target needs to place one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub opacity: f32,
    pub rotation: f32,
    pub glyph: char,
}

impl From<&Particle> for Sprite {
    fn from(p: &Particle) -> Self {
        Self {
            id: p.id,
            x: p.x,
            y: p.y,
            size: p.size,
            opacity: p.opacity,
            rotation: p.rotation,
            glyph: p.glyph(),
        }
    }
}

/// A drawable surface owned exclusively by one particle field.
pub trait RenderTarget {
    /// Erase everything drawn so far.
    fn clear(&mut self);

    /// Draw one particle.
    fn draw_glyph(&mut self, sprite: &Sprite);

    /// Resize the surface to the viewport.
    fn fit(&mut self, _bounds: Bounds) {}

    /// Drop any per-particle resources held for `id`.
    fn release(&mut self, _id: u64) {}
}

/// The environment could not provide something the field needs.
///
/// This is the only failure class the field knows about. It is logged and
/// the operation becomes a no-op; it never reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Unavailable {
    #[error("render target is not attached")]
    RenderTarget,
    #[error("viewport reported unusable bounds {width}x{height}")]
    Viewport { width: f32, height: f32 },
}

/// Render target that remembers what it was asked to do.
///
/// Useful for headless hosts and for inspecting a field's output.
#[derive(Debug, Default, Clone)]
pub struct RecordingTarget {
    /// Sprites drawn since the last clear.
    pub drawn: Vec<Sprite>,
    /// Ids passed to `release`, in order.
    pub released: Vec<u64>,
    /// Number of `clear` calls.
    pub clears: usize,
    /// Last bounds passed to `fit`.
    pub bounds: Option<Bounds>,
}

impl RenderTarget for RecordingTarget {
    fn clear(&mut self) {
        self.drawn.clear();
        self.clears += 1;
    }

    fn draw_glyph(&mut self, sprite: &Sprite) {
        self.drawn.push(*sprite);
    }

    fn fit(&mut self, bounds: Bounds) {
        self.bounds = Some(bounds);
    }

    fn release(&mut self, id: u64) {
        self.released.push(id);
    }
}
