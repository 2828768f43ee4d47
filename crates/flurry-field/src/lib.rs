//! Snowfall particle field for flurry.
//!
//! A [`ParticleField`] owns a fixed pool of snowflakes, advances them on a
//! [`FrameTimer`], recycles the ones that leave the viewport and draws them
//! into a [`RenderTarget`]. A [`ViewportMonitor`] and a [`VisibilityGate`]
//! feed it settled resizes and pause/resume requests through explicit
//! subscriptions.

mod canvas;
mod color;
mod field;
mod particle;
mod render;
mod subscription;
mod timer;
mod viewport;
mod visibility;

pub use canvas::CellCanvas;
pub use color::{flake_color, hsl_to_rgb};
pub use field::ParticleField;
pub use particle::Particle;
pub use render::{RecordingTarget, RenderTarget, Sprite, Unavailable};
pub use subscription::{SubscriberId, Subscribers};
pub use timer::{DEFAULT_FRAME_INTERVAL, FrameTimer};
pub use viewport::{DEFAULT_QUIET_PERIOD, ResizeListener, ViewportMonitor};
pub use visibility::{Visibility, VisibilityGate, VisibilityListener};
