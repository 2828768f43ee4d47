//! Core types shared by the flurry crates.
//!
//! Geometry, the particle field configuration and the small user-facing
//! enums (speed, colour theme, resize policy) live here so the config loader
//! and the field itself agree on a single definition.

mod error;
mod field_config;
mod geometry;
mod settings;

pub use error::ConfigError;
pub use field_config::FieldConfig;
pub use geometry::{Bounds, Span};
pub use settings::{AnimationSpeed, ColorTheme, ResizePolicy};
