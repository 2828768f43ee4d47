//! Configuration validation errors.

use thiserror::Error;

/// A field configuration value outside its allowed range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("particle count must be greater than zero")]
    ZeroCount,

    #[error("{name} range is invalid: min {min}, max {max} ({reason})")]
    InvalidRange {
        name: &'static str,
        min: f32,
        max: f32,
        reason: &'static str,
    },

    #[error("{name} must be {requirement}, got {value}")]
    InvalidValue {
        name: &'static str,
        value: f32,
        requirement: &'static str,
    },

    #[error("glyph palette is empty")]
    EmptyPalette,
}
