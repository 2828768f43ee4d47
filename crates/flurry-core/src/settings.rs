//! User-selectable display settings.

use serde::{Deserialize, Serialize};

/// Global animation speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl AnimationSpeed {
    /// Cycle to the next speed.
    pub fn next(self) -> Self {
        match self {
            AnimationSpeed::Slow => AnimationSpeed::Normal,
            AnimationSpeed::Normal => AnimationSpeed::Fast,
            AnimationSpeed::Fast => AnimationSpeed::Slow,
        }
    }

    /// Multiplier applied to the frame delta before it reaches the field.
    pub fn time_scale(self) -> f32 {
        match self {
            AnimationSpeed::Slow => 0.5,
            AnimationSpeed::Normal => 1.0,
            AnimationSpeed::Fast => 2.0,
        }
    }

    /// Short label for the status line.
    pub fn label(self) -> &'static str {
        match self {
            AnimationSpeed::Slow => "slow",
            AnimationSpeed::Normal => "normal",
            AnimationSpeed::Fast => "fast",
        }
    }
}

/// Tint used for the snowflakes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Frost,
    Ice,
    Mint,
    Rose,
    Gold,
    Mono,
}

impl ColorTheme {
    /// Cycle to the next color theme.
    pub fn next(self) -> Self {
        match self {
            ColorTheme::Frost => ColorTheme::Ice,
            ColorTheme::Ice => ColorTheme::Mint,
            ColorTheme::Mint => ColorTheme::Rose,
            ColorTheme::Rose => ColorTheme::Gold,
            ColorTheme::Gold => ColorTheme::Mono,
            ColorTheme::Mono => ColorTheme::Frost,
        }
    }

    /// Hue in degrees (0-360).
    pub fn hue(self) -> f32 {
        match self {
            ColorTheme::Frost => 215.0,
            ColorTheme::Ice => 190.0,
            ColorTheme::Mint => 150.0,
            ColorTheme::Rose => 340.0,
            ColorTheme::Gold => 45.0,
            ColorTheme::Mono => 0.0,
        }
    }

    /// Saturation (0.0-1.0).
    pub fn saturation(self) -> f32 {
        match self {
            ColorTheme::Mono => 0.0,
            ColorTheme::Gold => 0.8,
            _ => 0.7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorTheme::Frost => "frost",
            ColorTheme::Ice => "ice",
            ColorTheme::Mint => "mint",
            ColorTheme::Rose => "rose",
            ColorTheme::Gold => "gold",
            ColorTheme::Mono => "mono",
        }
    }
}

/// What the field does once a viewport resize has settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Tear the pool down and create it again for the new bounds.
    #[default]
    Rebuild,
    /// Keep particles where they are; only respawn/wrap use the new bounds.
    Retain,
}
