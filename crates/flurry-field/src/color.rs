//! Color utility functions for snowflake tinting.

use flurry_core::ColorTheme;
use ratatui::style::Color;

/// Color for a flake of relative size `size_t` and opacity, both 0.0-1.0.
///
/// Larger flakes are lighter; opacity fades toward the dark background.
pub fn flake_color(theme: ColorTheme, size_t: f32, opacity: f32) -> Color {
    let size_t = size_t.clamp(0.0, 1.0);
    let opacity = opacity.clamp(0.0, 1.0);

    let lightness = (0.35 + size_t * 0.45) * (0.25 + opacity * 0.75);
    hsl_to_rgb(theme.hue(), theme.saturation(), lightness)
}

/// Convert HSL to RGB color.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    if s == 0.0 {
        let v = (l * 255.0) as u8;
        return Color::Rgb(v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    let h = h / 360.0;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    Color::Rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
