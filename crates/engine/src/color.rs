//! Color values and theme/tint resolution.
//!
//! Theme-relative colors resolve through the document's theme palette with
//! a tint applied in HLS space, matching the platform's historical color
//! math (HLSMAX-based, not the 0..1 colorsys convention).

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// HLS components are scaled to 0..=HLSMAX in the platform's color model.
const HLSMAX: f64 = 240.0;
const RGBMAX: f64 = 255.0;

/// A formatting color, either literal or theme-relative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Direct color as an uppercase `RRGGBB` hex string (no `#`).
    Rgb(String),
    /// Palette slot plus tint. Negative tint darkens, non-negative tint
    /// blends toward maximum luminance.
    Theme { index: u8, tint: OrderedFloat<f32> },
}

impl Color {
    pub fn rgb(hex: &str) -> Self {
        // Ignore alpha prefix and '#'
        let trimmed = hex.trim_start_matches('#');
        let tail = if trimmed.len() > 6 {
            &trimmed[trimmed.len() - 6..]
        } else {
            trimmed
        };
        Color::Rgb(tail.to_uppercase())
    }

    pub fn theme(index: u8, tint: f32) -> Self {
        Color::Theme { index, tint: OrderedFloat(tint) }
    }

    /// Resolve to an `RRGGBB` hex string against a palette.
    pub fn resolve(&self, palette: &ThemePalette) -> String {
        match self {
            Color::Rgb(hex) => hex.clone(),
            Color::Theme { index, tint } => {
                theme_and_tint_to_rgb(palette, *index, tint.into_inner() as f64)
            }
        }
    }
}

/// The document's theme palette, in slot order
/// lt1, dk1, lt2, dk2, accent1..accent6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemePalette {
    colors: Vec<String>,
}

impl Default for ThemePalette {
    fn default() -> Self {
        // Office default theme, same values the xlsx importer falls back to.
        Self {
            colors: vec![
                "FFFFFF".into(), // Background 1 (lt1)
                "000000".into(), // Text 1 (dk1)
                "EEECE1".into(), // Background 2 (lt2)
                "1F497D".into(), // Text 2 (dk2)
                "4F81BD".into(), // Accent 1
                "C0504D".into(), // Accent 2
                "9BBB59".into(), // Accent 3
                "8064A2".into(), // Accent 4
                "4BACC6".into(), // Accent 5
                "F79646".into(), // Accent 6
            ],
        }
    }
}

impl ThemePalette {
    pub fn new(colors: Vec<String>) -> Self {
        Self { colors }
    }

    pub fn slot(&self, index: u8) -> &str {
        self.colors
            .get(index as usize)
            .map(|s| s.as_str())
            .unwrap_or("000000")
    }
}

/// Resolve a theme slot plus tint to an `RRGGBB` hex string.
pub fn theme_and_tint_to_rgb(palette: &ThemePalette, index: u8, tint: f64) -> String {
    let (h, l, s) = rgb_hex_to_ms_hls(palette.slot(index));
    let tinted = tint_luminance(tint, l);
    let (r, g, b) = ms_hls_to_rgb(h, tinted, s);
    format!(
        "{:02X}{:02X}{:02X}",
        (r * RGBMAX).round() as u8,
        (g * RGBMAX).round() as u8,
        (b * RGBMAX).round() as u8
    )
}

/// Tint an HLSMAX-based luminance. Negative tint scales luminance down;
/// non-negative tint blends it toward HLSMAX.
fn tint_luminance(tint: f64, lum: f64) -> f64 {
    if tint < 0.0 {
        (lum * (1.0 + tint)).round()
    } else {
        (lum * (1.0 - tint) + (HLSMAX - HLSMAX * (1.0 - tint))).round()
    }
}

fn rgb_hex_to_ms_hls(hex: &str) -> (f64, f64, f64) {
    let tail = if hex.len() > 6 { &hex[hex.len() - 6..] } else { hex };
    let parse = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f64 / RGBMAX;
    let (r, g, b) = if tail.len() == 6 {
        (parse(&tail[0..2]), parse(&tail[2..4]), parse(&tail[4..6]))
    } else {
        (0.0, 0.0, 0.0)
    };
    let (h, l, s) = rgb_to_hls(r, g, b);
    ((h * HLSMAX).round(), (l * HLSMAX).round(), (s * HLSMAX).round())
}

fn ms_hls_to_rgb(h: f64, l: f64, s: f64) -> (f64, f64, f64) {
    hls_to_rgb(h / HLSMAX, l / HLSMAX, s / HLSMAX)
}

// RGB <-> HLS in 0..1 space.

fn rgb_to_hls(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let l = (minc + maxc) / 2.0;
    if (maxc - minc).abs() < f64::EPSILON {
        return (0.0, l, 0.0);
    }
    let delta = maxc - minc;
    let s = if l <= 0.5 {
        delta / (maxc + minc)
    } else {
        delta / (2.0 - maxc - minc)
    };
    let rc = (maxc - r) / delta;
    let gc = (maxc - g) / delta;
    let bc = (maxc - b) / delta;
    let h = if (r - maxc).abs() < f64::EPSILON {
        bc - gc
    } else if (g - maxc).abs() < f64::EPSILON {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    ((h / 6.0).rem_euclid(1.0), l, s)
}

fn hls_to_rgb(h: f64, l: f64, s: f64) -> (f64, f64, f64) {
    if s.abs() < f64::EPSILON {
        return (l, l, l);
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    (
        hls_component(m1, m2, h + 1.0 / 3.0),
        hls_component(m1, m2, h),
        hls_component(m1, m2, h - 1.0 / 3.0),
    )
}

fn hls_component(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_passthrough_strips_alpha_and_hash() {
        assert_eq!(Color::rgb("#FF00FF"), Color::Rgb("FF00FF".into()));
        assert_eq!(Color::rgb("00ff00ff"), Color::Rgb("FF00FF".into()));
    }

    #[test]
    fn zero_tint_returns_palette_slot() {
        let palette = ThemePalette::default();
        assert_eq!(theme_and_tint_to_rgb(&palette, 0, 0.0), "FFFFFF");
        assert_eq!(theme_and_tint_to_rgb(&palette, 1, 0.0), "000000");
    }

    #[test]
    fn negative_tint_darkens() {
        let palette = ThemePalette::default();
        let base = theme_and_tint_to_rgb(&palette, 4, 0.0);
        let dark = theme_and_tint_to_rgb(&palette, 4, -0.5);
        assert!(u32::from_str_radix(&dark, 16).unwrap() < u32::from_str_radix(&base, 16).unwrap());
    }

    #[test]
    fn positive_tint_lightens_toward_white() {
        let palette = ThemePalette::default();
        // Full tint of any slot saturates luminance.
        assert_eq!(theme_and_tint_to_rgb(&palette, 4, 1.0), "FFFFFF");
    }

    #[test]
    fn hls_round_trip_is_stable() {
        // HLSMAX quantization is lossy for some slots; these survive exactly.
        for hex in ["C0504D", "9BBB59", "8064A2", "EEECE1", "000000", "FFFFFF"] {
            let palette = ThemePalette::new(vec![hex.to_string()]);
            assert_eq!(theme_and_tint_to_rgb(&palette, 0, 0.0), hex);
        }
    }
}
