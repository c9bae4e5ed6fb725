//! Color scheme shared by all visualizers

use palette::{FromColor, Hsl, Srgb};

use crate::{CoreError, Result};

/// Default dominant color
pub const DEFAULT_DOMINANT: &str = "#ff2d95";
/// Default accent color
pub const DEFAULT_ACCENT: &str = "#00e5ff";

/// Two-color scheme extracted from the album art
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScheme {
    /// Dominant color
    pub dominant: Srgb,
    /// Accent color
    pub accent: Srgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            dominant: Srgb::new(1.0, 45.0 / 255.0, 149.0 / 255.0),
            accent: Srgb::new(0.0, 229.0 / 255.0, 1.0),
        }
    }
}

impl ColorScheme {
    /// Create a scheme from two colors
    pub fn new(dominant: Srgb, accent: Srgb) -> Self {
        Self { dominant, accent }
    }

    /// Parse a scheme from `#rrggbb` strings
    pub fn from_hex(dominant: &str, accent: &str) -> Result<Self> {
        Ok(Self {
            dominant: parse_hex(dominant)?,
            accent: parse_hex(accent)?,
        })
    }

    /// Linear blend from dominant (t = 0) to accent (t = 1)
    pub fn gradient(&self, t: f32) -> Srgb {
        lerp_color(self.dominant, self.accent, t)
    }
}

/// Parse a `#rrggbb` (or `#rgb`) color
pub fn parse_hex(hex: &str) -> Result<Srgb> {
    hex.trim()
        .parse::<Srgb<u8>>()
        .map(|c| c.into_format())
        .map_err(|_| CoreError::InvalidColor(hex.to_string()))
}

/// Format a color as `#rrggbb`
pub fn to_hex(color: Srgb) -> String {
    let c: Srgb<u8> = color.into_format();
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

/// Component-wise interpolation between two colors
pub fn lerp_color(a: Srgb, b: Srgb, t: f32) -> Srgb {
    let t = t.clamp(0.0, 1.0);
    Srgb::new(
        a.red + (b.red - a.red) * t,
        a.green + (b.green - a.green) * t,
        a.blue + (b.blue - a.blue) * t,
    )
}

/// Color from hue (degrees), saturation and lightness (0.0 - 1.0)
pub fn from_hsl(hue_degrees: f32, saturation: f32, lightness: f32) -> Srgb {
    Srgb::from_color(Hsl::new(
        hue_degrees,
        saturation.clamp(0.0, 1.0),
        lightness.clamp(0.0, 1.0),
    ))
}

/// Vertex color with alpha
pub fn rgba(color: Srgb, alpha: f32) -> [f32; 4] {
    [color.red, color.green, color.blue, alpha.clamp(0.0, 1.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let c = parse_hex("#ff8000").unwrap();
        assert!((c.red - 1.0).abs() < 1e-6);
        assert!((c.green - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.blue, 0.0);
        assert_eq!(to_hex(c), "#ff8000");
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(
            parse_hex("not-a-color"),
            Err(CoreError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_default_matches_constants() {
        let parsed = ColorScheme::from_hex(DEFAULT_DOMINANT, DEFAULT_ACCENT).unwrap();
        assert_eq!(to_hex(parsed.dominant), DEFAULT_DOMINANT);
        assert_eq!(to_hex(parsed.accent), DEFAULT_ACCENT);
        assert_eq!(to_hex(ColorScheme::default().dominant), DEFAULT_DOMINANT);
    }

    #[test]
    fn test_gradient_endpoints() {
        let scheme = ColorScheme::default();
        assert_eq!(scheme.gradient(0.0), scheme.dominant);
        assert_eq!(scheme.gradient(1.0), scheme.accent);
        assert_eq!(scheme.gradient(5.0), scheme.accent);
    }

    #[test]
    fn test_hsl_primary() {
        let red = from_hsl(0.0, 1.0, 0.5);
        assert!((red.red - 1.0).abs() < 1e-4);
        assert!(red.green.abs() < 1e-4);
        assert!(red.blue.abs() < 1e-4);
    }
}
