//! Mask fill colors.

use crate::error::{MaskError, MaskResult};
use peniko::Color;
use peniko::color::{Srgb, parse_color};
use serde::{Deserialize, Serialize};

/// Serializable RGBA8 color used to fill painted mask pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl MaskColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a CSS color string (`#f00`, `#ff0000`, `rgba(255, 0, 0, 0.5)`, `red`, ...).
    pub fn parse(css: &str) -> MaskResult<Self> {
        let parsed = parse_color(css.trim())
            .map_err(|e| MaskError::Color(format!("{css}: {e}")))?;
        Ok(parsed.to_alpha_color::<Srgb>().into())
    }

    /// RGBA components as an array (the `colorParts` of a region).
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Opaque version of this color; painted mask pixels never carry partial alpha.
    pub fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }

    /// Hex string of the RGB components, e.g. `#ff0000`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for MaskColor {
    fn default() -> Self {
        Self::new(255, 0, 0, 255)
    }
}

impl From<Color> for MaskColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<MaskColor> for Color {
    fn from(color: MaskColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let color = MaskColor::parse("#00ff80").unwrap();
        assert_eq!(color, MaskColor::new(0, 255, 128, 255));
    }

    #[test]
    fn test_parse_rgba() {
        let color = MaskColor::parse("rgba(10, 20, 30, 0.5)").unwrap();
        assert_eq!((color.r, color.g, color.b), (10, 20, 30));
        assert!(color.a > 120 && color.a < 135);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            MaskColor::parse("not a color"),
            Err(MaskError::Color(_))
        ));
    }

    #[test]
    fn test_hex_drops_alpha() {
        let color = MaskColor::new(255, 0, 16, 40);
        assert_eq!(color.to_hex(), "#ff0010");
        assert_eq!(color.opaque().a, 255);
    }

    #[test]
    fn test_peniko_roundtrip() {
        let color = MaskColor::new(1, 2, 3, 4);
        let peniko: Color = color.into();
        assert_eq!(MaskColor::from(peniko), color);
    }
}
