//! Brush configuration.

use crate::color::MaskColor;
use crate::error::{MaskError, MaskResult};
use crate::stroke::DEFAULT_STROKE_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

fn default_opacity() -> f64 {
    0.6
}

fn default_color() -> String {
    "#ff0000".to_string()
}

fn default_min_stage_size() -> f64 {
    1.0
}

/// Defaults applied to new mask regions and strokes.
///
/// Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushConfig {
    /// Brush line width in pixels.
    #[serde(default = "default_width")]
    pub stroke_width: f64,
    /// Eraser line width in pixels.
    #[serde(default = "default_width")]
    pub eraser_size: f64,
    /// Display opacity of mask regions (0.0 - 1.0).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// CSS color used when a region has no style.
    #[serde(default = "default_color")]
    pub color: String,
    /// Stage sizes at or below this are treated as not yet laid out.
    #[serde(default = "default_min_stage_size")]
    pub min_stage_size: f64,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            stroke_width: default_width(),
            eraser_size: default_width(),
            opacity: default_opacity(),
            color: default_color(),
            min_stage_size: default_min_stage_size(),
        }
    }
}

impl BrushConfig {
    /// Parse a JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> MaskResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MaskError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> MaskResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MaskError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&json)?;
        log::debug!("Loaded brush config from {}", path.display());
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> MaskResult<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(MaskError::Config(format!(
                "opacity must be within 0..=1, got {}",
                self.opacity
            )));
        }
        if !(self.stroke_width > 0.0) || !(self.eraser_size > 0.0) {
            return Err(MaskError::Config(
                "stroke_width and eraser_size must be positive".to_string(),
            ));
        }
        self.mask_color()?;
        Ok(())
    }

    /// Parsed default color.
    pub fn mask_color(&self) -> MaskResult<MaskColor> {
        MaskColor::parse(&self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BrushConfig::default();
        assert_eq!(config.stroke_width, 25.0);
        assert_eq!(config.opacity, 0.6);
        assert_eq!(config.mask_color().unwrap(), MaskColor::new(255, 0, 0, 255));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = BrushConfig::from_json_str(r#"{ "opacity": 0.3, "color": "blue" }"#).unwrap();
        assert_eq!(config.opacity, 0.3);
        assert_eq!(config.stroke_width, 25.0);
        assert_eq!(config.mask_color().unwrap(), MaskColor::new(0, 0, 255, 255));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(BrushConfig::from_json_str(r#"{ "opacity": 2 }"#).is_err());
        assert!(BrushConfig::from_json_str(r#"{ "stroke_width": 0 }"#).is_err());
        assert!(BrushConfig::from_json_str(r#"{ "color": "nope" }"#).is_err());
        assert!(matches!(
            BrushConfig::from_json_str("not json"),
            Err(MaskError::Config(_))
        ));
    }
}
