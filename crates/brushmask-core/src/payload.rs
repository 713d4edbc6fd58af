//! Wire format of serialized mask regions.
//!
//! ```json
//! {
//!   "original_width": 1920,
//!   "original_height": 1280,
//!   "image_rotation": 0,
//!   "value": { "format": "rle", "rle": [0, 1, 1, 2, 3] }
//! }
//! ```
//!
//! `value.touches` is only present in fast (unflattened) serialization. When a
//! value carries both `rle` and `touches`, the touches are newer and consumers
//! should prefer them; the `rle` is the base they were drawn on.

use crate::error::{DecodeError, MaskError, MaskResult};
use crate::rle::{RleMask, RleSequence};
use crate::stroke::Stroke;
use serde::{Deserialize, Serialize};

/// The only mask format produced and accepted.
pub const RLE_FORMAT: &str = "rle";

fn rle_format() -> String {
    RLE_FORMAT.to_string()
}

/// Value part of a mask region result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskValue {
    #[serde(default = "rle_format")]
    pub format: String,
    #[serde(default)]
    pub rle: RleSequence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touches: Option<Vec<Stroke>>,
}

impl MaskValue {
    /// A flattened value.
    pub fn rle(rle: RleSequence) -> Self {
        Self {
            format: rle_format(),
            rle,
            touches: None,
        }
    }

    /// Check if the value describes a brush mask (it has an RLE or touches).
    pub fn is_mask_value(&self) -> bool {
        !self.rle.is_empty() || self.touches.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// A serialized mask region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPayload {
    /// Natural image width in pixels.
    pub original_width: u32,
    /// Natural image height in pixels.
    pub original_height: u32,
    /// Image rotation in degrees.
    #[serde(default)]
    pub image_rotation: f64,
    pub value: MaskValue,
}

impl RegionPayload {
    /// Parse a payload from JSON.
    pub fn from_json(json: &str) -> MaskResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> MaskResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> MaskResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The validated RLE of this payload, or `None` when it carries none.
    pub fn rle_mask(&self) -> MaskResult<Option<RleMask>> {
        if self.value.format != RLE_FORMAT {
            return Err(DecodeError::UnsupportedFormat(self.value.format.clone()).into());
        }
        if self.value.rle.is_empty() {
            return Ok(None);
        }
        RleMask::new(
            self.original_width,
            self.original_height,
            self.value.rle.clone(),
        )
        .map(Some)
        .map_err(MaskError::from)
    }

    /// Strokes carried by a fast serialization.
    pub fn touches(&self) -> &[Stroke] {
        self.value.touches.as_deref().unwrap_or_default()
    }
}
