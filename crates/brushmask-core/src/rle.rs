//! Run-length encoding of mask coverage.
//!
//! A mask is scanned in row-major order and reduced to a flat sequence of run
//! lengths that alternate between empty and painted pixels, always starting
//! with an empty run (which may be zero):
//!
//! ```text
//! [empty, painted, empty, painted, ...]
//! ```
//!
//! Only coverage (alpha > 0) is encoded. The paint color is supplied again on
//! decode, so partial alpha and color variation are not preserved.

use crate::color::MaskColor;
use crate::error::DecodeError;
use crate::raster::RasterBuffer;
use serde::{Deserialize, Serialize};

/// Flat run-length sequence. Serializes as a plain JSON array.
pub type RleSequence = Vec<u32>;

/// Encode the coverage of a bitmap.
///
/// A 0x0 bitmap encodes to an empty sequence.
pub fn encode(bitmap: &RasterBuffer) -> RleSequence {
    encode_coverage(bitmap.data().chunks_exact(4).map(|px| px[3] > 0))
}

/// Encode a row-major coverage iterator.
pub fn encode_coverage(coverage: impl IntoIterator<Item = bool>) -> RleSequence {
    let mut runs = Vec::new();
    let mut painted = false;
    let mut count: u32 = 0;
    let mut seen_any = false;

    for value in coverage {
        seen_any = true;
        if value != painted {
            runs.push(count);
            count = 0;
            painted = value;
        }
        count += 1;
    }

    if seen_any {
        runs.push(count);
    }
    runs
}

/// Decode a run sequence into a `width` x `height` bitmap filled with `color`.
///
/// An empty sequence decodes to a blank mask. The runs must cover exactly
/// `width * height` pixels; no partial bitmap is returned otherwise.
pub fn decode(
    runs: &[u32],
    width: u32,
    height: u32,
    color: MaskColor,
) -> Result<RasterBuffer, DecodeError> {
    let expected = check_runs(runs, width, height)?;

    let mut mask = vec![false; expected as usize];
    let mut idx = 0usize;
    for (i, &run) in runs.iter().enumerate() {
        let end = idx + run as usize;
        if i % 2 == 1 {
            mask[idx..end].fill(true);
        }
        idx = end;
    }

    // Length was checked above, so this cannot fail.
    Ok(RasterBuffer::from_mask(width, height, &mask, color)
        .unwrap_or_else(|| RasterBuffer::new(width, height)))
}

/// Check that `runs` covers exactly `width * height` pixels. Returns the pixel count.
fn check_runs(runs: &[u32], width: u32, height: u32) -> Result<u64, DecodeError> {
    let expected = width as u64 * height as u64;
    let actual: u64 = runs.iter().map(|&r| r as u64).sum();

    if actual > expected {
        return Err(DecodeError::Overflow {
            width,
            height,
            expected,
            actual,
        });
    }
    if !runs.is_empty() && actual < expected {
        return Err(DecodeError::Truncated {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(expected)
}

/// Number of painted pixels described by a run sequence (the odd runs).
pub fn painted_area(runs: &[u32]) -> u64 {
    runs.iter().skip(1).step_by(2).map(|&r| r as u64).sum()
}

/// An RLE-encoded mask together with the size it was encoded at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleMask {
    pub width: u32,
    pub height: u32,
    pub runs: RleSequence,
}

impl RleMask {
    /// Encode a bitmap.
    pub fn from_bitmap(bitmap: &RasterBuffer) -> Self {
        Self {
            width: bitmap.width(),
            height: bitmap.height(),
            runs: encode(bitmap),
        }
    }

    /// Wrap a sequence received from the wire, validating it against the size.
    pub fn new(width: u32, height: u32, runs: RleSequence) -> Result<Self, DecodeError> {
        let mask = Self {
            width,
            height,
            runs,
        };
        mask.validate()?;
        Ok(mask)
    }

    /// Check that the runs cover exactly the declared size.
    pub fn validate(&self) -> Result<(), DecodeError> {
        check_runs(&self.runs, self.width, self.height).map(|_| ())
    }

    /// Decode into a bitmap filled with `color`.
    pub fn decode(&self, color: MaskColor) -> Result<RasterBuffer, DecodeError> {
        decode(&self.runs, self.width, self.height, color)
    }

    /// Check if the mask has no painted pixels.
    pub fn is_blank(&self) -> bool {
        self.painted_area() == 0
    }

    pub fn painted_area(&self) -> u64 {
        painted_area(&self.runs)
    }
}
