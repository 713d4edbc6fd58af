//! Bounding boxes of painted mask pixels.

use crate::coords::StageTransform;
use crate::raster::RasterBuffer;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in region coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }
}

impl From<Rect> for BBox {
    fn from(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.x1, rect.y1)
    }
}

/// Tight box of painted pixels. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Map viewport pixels back through the stage zoom and pan.
    pub fn unproject(&self, view: &StageTransform) -> BBox {
        let top_left = view.to_stage(Point::new(self.left as f64, self.top as f64));
        BBox::new(
            top_left.x,
            top_left.y,
            top_left.x + self.width() as f64 / view.scale,
            top_left.y + self.height() as f64 / view.scale,
        )
    }
}

/// Compute the tight box of pixels with alpha > 0, or `None` for a blank bitmap.
pub fn compute_bbox(bitmap: &RasterBuffer) -> Option<PixelBox> {
    let width = bitmap.width() as usize;
    if width == 0 {
        return None;
    }
    let mut bounds: Option<PixelBox> = None;

    for (y, row) in bitmap.data().chunks_exact(width * 4).enumerate() {
        let mut alphas = row.chunks_exact(4).map(|px| px[3]);
        let Some(first) = alphas.position(|a| a > 0) else {
            continue;
        };
        let last = row
            .chunks_exact(4)
            .rposition(|px| px[3] > 0)
            .unwrap_or(first);
        let y = y as u32;
        let (first, last) = (first as u32, last as u32);

        bounds = Some(match bounds {
            None => PixelBox {
                left: first,
                top: y,
                right: last + 1,
                bottom: y + 1,
            },
            Some(b) => PixelBox {
                left: b.left.min(first),
                top: b.top,
                right: b.right.max(last + 1),
                bottom: y + 1,
            },
        });
    }
    bounds
}

/// Extent of a point list. Used as an approximate box before any bitmap exists.
pub fn points_bbox(points: &[Point]) -> Option<BBox> {
    let first = *points.first()?;
    let rect = points[1..]
        .iter()
        .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p));
    Some(rect.into())
}
