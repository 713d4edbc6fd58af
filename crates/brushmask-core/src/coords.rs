//! Coordinate spaces for brush masks.
//!
//! Three spaces are in play:
//!
//! - **Stage space**: pixel coordinates on the image stage at full zoom. The
//!   viewport shows this space through a [`StageTransform`] (zoom + pan).
//! - **Percentage space**: stage coordinates as percentages (0–100) of the stage
//!   size. Independent of resolution; this is what strokes persist.
//! - **Display space**: stage coordinates divided by the region's own
//!   `scale_x`/`scale_y`, because strokes live inside a scaled group.

use crate::host::ImageObject;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom and pan of the stage viewport.
///
/// Converts between stage coordinates and viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTransform {
    /// Pan offset in viewport pixels (`zoomingPositionX/Y`).
    pub offset: Vec2,
    /// Zoom factor (`stageScale`).
    pub scale: f64,
}

impl Default for StageTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl StageTransform {
    pub fn new(scale: f64, offset: Vec2) -> Self {
        Self { offset, scale }
    }

    /// Transform from stage coordinates to viewport pixels.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Transform from viewport pixels to stage coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Stage point to viewport pixels (`zoomOriginalCoords`).
    pub fn to_viewport(&self, stage_point: Point) -> Point {
        self.transform() * stage_point
    }

    /// Viewport pixels to stage point.
    pub fn to_stage(&self, viewport_point: Point) -> Point {
        self.inverse_transform() * viewport_point
    }

    /// Check if this transform is the identity.
    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < f64::EPSILON && self.offset == Vec2::ZERO
    }
}

/// Stage point to percentage of the stage size.
pub fn to_percentage(stage_point: Point, stage: Size) -> Point {
    Point::new(
        percent_of(stage_point.x, stage.width),
        percent_of(stage_point.y, stage.height),
    )
}

/// Percentage of the stage size to stage point.
pub fn from_percentage(relative: Point, stage: Size) -> Point {
    Point::new(relative.x * stage.width / 100.0, relative.y * stage.height / 100.0)
}

/// Length in pixels to percentage of `extent`.
pub fn percent_of(value: f64, extent: f64) -> f64 {
    if extent.abs() < f64::EPSILON {
        return 0.0;
    }
    value / extent * 100.0
}

/// Stage point to display space of a group scaled by (`scale_x`, `scale_y`).
pub fn to_display(stage_point: Point, scale_x: f64, scale_y: f64) -> Point {
    Point::new(stage_point.x / scale_x, stage_point.y / scale_y)
}

/// Display point back to stage space.
pub fn from_display(display_point: Point, scale_x: f64, scale_y: f64) -> Point {
    Point::new(display_point.x * scale_x, display_point.y * scale_y)
}

/// Snapshot of the image object that region operations work against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageGeometry {
    /// Natural image size in pixels.
    pub natural: Size,
    /// Stage size at full zoom.
    pub stage: Size,
    /// Image rotation in degrees.
    pub rotation: f64,
    /// Viewport zoom and pan.
    pub view: StageTransform,
}

impl StageGeometry {
    /// Capture the current geometry of an image object.
    pub fn from_object<O: ImageObject + ?Sized>(object: &O) -> Self {
        Self {
            natural: Size::new(object.natural_width(), object.natural_height()),
            stage: Size::new(object.stage_width(), object.stage_height()),
            rotation: object.rotation(),
            view: StageTransform::new(
                object.stage_scale(),
                Vec2::new(object.zooming_position_x(), object.zooming_position_y()),
            ),
        }
    }

    /// Geometry of an unzoomed stage showing the image at natural size.
    pub fn natural(width: f64, height: f64) -> Self {
        Self {
            natural: Size::new(width, height),
            stage: Size::new(width, height),
            rotation: 0.0,
            view: StageTransform::default(),
        }
    }

    /// Check if the stage has been laid out (more than 1x1).
    pub fn has_stage(&self, min_size: f64) -> bool {
        self.stage.width > min_size && self.stage.height > min_size
    }

    /// Natural size rounded to whole pixels.
    pub fn natural_pixels(&self) -> (u32, u32) {
        (
            self.natural.width.round().max(0.0) as u32,
            self.natural.height.round().max(0.0) as u32,
        )
    }

    /// Viewport size in whole pixels (the stage element size).
    pub fn viewport_pixels(&self) -> (u32, u32) {
        (
            self.stage.width.ceil().max(0.0) as u32,
            self.stage.height.ceil().max(0.0) as u32,
        )
    }

    /// Transform from stage space to natural image pixels.
    pub fn stage_to_natural(&self) -> Affine {
        if self.stage.width < f64::EPSILON || self.stage.height < f64::EPSILON {
            return Affine::IDENTITY;
        }
        Affine::scale_non_uniform(
            self.natural.width / self.stage.width,
            self.natural.height / self.stage.height,
        )
    }
}
