//! Brush strokes.

use crate::coords::{from_percentage, percent_of, to_display, to_percentage};
use crate::raster::CompositeMode;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 25.0;

/// Identifier of a stroke.
pub type StrokeId = String;

/// Whether a stroke paints or erases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeKind {
    #[default]
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "eraser")]
    Erase,
}

impl StrokeKind {
    /// Composite mode used to paint this kind of stroke.
    pub fn composite_mode(self) -> CompositeMode {
        match self {
            StrokeKind::Add => CompositeMode::SourceOver,
            StrokeKind::Erase => CompositeMode::DestinationOut,
        }
    }
}

fn default_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

fn full_opacity() -> f64 {
    1.0
}

/// A committed stroke (one pointer-down to pointer-up gesture).
///
/// `relative_points` and `relative_stroke_width` are the durable form;
/// `points` and `stroke_width` are re-derived from them for the current stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub(crate) id: StrokeId,
    /// Paint or erase.
    #[serde(rename = "type", default)]
    pub kind: StrokeKind,
    /// Path in display space.
    #[serde(with = "flat_points", default)]
    pub points: Vec<Point>,
    /// Path in percent of the stage size.
    #[serde(with = "flat_points", default)]
    pub relative_points: Vec<Point>,
    /// Line width in display pixels.
    #[serde(default = "default_width")]
    pub stroke_width: f64,
    /// Line width in percent of the stage width.
    #[serde(default = "default_width")]
    pub relative_stroke_width: f64,
    /// Eraser size selected when the stroke was drawn.
    #[serde(default = "default_width")]
    pub eraser_size: f64,
    /// Display opacity requested for the stroke. Painted coverage is always opaque.
    #[serde(skip, default = "full_opacity")]
    pub opacity: f64,
}

impl Stroke {
    /// Create an empty stroke.
    pub fn new(kind: StrokeKind, stroke_width: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            points: Vec::new(),
            relative_points: Vec::new(),
            stroke_width,
            relative_stroke_width: stroke_width,
            eraser_size: DEFAULT_STROKE_WIDTH,
            opacity: 1.0,
        }
    }

    /// Build a stroke from stage-space points.
    ///
    /// Display points are the stage points divided by the group scale; relative
    /// points are percentages of `stage`.
    pub fn from_stage_points(
        kind: StrokeKind,
        stroke_width: f64,
        stage_points: &[Point],
        stage: Size,
        scale: (f64, f64),
    ) -> Self {
        let mut stroke = Self::new(kind, stroke_width);
        stroke.set_stage_points(stage_points, stage, scale);
        stroke
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the path from stage-space points.
    pub fn set_stage_points(&mut self, stage_points: &[Point], stage: Size, scale: (f64, f64)) {
        self.points = stage_points
            .iter()
            .map(|&p| to_display(p, scale.0, scale.1))
            .collect();
        self.relative_points = stage_points
            .iter()
            .map(|&p| to_percentage(p, stage))
            .collect();
        self.relative_stroke_width = percent_of(self.stroke_width, stage.width);
    }

    /// Re-derive display points and width from the relative form for a new stage size.
    pub fn update_image_size(&mut self, stage: Size, scale: (f64, f64)) {
        self.points = self
            .relative_points
            .iter()
            .map(|&rel| to_display(from_percentage(rel, stage), scale.0, scale.1))
            .collect();
        self.stroke_width = self.relative_stroke_width * stage.width / 100.0;
    }

    pub fn composite_mode(&self) -> CompositeMode {
        self.kind.composite_mode()
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Extent of the raw path points, ignoring the stroke width.
    pub fn point_bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let mut bounds = Rect::from_points(*first, *first);
        for point in &self.points[1..] {
            bounds = bounds.union_pt(*point);
        }
        Some(bounds)
    }

    /// Path rescaled from `original_width` to `dest_width`.
    pub fn rescaled_points(&self, original_width: f64, dest_width: f64) -> Vec<Point> {
        rescale(&self.points, original_width, dest_width)
    }

    /// Stroke width rescaled from `original_width` to `dest_width`.
    pub fn scaled_stroke_width(&self, original_width: f64, dest_width: f64) -> f64 {
        scale_factor(original_width, dest_width) * self.stroke_width
    }
}

fn scale_factor(original_width: f64, dest_width: f64) -> f64 {
    if original_width.abs() < f64::EPSILON {
        return 1.0;
    }
    dest_width / original_width
}

/// Uniformly scale points by `dest_width / original_width`.
pub fn rescale(points: &[Point], original_width: f64, dest_width: f64) -> Vec<Point> {
    let s = scale_factor(original_width, dest_width);
    points.iter().map(|p| Point::new(p.x * s, p.y * s)).collect()
}

/// Handle returned when a stroke starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrokeHandle {
    pub id: StrokeId,
    pub kind: StrokeKind,
}

/// The stroke currently being drawn.
///
/// Points are kept in stage space until the stroke is committed.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    id: StrokeId,
    kind: StrokeKind,
    stroke_width: f64,
    opacity: f64,
    stage_points: Vec<Point>,
}

/// Up to this many points the whole path is repainted on each append so the
/// first joins render cleanly.
const FULL_REPAINT_POINTS: usize = 3;

impl StrokeBuilder {
    pub fn new(kind: StrokeKind, stroke_width: f64, opacity: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            stroke_width,
            opacity,
            stage_points: Vec::new(),
        }
    }

    pub fn handle(&self) -> StrokeHandle {
        StrokeHandle {
            id: self.id.clone(),
            kind: self.kind,
        }
    }

    pub fn kind(&self) -> StrokeKind {
        self.kind
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn points(&self) -> &[Point] {
        &self.stage_points
    }

    /// Append a stage-space point and return the path segment to paint for it.
    ///
    /// The first point paints a dot; short paths are repainted whole; longer
    /// paths only paint the segment from the previous point.
    pub fn push(&mut self, point: Point) -> Vec<Point> {
        let segment = match self.stage_points.len() {
            0 => vec![point, point],
            n if n > FULL_REPAINT_POINTS => vec![self.stage_points[n - 1], point],
            _ => {
                let mut path = self.stage_points.clone();
                path.push(point);
                path
            }
        };
        self.stage_points.push(point);
        segment
    }

    /// Close the stroke.
    ///
    /// A single-point path is duplicated so every committed path has at least
    /// two points.
    pub fn finish(mut self, stage: Size, scale: (f64, f64)) -> Stroke {
        if self.stage_points.len() == 1 {
            let only = self.stage_points[0];
            self.stage_points.push(only);
        }
        let mut stroke = Stroke::new(self.kind, self.stroke_width);
        stroke.id = self.id;
        stroke.opacity = self.opacity;
        stroke.set_stage_points(&self.stage_points, stage, scale);
        stroke
    }
}

/// Serde helper storing points as a flat `[x0, y0, x1, y1, ...]` array.
mod flat_points {
    use kurbo::Point;
    use serde::de::Error;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(points.len() * 2))?;
        for point in points {
            seq.serialize_element(&point.x)?;
            seq.serialize_element(&point.y)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        let flat = Vec::<f64>::deserialize(deserializer)?;
        if flat.len() % 2 != 0 {
            return Err(D::Error::custom("point array has an odd number of coordinates"));
        }
        Ok(flat.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect())
    }
}
