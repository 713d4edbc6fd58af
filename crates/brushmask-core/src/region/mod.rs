//! Brush mask regions.
//!
//! A [`MaskRegion`] owns the strokes (or the flattened RLE) of one mask, the
//! viewport bitmap they are composited onto, and the geometry of the image it
//! was drawn on. Capabilities are split into [`Drawable`], [`Serializable`] and
//! [`BoundsProvider`].

mod session;

pub use session::StrokeSession;

use crate::bbox::{BBox, compute_bbox, points_bbox};
use crate::color::MaskColor;
use crate::compositor::{Compositor, RasterCompositor};
use crate::config::BrushConfig;
use crate::coords::{StageGeometry, from_display};
use crate::error::{DecodeError, InvalidState, MaskError, MaskResult};
use crate::host::ImageObject;
use crate::payload::{MaskValue, RLE_FORMAT, RegionPayload};
use crate::raster::RasterBuffer;
use crate::rle::RleMask;
use crate::stroke::{Stroke, StrokeBuilder, StrokeHandle, StrokeId, StrokeKind, rescale};
use kurbo::{Affine, Point};
use uuid::Uuid;

/// Unique identifier for regions.
pub type RegionId = Uuid;

/// Which form of a mask is authoritative.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskRepresentation {
    /// Unflattened strokes, composited in order over an optional flattened base.
    Strokes {
        base: Option<RleMask>,
        strokes: Vec<Stroke>,
    },
    /// Strokes compacted into a single RLE mask.
    Flattened(RleMask),
}

impl Default for MaskRepresentation {
    fn default() -> Self {
        MaskRepresentation::Strokes {
            base: None,
            strokes: Vec::new(),
        }
    }
}

impl MaskRepresentation {
    /// Committed strokes (empty once flattened).
    pub fn strokes(&self) -> &[Stroke] {
        match self {
            MaskRepresentation::Strokes { strokes, .. } => strokes,
            MaskRepresentation::Flattened(_) => &[],
        }
    }

    /// The RLE part: the flattened mask or the base under the strokes.
    pub fn rle(&self) -> Option<&RleMask> {
        match self {
            MaskRepresentation::Strokes { base, .. } => base.as_ref(),
            MaskRepresentation::Flattened(rle) => Some(rle),
        }
    }

    pub fn is_flattened(&self) -> bool {
        matches!(self, MaskRepresentation::Flattened(_))
    }

    fn rle_mut(&mut self) -> Option<&mut RleMask> {
        match self {
            MaskRepresentation::Strokes { base, .. } => base.as_mut(),
            MaskRepresentation::Flattened(rle) => Some(rle),
        }
    }

    /// Mutable strokes, moving a flattened mask into the base first.
    fn strokes_mut(&mut self) -> &mut Vec<Stroke> {
        if let MaskRepresentation::Flattened(_) = self {
            if let MaskRepresentation::Flattened(rle) = std::mem::take(self) {
                *self = MaskRepresentation::Strokes {
                    base: Some(rle),
                    strokes: Vec::new(),
                };
            }
        }
        match self {
            MaskRepresentation::Strokes { strokes, .. } => strokes,
            MaskRepresentation::Flattened(_) => unreachable!("flattened mask was just moved to base"),
        }
    }
}

/// Notifications queued for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskEvent {
    /// A stroke was committed.
    DrawingFinished { stroke_id: StrokeId },
    /// The bitmap was repainted; caches keyed on older generations are stale.
    Repainted { generation: u64 },
    /// Strokes were compacted into an RLE mask.
    Flattened { painted_area: u64 },
}

/// Options for [`Serializable::serialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Skip the full encode and emit the current RLE plus raw touches.
    pub fast: bool,
}

impl SerializeOptions {
    pub fn fast() -> Self {
        Self { fast: true }
    }

    pub fn full() -> Self {
        Self { fast: false }
    }
}

/// Stroke drawing. At most one stroke is active at a time.
pub trait Drawable {
    /// Start a stroke. Fails if one is already active.
    fn begin_stroke(
        &mut self,
        kind: StrokeKind,
        stroke_width: f64,
        opacity: f64,
    ) -> MaskResult<StrokeHandle>;

    /// Append a stage-space point to the active stroke and paint it.
    fn append_point(&mut self, x: f64, y: f64) -> MaskResult<()>;

    /// Close the active stroke and append it to the region.
    fn commit_stroke(&mut self) -> MaskResult<StrokeHandle>;

    /// Check if a stroke is active.
    fn is_drawing(&self) -> bool;
}

/// Conversion to the wire payload.
pub trait Serializable {
    /// Serialize the region. A full serialization of a mask with nothing
    /// painted returns `Ok(None)`; callers omit such regions.
    fn serialize(&self, options: SerializeOptions) -> MaskResult<Option<RegionPayload>>;
}

/// Geometry queries.
pub trait BoundsProvider {
    /// Bounding box in stage coordinates.
    fn bbox_coords(&self) -> Option<BBox>;

    /// Check if a stage point lies on a painted pixel.
    fn hit_test(&self, stage_point: Point) -> bool;
}

/// A freehand mask annotation on an image.
#[derive(Debug, Clone)]
pub struct MaskRegion {
    id: RegionId,
    representation: MaskRepresentation,
    active: Option<StrokeBuilder>,
    color: MaskColor,
    /// Display opacity (0.0 - 1.0).
    opacity: f64,
    /// Scale of the group the strokes are drawn in.
    scale: (f64, f64),
    hidden: bool,
    min_stage_size: f64,
    /// Geometry the strokes and bitmap currently reflect.
    geometry: StageGeometry,
    /// Geometry change received while drawing, applied on commit.
    pending_geometry: Option<StageGeometry>,
    /// Viewport bitmap.
    compositor: RasterCompositor,
    /// Decoded RLE at natural image size.
    mask_bitmap: Option<RasterBuffer>,
    /// Snapshot taken by `cache_image_data`.
    cached_bitmap: Option<RasterBuffer>,
    generation: u64,
    events: Vec<MaskEvent>,
}

impl MaskRegion {
    /// Create an empty region on `object`.
    pub fn new<O: ImageObject + ?Sized>(object: &O, config: &BrushConfig) -> MaskResult<Self> {
        let color = config.mask_color()?;
        let geometry = StageGeometry::from_object(object);
        let (width, height) = geometry.viewport_pixels();
        Ok(Self {
            id: Uuid::new_v4(),
            representation: MaskRepresentation::default(),
            active: None,
            color,
            opacity: config.opacity.clamp(0.0, 1.0),
            scale: (1.0, 1.0),
            hidden: false,
            min_stage_size: config.min_stage_size,
            geometry,
            pending_geometry: None,
            compositor: RasterCompositor::new(width, height, color),
            mask_bitmap: None,
            cached_bitmap: None,
            generation: 0,
            events: Vec::new(),
        })
    }

    /// Restore a region from its payload.
    ///
    /// Touches are re-projected from their relative points onto the current stage.
    pub fn from_payload<O: ImageObject + ?Sized>(
        payload: &RegionPayload,
        object: &O,
        config: &BrushConfig,
    ) -> MaskResult<Self> {
        let mut region = Self::new(object, config)?;
        let rle = payload.rle_mask()?;
        let touches = payload.touches().to_vec();

        region.representation = match rle {
            Some(rle) if touches.is_empty() => MaskRepresentation::Flattened(rle),
            base => MaskRepresentation::Strokes {
                base,
                strokes: touches,
            },
        };
        region.mask_bitmap = region
            .representation
            .rle()
            .map(|rle| region.decode_mask(rle));
        region.fit_rle_to_natural();

        let geometry = region.geometry;
        if geometry.has_stage(region.min_stage_size) {
            region.apply_geometry(geometry);
        } else {
            region.repaint();
        }
        Ok(region)
    }

    /// Restore a region, falling back to an empty mask if the RLE cannot be decoded.
    ///
    /// The decode error is returned so it can be reported on the annotation.
    pub fn from_payload_lossy<O: ImageObject + ?Sized>(
        payload: &RegionPayload,
        object: &O,
        config: &BrushConfig,
    ) -> MaskResult<(Self, Option<DecodeError>)> {
        match Self::from_payload(payload, object, config) {
            Ok(region) => Ok((region, None)),
            Err(MaskError::Decode(err)) => {
                log::warn!("Dropping undecodable brush mask: {}", err);
                Ok((Self::new(object, config)?, Some(err)))
            }
            Err(err) => Err(err),
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn representation(&self) -> &MaskRepresentation {
        &self.representation
    }

    /// Committed strokes.
    pub fn strokes(&self) -> &[Stroke] {
        self.representation.strokes()
    }

    /// Number of committed strokes.
    pub fn touches_len(&self) -> usize {
        self.strokes().len()
    }

    /// The flattened mask or base RLE, if any.
    pub fn rle(&self) -> Option<&RleMask> {
        self.representation.rle()
    }

    /// Check if there is anything to render.
    pub fn is_renderable(&self) -> bool {
        !self.strokes().is_empty() || self.rle().is_some_and(|rle| !rle.is_blank())
    }

    /// Render generation, bumped on every repaint or commit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn geometry(&self) -> &StageGeometry {
        &self.geometry
    }

    pub fn color(&self) -> MaskColor {
        self.color
    }

    /// RGBA components of the region color.
    pub fn color_parts(&self) -> [u8; 4] {
        self.color.to_array()
    }

    /// Display color as a hex string.
    pub fn stroke_color(&self) -> String {
        self.color.to_hex()
    }

    /// Change the region color and recolor all bitmaps.
    pub fn set_color(&mut self, color: MaskColor) {
        self.color = color;
        self.compositor.set_color(color);
        if let Some(mask) = self.mask_bitmap.as_mut() {
            mask.recolor(color);
        }
        if let Some(cached) = self.cached_bitmap.as_mut() {
            cached.recolor(color);
        }
        self.bump_generation();
    }

    /// Set the color from a CSS style string.
    pub fn set_style(&mut self, css: &str) -> MaskResult<()> {
        let color = MaskColor::parse(css)?;
        self.set_color(color);
        Ok(())
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn toggle_hidden(&mut self) {
        self.hidden = !self.hidden;
    }

    pub fn scale(&self) -> (f64, f64) {
        self.scale
    }

    /// Current viewport bitmap, including the active stroke.
    pub fn display_bitmap(&self) -> &RasterBuffer {
        self.compositor.bitmap()
    }

    /// Bitmap captured by the last [`MaskRegion::cache_image_data`].
    pub fn cached_bitmap(&self) -> Option<&RasterBuffer> {
        self.cached_bitmap.as_ref()
    }

    /// Take the queued events.
    pub fn drain_events(&mut self) -> Vec<MaskEvent> {
        std::mem::take(&mut self.events)
    }

    /// Set the scale of the group the strokes are drawn in.
    pub fn set_scale(&mut self, x: f64, y: f64) {
        if self.scale == (x, y) {
            return;
        }
        self.scale = (x, y);
        if self.active.is_some() {
            // Keep a resize that is already waiting for the commit.
            self.pending_geometry.get_or_insert(self.geometry);
        } else {
            self.apply_geometry(self.geometry);
        }
    }

    /// React to an image resize or rotation.
    pub fn update_image_size<O: ImageObject + ?Sized>(&mut self, object: &O) {
        self.sync_geometry(StageGeometry::from_object(object));
    }

    /// React to a zoom or pan change.
    pub fn update_view<O: ImageObject + ?Sized>(&mut self, object: &O) {
        let geometry = StageGeometry::from_object(object);
        if geometry.view != self.geometry.view || geometry.stage != self.geometry.stage {
            self.sync_geometry(geometry);
        }
    }

    /// Snapshot the viewport bitmap for bounding boxes and highlighting.
    ///
    /// Returns `false` without capturing while a stroke is being drawn.
    pub fn cache_image_data(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.cached_bitmap = Some(self.compositor.bitmap().clone());
        true
    }

    /// Render the mask at natural image resolution.
    pub fn export_bitmap(&self) -> RasterBuffer {
        let (width, height) = self.geometry.natural_pixels();
        let mut compositor = RasterCompositor::new(width, height, self.color);
        if let Some(mask) = &self.mask_bitmap {
            compositor.draw_image(mask, Affine::IDENTITY);
        }

        let stage_width = self.geometry.stage.width;
        let natural_width = self.geometry.natural.width;
        let (sx, sy) = self.scale;
        for stroke in self.strokes() {
            let stage_points: Vec<Point> = stroke
                .points
                .iter()
                .map(|&p| from_display(p, sx, sy))
                .collect();
            let points = rescale(&stage_points, stage_width, natural_width);
            let width = stroke.scaled_stroke_width(stage_width, natural_width) * sx;
            compositor.paint_with(&points, width, stroke.composite_mode(), Affine::IDENTITY);
        }
        compositor.into_bitmap()
    }

    /// Compact all strokes into a single RLE mask.
    ///
    /// One-way: per-stroke editing (and any undo of it) is no longer possible
    /// afterwards. Calling it again returns the same mask.
    pub fn flatten(&mut self) -> MaskResult<RleMask> {
        if self.active.is_some() {
            return Err(InvalidState::FlattenWhileDrawing.into());
        }
        let rle = match &self.representation {
            MaskRepresentation::Flattened(rle) => return Ok(rle.clone()),
            MaskRepresentation::Strokes {
                base: Some(base),
                strokes,
            } if strokes.is_empty() => base.clone(),
            MaskRepresentation::Strokes { .. } => {
                let bitmap = self.export_bitmap();
                let rle = RleMask::from_bitmap(&bitmap);
                self.mask_bitmap = Some(bitmap);
                rle
            }
        };

        log::debug!(
            "Flattened {} strokes into {} runs ({} painted pixels)",
            self.strokes().len(),
            rle.runs.len(),
            rle.painted_area()
        );
        self.events.push(MaskEvent::Flattened {
            painted_area: rle.painted_area(),
        });
        self.representation = MaskRepresentation::Flattened(rle.clone());
        self.repaint();
        Ok(rle)
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
    }

    fn decode_mask(&self, rle: &RleMask) -> RasterBuffer {
        let (width, height) = self.geometry.natural_pixels();
        match rle.decode(self.color) {
            Ok(bitmap) if (bitmap.width(), bitmap.height()) == (width, height) => bitmap,
            Ok(bitmap) => {
                log::debug!(
                    "Resampling {}x{} mask to {}x{}",
                    bitmap.width(),
                    bitmap.height(),
                    width,
                    height
                );
                bitmap.resample(width, height)
            }
            Err(err) => {
                log::warn!("Rendering brush mask as empty: {}", err);
                RasterBuffer::new(width, height)
            }
        }
    }

    /// Re-encode the stored RLE from the resampled mask when it was encoded at
    /// a size other than the natural image size.
    fn fit_rle_to_natural(&mut self) {
        let natural = self.geometry.natural_pixels();
        let Some(mask) = &self.mask_bitmap else {
            return;
        };
        let Some(rle) = self.representation.rle_mut() else {
            return;
        };
        if (rle.width, rle.height) == natural {
            return;
        }
        log::debug!(
            "Re-encoding {}x{} mask at {}x{}",
            rle.width,
            rle.height,
            natural.0,
            natural.1
        );
        *rle = RleMask::from_bitmap(mask);
    }

    fn sync_geometry(&mut self, geometry: StageGeometry) {
        if !geometry.has_stage(self.min_stage_size) {
            log::debug!(
                "Ignoring stage size {}x{}",
                geometry.stage.width,
                geometry.stage.height
            );
            return;
        }
        if self.active.is_some() {
            log::debug!("Deferring stage update until the active stroke is committed");
            self.pending_geometry = Some(geometry);
            return;
        }
        self.apply_geometry(geometry);
    }

    /// Re-derive every stroke for `geometry` and repaint from scratch.
    fn apply_geometry(&mut self, geometry: StageGeometry) {
        let natural_changed = geometry.natural != self.geometry.natural;
        self.geometry = geometry;
        if natural_changed {
            let mask = self.representation.rle().map(|rle| self.decode_mask(rle));
            self.mask_bitmap = mask;
            self.fit_rle_to_natural();
        }

        let stage = geometry.stage;
        let scale = self.scale;
        if let MaskRepresentation::Strokes { strokes, .. } = &mut self.representation {
            for stroke in strokes.iter_mut() {
                stroke.update_image_size(stage, scale);
            }
        }
        self.repaint();
    }

    /// Repaint the viewport bitmap from the mask and all strokes.
    fn repaint(&mut self) {
        let (width, height) = self.geometry.viewport_pixels();
        let view = self.geometry.view.transform();
        let display_to_viewport = view * Affine::scale_non_uniform(self.scale.0, self.scale.1);
        let natural_to_viewport = view * self.geometry.stage_to_natural().inverse();

        self.compositor.resize(width, height);
        self.compositor.clear();
        self.compositor.set_transform(display_to_viewport);
        if let Some(mask) = &self.mask_bitmap {
            self.compositor.draw_image(mask, natural_to_viewport);
        }
        for stroke in self.representation.strokes() {
            self.compositor.paint_stroke(stroke);
        }

        self.cached_bitmap = None;
        self.bump_generation();
        self.events.push(MaskEvent::Repainted {
            generation: self.generation,
        });
        log::debug!(
            "Repainted brush region {} at {}x{} (generation {})",
            self.id,
            width,
            height,
            self.generation
        );
    }
}

impl Drawable for MaskRegion {
    fn begin_stroke(
        &mut self,
        kind: StrokeKind,
        stroke_width: f64,
        opacity: f64,
    ) -> MaskResult<StrokeHandle> {
        if self.active.is_some() {
            return Err(InvalidState::StrokeAlreadyActive.into());
        }
        // Strokes drawn on a flattened mask stack on top of it.
        self.representation.strokes_mut();

        let builder = StrokeBuilder::new(kind, stroke_width, opacity);
        let handle = builder.handle();
        self.active = Some(builder);
        self.cached_bitmap = None;
        log::debug!("Began {:?} stroke {} on region {}", kind, handle.id, self.id);
        Ok(handle)
    }

    fn append_point(&mut self, x: f64, y: f64) -> MaskResult<()> {
        let view = self.geometry.view.transform();
        let width_scale = self.scale.0;
        let Some(builder) = self.active.as_mut() else {
            return Err(InvalidState::NoActiveStroke.into());
        };
        let segment = builder.push(Point::new(x, y));
        let mode = builder.kind().composite_mode();
        let width = builder.stroke_width() * width_scale;
        self.compositor.paint_with(&segment, width, mode, view);
        Ok(())
    }

    fn commit_stroke(&mut self) -> MaskResult<StrokeHandle> {
        let builder = self.active.take().ok_or(InvalidState::NoActiveStroke)?;
        let handle = builder.handle();

        if builder.points().is_empty() {
            log::debug!("Stroke {} ended without points", handle.id);
        } else {
            let stroke = builder.finish(self.geometry.stage, self.scale);
            self.representation.strokes_mut().push(stroke);
        }
        self.bump_generation();
        self.events.push(MaskEvent::DrawingFinished {
            stroke_id: handle.id.clone(),
        });

        if let Some(geometry) = self.pending_geometry.take() {
            self.apply_geometry(geometry);
        }
        Ok(handle)
    }

    fn is_drawing(&self) -> bool {
        self.active.is_some()
    }
}

impl Serializable for MaskRegion {
    fn serialize(&self, options: SerializeOptions) -> MaskResult<Option<RegionPayload>> {
        let (original_width, original_height) = self.geometry.natural_pixels();
        let value = if options.fast {
            let strokes = self.strokes();
            MaskValue {
                format: RLE_FORMAT.to_string(),
                rle: self.rle().map(|rle| rle.runs.clone()).unwrap_or_default(),
                touches: (!strokes.is_empty()).then(|| strokes.to_vec()),
            }
        } else {
            let rle = match &self.representation {
                MaskRepresentation::Flattened(rle)
                    if (rle.width, rle.height) == (original_width, original_height) =>
                {
                    rle.clone()
                }
                _ => RleMask::from_bitmap(&self.export_bitmap()),
            };
            if rle.is_blank() {
                return Ok(None);
            }
            MaskValue::rle(rle.runs)
        };

        Ok(Some(RegionPayload {
            original_width,
            original_height,
            image_rotation: self.geometry.rotation,
            value,
        }))
    }
}

impl BoundsProvider for MaskRegion {
    /// From the cached bitmap when one exists, otherwise approximated from the
    /// first stroke's points (before flattening only).
    fn bbox_coords(&self) -> Option<BBox> {
        if let Some(bitmap) = &self.cached_bitmap {
            return compute_bbox(bitmap).map(|bbox| bbox.unproject(&self.geometry.view));
        }
        self.strokes()
            .first()
            .and_then(|stroke| points_bbox(&stroke.points))
    }

    fn hit_test(&self, stage_point: Point) -> bool {
        if self.hidden {
            return false;
        }
        let p = self.geometry.view.to_viewport(stage_point);
        if !p.is_finite() {
            return false;
        }
        self.compositor
            .bitmap()
            .is_painted(p.x.floor() as i64, p.y.floor() as i64)
    }
}
