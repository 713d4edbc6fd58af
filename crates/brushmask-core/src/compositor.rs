//! Stroke rasterization.
//!
//! Strokes are drawn as polylines with round caps and round joins: a pixel is
//! covered when its centre lies within half the line width of any segment.

use crate::color::MaskColor;
use crate::raster::{CompositeMode, RasterBuffer};
use crate::stroke::Stroke;
use kurbo::{Affine, Point, Vec2};

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Paint a path onto `bitmap`.
///
/// `path` is mapped through `transform` into bitmap pixels; `width` is scaled
/// by the transform's linear scale. Pixels outside the bitmap are skipped.
pub fn paint_path(
    bitmap: &mut RasterBuffer,
    path: &[Point],
    width: f64,
    mode: CompositeMode,
    color: MaskColor,
    transform: Affine,
) {
    if path.is_empty() || bitmap.is_empty() {
        return;
    }
    let radius = width * transform.determinant().abs().sqrt() / 2.0;
    if !radius.is_finite() || radius <= 0.0 {
        return;
    }

    let points: Vec<Point> = path
        .iter()
        .map(|&p| transform * p)
        .filter(|p| p.is_finite())
        .collect();
    let Some(&first) = points.first() else {
        return;
    };

    let src = color.opaque().to_array();
    if points.len() == 1 {
        paint_segment(bitmap, first, first, radius, src, mode);
        return;
    }
    // Overlapping joins are painted more than once; opaque coverage makes that
    // idempotent for both modes.
    for w in points.windows(2) {
        paint_segment(bitmap, w[0], w[1], radius, src, mode);
    }
}

fn paint_segment(
    bitmap: &mut RasterBuffer,
    a: Point,
    b: Point,
    radius: f64,
    src: [u8; 4],
    mode: CompositeMode,
) {
    let max_x = bitmap.width() as f64;
    let max_y = bitmap.height() as f64;
    let x0 = (a.x.min(b.x) - radius).floor().clamp(0.0, max_x) as i64;
    let x1 = (a.x.max(b.x) + radius).ceil().clamp(0.0, max_x) as i64;
    let y0 = (a.y.min(b.y) - radius).floor().clamp(0.0, max_y) as i64;
    let y1 = (a.y.max(b.y) + radius).ceil().clamp(0.0, max_y) as i64;

    for y in y0..y1 {
        for x in x0..x1 {
            let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            if point_to_segment_dist(center, a, b) <= radius {
                bitmap.composite_pixel(x, y, src, mode);
            }
        }
    }
}

/// Paint a committed stroke with its own composite mode.
pub fn paint_stroke(bitmap: &mut RasterBuffer, stroke: &Stroke, color: MaskColor, transform: Affine) {
    paint_path(
        bitmap,
        &stroke.points,
        stroke.stroke_width,
        stroke.composite_mode(),
        color,
        transform,
    );
}

/// Draw `image` onto `bitmap` with nearest-neighbour sampling.
///
/// `image_to_bitmap` maps image pixels to bitmap pixels.
pub fn draw_image(
    bitmap: &mut RasterBuffer,
    image: &RasterBuffer,
    image_to_bitmap: Affine,
    mode: CompositeMode,
) {
    if image.is_empty() || bitmap.is_empty() || image_to_bitmap.determinant().abs() < f64::EPSILON {
        return;
    }
    if image_to_bitmap == Affine::IDENTITY
        && image.width() == bitmap.width()
        && image.height() == bitmap.height()
    {
        bitmap.composite(image, mode);
        return;
    }
    let inverse = image_to_bitmap.inverse();
    for y in 0..bitmap.height() as i64 {
        for x in 0..bitmap.width() as i64 {
            let src = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let px = image.pixel(src.x.floor() as i64, src.y.floor() as i64);
            if px[3] > 0 {
                bitmap.composite_pixel(x, y, px, mode);
            }
        }
    }
}

/// A bitmap that strokes are composited onto, in order.
pub trait Compositor {
    /// Current composited pixels.
    fn bitmap(&self) -> &RasterBuffer;

    /// Make every pixel transparent.
    fn clear(&mut self);

    /// Paint a path given in the compositor's input space.
    fn paint(&mut self, path: &[Point], width: f64, mode: CompositeMode);

    /// Paint a committed stroke.
    fn paint_stroke(&mut self, stroke: &Stroke) {
        self.paint(&stroke.points, stroke.stroke_width, stroke.composite_mode());
    }
}

/// Compositor over an in-memory [`RasterBuffer`].
#[derive(Debug, Clone)]
pub struct RasterCompositor {
    buffer: RasterBuffer,
    /// Maps input coordinates to bitmap pixels.
    transform: Affine,
    color: MaskColor,
}

impl RasterCompositor {
    pub fn new(width: u32, height: u32, color: MaskColor) -> Self {
        Self {
            buffer: RasterBuffer::new(width, height),
            transform: Affine::IDENTITY,
            color,
        }
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    pub fn color(&self) -> MaskColor {
        self.color
    }

    /// Change the paint color, recoloring already painted pixels.
    pub fn set_color(&mut self, color: MaskColor) {
        self.color = color;
        self.buffer.recolor(color);
    }

    /// Resize the bitmap. Resizing discards the current pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.buffer.width() != width || self.buffer.height() != height {
            self.buffer = RasterBuffer::new(width, height);
        }
    }

    /// Paint a path given in an explicit space instead of the compositor's input space.
    pub fn paint_with(&mut self, path: &[Point], width: f64, mode: CompositeMode, transform: Affine) {
        paint_path(&mut self.buffer, path, width, mode, self.color, transform);
    }

    /// Draw a mask image given in an explicit space.
    pub fn draw_image(&mut self, image: &RasterBuffer, image_to_bitmap: Affine) {
        draw_image(&mut self.buffer, image, image_to_bitmap, CompositeMode::SourceOver);
    }

    pub fn into_bitmap(self) -> RasterBuffer {
        self.buffer
    }
}

impl Compositor for RasterCompositor {
    fn bitmap(&self) -> &RasterBuffer {
        &self.buffer
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn paint(&mut self, path: &[Point], width: f64, mode: CompositeMode) {
        paint_path(&mut self.buffer, path, width, mode, self.color, self.transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeKind;

    fn color() -> MaskColor {
        MaskColor::new(0, 200, 0, 255)
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_dist(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        assert!((point_to_segment_dist(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        assert!((point_to_segment_dist(Point::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_dot_is_round() {
        let mut bitmap = RasterBuffer::new(20, 20);
        let p = Point::new(10.0, 10.0);
        paint_path(&mut bitmap, &[p, p], 6.0, CompositeMode::SourceOver, color(), Affine::IDENTITY);
        assert!(bitmap.is_painted(9, 9));
        assert!(bitmap.is_painted(7, 9));
        assert!(!bitmap.is_painted(6, 9));
        // Corner of the bounding square lies outside the circle.
        assert!(!bitmap.is_painted(7, 7));
        assert_eq!(bitmap.pixel(9, 9), [0, 200, 0, 255]);
    }

    #[test]
    fn test_erase_removes_alpha() {
        let mut bitmap = RasterBuffer::new(20, 20);
        let path = [Point::new(0.0, 10.0), Point::new(20.0, 10.0)];
        paint_path(&mut bitmap, &path, 8.0, CompositeMode::SourceOver, color(), Affine::IDENTITY);
        let painted = bitmap.painted_count();
        assert_eq!(painted, 20 * 8);

        let cut = [Point::new(10.0, 0.0), Point::new(10.0, 20.0)];
        paint_path(&mut bitmap, &cut, 2.0, CompositeMode::DestinationOut, color(), Affine::IDENTITY);
        assert!(!bitmap.is_painted(9, 10));
        assert!(!bitmap.is_painted(10, 10));
        assert!(bitmap.is_painted(8, 10));
        assert_eq!(bitmap.painted_count(), painted - 2 * 8);
    }

    #[test]
    fn test_out_of_range_path_is_clamped() {
        let mut bitmap = RasterBuffer::new(10, 10);
        let path = [Point::new(-500.0, 5.0), Point::new(500.0, 5.0)];
        paint_path(&mut bitmap, &path, 2.0, CompositeMode::SourceOver, color(), Affine::IDENTITY);
        assert_eq!(bitmap.painted_count(), 20);

        let nan = [Point::new(f64::NAN, 1.0)];
        paint_path(&mut bitmap, &nan, 2.0, CompositeMode::SourceOver, color(), Affine::IDENTITY);
        assert_eq!(bitmap.painted_count(), 20);
    }

    #[test]
    fn test_transform_scales_width() {
        let mut bitmap = RasterBuffer::new(40, 40);
        let p = Point::new(10.0, 10.0);
        paint_path(
            &mut bitmap,
            &[p, p],
            4.0,
            CompositeMode::SourceOver,
            color(),
            Affine::scale(2.0),
        );
        // Centre moves to (20, 20), radius doubles to 4.
        assert!(bitmap.is_painted(16, 19));
        assert!(!bitmap.is_painted(15, 19));
    }

    #[test]
    fn test_compositor_paints_in_order() {
        let mut compositor = RasterCompositor::new(10, 10, color());
        let mut add = Stroke::new(StrokeKind::Add, 4.0);
        add.points = vec![Point::new(0.0, 5.0), Point::new(10.0, 5.0)];
        let mut erase = Stroke::new(StrokeKind::Erase, 4.0);
        erase.points = add.points.clone();

        compositor.paint_stroke(&add);
        assert!(!compositor.bitmap().is_blank());
        compositor.paint_stroke(&erase);
        assert!(compositor.bitmap().is_blank());
        compositor.paint_stroke(&add);
        assert!(!compositor.bitmap().is_blank());

        compositor.clear();
        assert!(compositor.bitmap().is_blank());
    }

    #[test]
    fn test_draw_image_scaled() {
        let mut image = RasterBuffer::new(2, 2);
        image.set_pixel(1, 0, [1, 2, 3, 255]);
        let mut compositor = RasterCompositor::new(4, 4, color());
        compositor.draw_image(&image, Affine::scale(2.0));
        let bitmap = compositor.bitmap();
        assert_eq!(bitmap.painted_count(), 4);
        assert!(bitmap.is_painted(2, 0));
        assert!(bitmap.is_painted(3, 1));
    }

    #[test]
    fn test_set_color_recolors() {
        let mut compositor = RasterCompositor::new(4, 4, color());
        compositor.paint(&[Point::new(2.0, 2.0)], 2.0, CompositeMode::SourceOver);
        compositor.set_color(MaskColor::new(9, 9, 9, 255));
        assert_eq!(compositor.bitmap().pixel(1, 1), [9, 9, 9, 255]);
    }
}
