//! Collaborator interfaces consumed by mask regions.
//!
//! The image object and the owning annotation live outside this crate. Regions
//! only read the fields listed here and call the listed methods.

use kurbo::Point;

/// The image a mask is drawn on.
pub trait ImageObject {
    /// Natural image width in pixels.
    fn natural_width(&self) -> f64;
    /// Natural image height in pixels.
    fn natural_height(&self) -> f64;
    /// Image rotation in degrees.
    fn rotation(&self) -> f64;
    /// Stage width at full zoom.
    fn stage_width(&self) -> f64;
    /// Stage height at full zoom.
    fn stage_height(&self) -> f64;
    /// Viewport zoom factor.
    fn stage_scale(&self) -> f64;
    /// Horizontal pan offset in viewport pixels.
    fn zooming_position_x(&self) -> f64;
    /// Vertical pan offset in viewport pixels.
    fn zooming_position_y(&self) -> f64;

    /// Map a stage point to viewport pixels.
    fn zoom_original_coords(&self, point: Point) -> Point {
        Point::new(
            point.x * self.stage_scale() + self.zooming_position_x(),
            point.y * self.stage_scale() + self.zooming_position_y(),
        )
    }
}

/// The annotation that owns a region.
pub trait AnnotationHost {
    /// Stop autosaving until [`AnnotationHost::start_autosave`] is called.
    fn pause_autosave(&self);
    /// Resume autosaving. Hosts schedule the actual save for their next tick.
    fn start_autosave(&self);
}

/// Pauses autosave for as long as it is alive.
///
/// Resume runs on drop, so it also happens on early return or unwinding.
#[must_use = "autosave resumes as soon as the pause is dropped"]
pub struct AutosavePause<'a, A: AnnotationHost + ?Sized> {
    host: &'a A,
}

impl<'a, A: AnnotationHost + ?Sized> AutosavePause<'a, A> {
    pub fn new(host: &'a A) -> Self {
        host.pause_autosave();
        Self { host }
    }
}

impl<A: AnnotationHost + ?Sized> Drop for AutosavePause<'_, A> {
    fn drop(&mut self) {
        self.host.start_autosave();
    }
}

impl<A: AnnotationHost + ?Sized> std::fmt::Debug for AutosavePause<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosavePause").finish_non_exhaustive()
    }
}

/// A plain image object with fixed geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFrame {
    pub natural_width: f64,
    pub natural_height: f64,
    pub rotation: f64,
    pub stage_width: f64,
    pub stage_height: f64,
    pub stage_scale: f64,
    pub zooming_position_x: f64,
    pub zooming_position_y: f64,
}

impl ImageFrame {
    /// An image shown unzoomed at its natural size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            natural_width: width,
            natural_height: height,
            rotation: 0.0,
            stage_width: width,
            stage_height: height,
            stage_scale: 1.0,
            zooming_position_x: 0.0,
            zooming_position_y: 0.0,
        }
    }

    /// Set the stage size.
    pub fn with_stage(mut self, width: f64, height: f64) -> Self {
        self.stage_width = width;
        self.stage_height = height;
        self
    }

    /// Set zoom and pan.
    pub fn with_zoom(mut self, scale: f64, x: f64, y: f64) -> Self {
        self.stage_scale = scale;
        self.zooming_position_x = x;
        self.zooming_position_y = y;
        self
    }

    /// Rotate by 90° steps, swapping the stage axes for odd quarter turns.
    pub fn rotate(&mut self, degrees: f64) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
        if ((degrees / 90.0).round() as i64).rem_euclid(2) == 1 {
            std::mem::swap(&mut self.stage_width, &mut self.stage_height);
        }
    }
}

impl ImageObject for ImageFrame {
    fn natural_width(&self) -> f64 {
        self.natural_width
    }

    fn natural_height(&self) -> f64 {
        self.natural_height
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn stage_width(&self) -> f64 {
        self.stage_width
    }

    fn stage_height(&self) -> f64 {
        self.stage_height
    }

    fn stage_scale(&self) -> f64 {
        self.stage_scale
    }

    fn zooming_position_x(&self) -> f64 {
        self.zooming_position_x
    }

    fn zooming_position_y(&self) -> f64 {
        self.zooming_position_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingHost {
        paused: Cell<u32>,
        resumed: Cell<u32>,
    }

    impl AnnotationHost for CountingHost {
        fn pause_autosave(&self) {
            self.paused.set(self.paused.get() + 1);
        }

        fn start_autosave(&self) {
            self.resumed.set(self.resumed.get() + 1);
        }
    }

    #[test]
    fn test_pause_resumes_on_drop() {
        let host = CountingHost::default();
        {
            let _pause = AutosavePause::new(&host);
            assert_eq!(host.paused.get(), 1);
            assert_eq!(host.resumed.get(), 0);
        }
        assert_eq!(host.resumed.get(), 1);
    }

    #[test]
    fn test_pause_resumes_on_unwind() {
        let host = CountingHost::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _pause = AutosavePause::new(&host);
            panic!("gesture failed");
        }));
        assert!(result.is_err());
        assert_eq!(host.resumed.get(), 1);
    }

    #[test]
    fn test_zoom_original_coords() {
        let frame = ImageFrame::new(100.0, 100.0).with_zoom(2.0, 5.0, -5.0);
        let p = frame.zoom_original_coords(Point::new(10.0, 10.0));
        assert!((p.x - 25.0).abs() < f64::EPSILON);
        assert!((p.y - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rotate_swaps_stage() {
        let mut frame = ImageFrame::new(200.0, 100.0);
        frame.rotate(90.0);
        assert_eq!(frame.rotation, 90.0);
        assert_eq!((frame.stage_width, frame.stage_height), (100.0, 200.0));
        frame.rotate(180.0);
        assert_eq!(frame.rotation, 270.0);
        assert_eq!((frame.stage_width, frame.stage_height), (100.0, 200.0));
    }
}
