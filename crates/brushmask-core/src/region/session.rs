//! Scoped stroke drawing.

use super::{Drawable, MaskRegion};
use crate::error::MaskResult;
use crate::host::{AnnotationHost, AutosavePause};
use crate::stroke::{StrokeHandle, StrokeKind};

/// One pointer-down to pointer-up gesture on a region.
///
/// Autosave of the owning annotation stays paused while the session is alive.
/// Dropping an uncommitted session commits the stroke, then resumes autosave.
pub struct StrokeSession<'r, 'h, A: AnnotationHost + ?Sized> {
    region: &'r mut MaskRegion,
    handle: StrokeHandle,
    committed: bool,
    _pause: AutosavePause<'h, A>,
}

impl MaskRegion {
    /// Begin a stroke and pause autosave on `host` until it is committed.
    pub fn start_session<'r, 'h, A: AnnotationHost + ?Sized>(
        &'r mut self,
        host: &'h A,
        kind: StrokeKind,
        stroke_width: f64,
        opacity: f64,
    ) -> MaskResult<StrokeSession<'r, 'h, A>> {
        let handle = self.begin_stroke(kind, stroke_width, opacity)?;
        Ok(StrokeSession {
            region: self,
            handle,
            committed: false,
            _pause: AutosavePause::new(host),
        })
    }
}

impl<A: AnnotationHost + ?Sized> StrokeSession<'_, '_, A> {
    pub fn handle(&self) -> &StrokeHandle {
        &self.handle
    }

    /// Append a stage-space point.
    pub fn append_point(&mut self, x: f64, y: f64) -> MaskResult<()> {
        self.region.append_point(x, y)
    }

    /// Commit the stroke and resume autosave.
    pub fn commit(mut self) -> MaskResult<StrokeHandle> {
        self.committed = true;
        self.region.commit_stroke()
    }
}

impl<A: AnnotationHost + ?Sized> Drop for StrokeSession<'_, '_, A> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = self.region.commit_stroke() {
            log::warn!("Failed to commit stroke {}: {}", self.handle.id, err);
        }
    }
}

impl<A: AnnotationHost + ?Sized> std::fmt::Debug for StrokeSession<'_, '_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeSession")
            .field("handle", &self.handle)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}
