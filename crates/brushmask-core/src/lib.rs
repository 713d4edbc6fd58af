//! Brushmask Core Library
//!
//! Freehand brush masks for image annotation: stroke capture, compositing,
//! RLE encoding and the serialized region payload.

pub mod autosave;
pub mod bbox;
pub mod color;
pub mod compositor;
pub mod config;
pub mod coords;
pub mod error;
pub mod host;
pub mod payload;
pub mod raster;
pub mod region;
pub mod rle;
pub mod stroke;

pub use autosave::AutosaveState;
pub use bbox::{BBox, PixelBox, compute_bbox};
pub use color::MaskColor;
pub use compositor::{Compositor, RasterCompositor};
pub use config::BrushConfig;
pub use coords::{StageGeometry, StageTransform};
pub use error::{DecodeError, InvalidState, MaskError, MaskResult};
pub use host::{AnnotationHost, AutosavePause, ImageFrame, ImageObject};
pub use payload::{MaskValue, RegionPayload};
pub use raster::{CompositeMode, RasterBuffer};
pub use region::{
    BoundsProvider, Drawable, MaskEvent, MaskRegion, MaskRepresentation, RegionId, Serializable,
    SerializeOptions, StrokeSession,
};
pub use rle::{RleMask, RleSequence};
pub use stroke::{Stroke, StrokeHandle, StrokeKind};
