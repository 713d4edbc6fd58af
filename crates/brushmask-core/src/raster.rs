//! RGBA8 raster buffers and per-pixel compositing.

use crate::color::MaskColor;
use serde::{Deserialize, Serialize};

/// How a source pixel is combined with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Paint over existing content (`source-over`).
    #[default]
    SourceOver,
    /// Remove existing alpha where the source is opaque (`destination-out`).
    DestinationOut,
}

impl CompositeMode {
    /// Canvas name of this mode.
    pub fn name(self) -> &'static str {
        match self {
            CompositeMode::SourceOver => "source-over",
            CompositeMode::DestinationOut => "destination-out",
        }
    }

    /// Blend a straight-alpha source pixel onto a straight-alpha destination pixel.
    pub fn blend(self, dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
        let sa = src[3] as u32;
        let da = dst[3] as u32;
        match self {
            CompositeMode::SourceOver => {
                if sa == 255 {
                    return src;
                }
                if sa == 0 {
                    return dst;
                }
                // Scaled by 255 * 255.
                let dst_weight = da * (255 - sa);
                let out_a = sa * 255 + dst_weight;
                if out_a == 0 {
                    return [0, 0, 0, 0];
                }
                let mut out = [0u8; 4];
                for i in 0..3 {
                    let c = src[i] as u32 * sa * 255 + dst[i] as u32 * dst_weight;
                    out[i] = ((c + out_a / 2) / out_a).min(255) as u8;
                }
                out[3] = ((out_a + 127) / 255).min(255) as u8;
                out
            }
            CompositeMode::DestinationOut => {
                let out_a = (da * (255 - sa) + 127) / 255;
                if out_a == 0 {
                    return [0, 0, 0, 0];
                }
                [dst[0], dst[1], dst[2], out_a as u8]
            }
        }
    }
}

/// A dense RGBA8 pixel buffer in row-major order.
///
/// Coordinates outside the buffer never panic: reads return a transparent
/// pixel and writes are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap existing RGBA8 data. Returns `None` if the length does not match.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Build a buffer from a boolean coverage mask, filling covered pixels with `color`.
    pub fn from_mask(width: u32, height: u32, mask: &[bool], color: MaskColor) -> Option<Self> {
        if mask.len() != width as usize * height as usize {
            return None;
        }
        let mut buffer = Self::new(width, height);
        let fill = color.opaque().to_array();
        for (px, &painted) in buffer.data.chunks_exact_mut(4).zip(mask) {
            if painted {
                px.copy_from_slice(&fill);
            }
        }
        Some(buffer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Pixel at (x, y), transparent when out of range.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        match self.index(x, y) {
            Some(i) => [
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            ],
            None => [0, 0, 0, 0],
        }
    }

    /// Alpha at (x, y), zero when out of range.
    pub fn alpha(&self, x: i64, y: i64) -> u8 {
        self.index(x, y).map_or(0, |i| self.data[i + 3])
    }

    /// Whether the pixel at (x, y) carries any alpha.
    pub fn is_painted(&self, x: i64, y: i64) -> bool {
        self.alpha(x, y) > 0
    }

    pub fn set_pixel(&mut self, x: i64, y: i64, rgba: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.data[i..i + 4].copy_from_slice(&rgba);
        }
    }

    /// Composite `src` onto the pixel at (x, y).
    pub fn composite_pixel(&mut self, x: i64, y: i64, src: [u8; 4], mode: CompositeMode) {
        if let Some(i) = self.index(x, y) {
            let dst = [
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            ];
            let out = mode.blend(dst, src);
            self.data[i..i + 4].copy_from_slice(&out);
        }
    }

    /// Composite another buffer of the same size onto this one.
    pub fn composite(&mut self, other: &RasterBuffer, mode: CompositeMode) {
        if other.width != self.width || other.height != self.height {
            log::warn!(
                "Skipping composite of {}x{} buffer onto {}x{}",
                other.width,
                other.height,
                self.width,
                self.height
            );
            return;
        }
        for (dst, src) in self.data.chunks_exact_mut(4).zip(other.data.chunks_exact(4)) {
            let out = mode.blend(
                [dst[0], dst[1], dst[2], dst[3]],
                [src[0], src[1], src[2], src[3]],
            );
            dst.copy_from_slice(&out);
        }
    }

    /// Make every pixel transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Check if no pixel carries alpha.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Number of pixels with alpha > 0.
    pub fn painted_count(&self) -> usize {
        self.data.chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    /// Boolean coverage mask in row-major order.
    pub fn coverage(&self) -> Vec<bool> {
        self.data.chunks_exact(4).map(|px| px[3] > 0).collect()
    }

    /// Replace the color of every painted pixel, keeping its alpha.
    pub fn recolor(&mut self, color: MaskColor) {
        for px in self.data.chunks_exact_mut(4) {
            if px[3] > 0 {
                px[0] = color.r;
                px[1] = color.g;
                px[2] = color.b;
            }
        }
    }

    /// Nearest-neighbour resample to a new size.
    pub fn resample(&self, width: u32, height: u32) -> RasterBuffer {
        let mut out = RasterBuffer::new(width, height);
        if self.is_empty() || width == 0 || height == 0 {
            return out;
        }
        let sx = self.width as f64 / width as f64;
        let sy = self.height as f64 / height as f64;
        for y in 0..height {
            let src_y = (((y as f64 + 0.5) * sy) as i64).min(self.height as i64 - 1);
            for x in 0..width {
                let src_x = (((x as f64 + 0.5) * sx) as i64).min(self.width as i64 - 1);
                out.set_pixel(x as i64, y as i64, self.pixel(src_x, src_y));
            }
        }
        out
    }
}
