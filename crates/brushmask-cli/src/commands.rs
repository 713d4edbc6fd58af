//! Subcommand implementations.

use crate::args::{Cli, Command};
use crate::error::CliError;
use crate::image_io::{read_png, write_png};
use brushmask_core::{
    BrushConfig, ImageFrame, MaskRegion, MaskValue, PixelBox, RasterBuffer, RegionPayload,
    RleMask, compute_bbox,
};
use std::fmt;
use std::path::Path;

pub fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => BrushConfig::load(path)?,
        None => BrushConfig::default(),
    };

    match cli.command {
        Command::Decode {
            payload,
            output,
            color,
        } => {
            let payload = load_payload(&payload)?;
            let bitmap = render_payload(&payload, &config, color.as_deref())?;
            write_png(&output, &bitmap)?;
            log::info!(
                "Decoded {}x{} mask to {}",
                bitmap.width(),
                bitmap.height(),
                output.display()
            );
        }
        Command::Encode {
            input,
            rotation,
            pretty,
        } => {
            let bitmap = read_png(&input, config.mask_color()?)?;
            let payload = encode_mask(&bitmap, rotation);
            let json = if pretty {
                payload.to_json_pretty()?
            } else {
                payload.to_json()?
            };
            println!("{json}");
        }
        Command::Info { payload, json } => {
            let payload = load_payload(&payload)?;
            let info = MaskInfo::from_payload(&payload, &config)?;
            if json {
                println!("{}", info.to_json());
            } else {
                print!("{info}");
            }
        }
    }
    Ok(())
}

fn load_payload(path: &Path) -> Result<RegionPayload, CliError> {
    let json = std::fs::read_to_string(path)?;
    Ok(RegionPayload::from_json(&json)?)
}

/// Restore a region from `payload` and render it at natural image size.
///
/// Payloads carrying touches are replayed onto an unzoomed stage of the
/// natural size.
pub fn render_payload(
    payload: &RegionPayload,
    config: &BrushConfig,
    color: Option<&str>,
) -> Result<RasterBuffer, CliError> {
    let mut frame = ImageFrame::new(
        payload.original_width as f64,
        payload.original_height as f64,
    );
    frame.rotation = payload.image_rotation;

    let mut region = MaskRegion::from_payload(payload, &frame, config)?;
    if let Some(color) = color {
        region.set_style(color)?;
    }
    Ok(region.export_bitmap())
}

/// Flattened payload for a mask bitmap.
pub fn encode_mask(bitmap: &RasterBuffer, rotation: f64) -> RegionPayload {
    let rle = RleMask::from_bitmap(bitmap);
    RegionPayload {
        original_width: rle.width,
        original_height: rle.height,
        image_rotation: rotation,
        value: MaskValue::rle(rle.runs),
    }
}

/// Summary printed by `brushmask info`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskInfo {
    pub width: u32,
    pub height: u32,
    pub rotation: f64,
    pub runs: usize,
    pub touches: usize,
    pub painted: usize,
    pub bbox: Option<PixelBox>,
}

impl MaskInfo {
    pub fn from_payload(payload: &RegionPayload, config: &BrushConfig) -> Result<Self, CliError> {
        let bitmap = render_payload(payload, config, None)?;
        Ok(Self {
            width: payload.original_width,
            height: payload.original_height,
            rotation: payload.image_rotation,
            runs: payload.value.rle.len(),
            touches: payload.touches().len(),
            painted: bitmap.painted_count(),
            bbox: compute_bbox(&bitmap),
        })
    }

    /// Painted share of the image in percent.
    pub fn coverage(&self) -> f64 {
        let total = self.width as f64 * self.height as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.painted as f64 / total * 100.0
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "width": self.width,
            "height": self.height,
            "rotation": self.rotation,
            "runs": self.runs,
            "touches": self.touches,
            "painted": self.painted,
            "coverage": self.coverage(),
            "bbox": self.bbox.map(|b| [b.left, b.top, b.right, b.bottom]),
        })
    }
}

impl fmt::Display for MaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "size:     {}x{}", self.width, self.height)?;
        writeln!(f, "rotation: {}", self.rotation)?;
        writeln!(f, "runs:     {}", self.runs)?;
        writeln!(f, "touches:  {}", self.touches)?;
        writeln!(f, "painted:  {} ({:.2}%)", self.painted, self.coverage())?;
        match self.bbox {
            Some(b) => writeln!(
                f,
                "bbox:     {},{} .. {},{} ({}x{})",
                b.left,
                b.top,
                b.right,
                b.bottom,
                b.width(),
                b.height()
            ),
            None => writeln!(f, "bbox:     none"),
        }
    }
}
