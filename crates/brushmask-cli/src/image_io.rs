//! PNG reading and writing.

use crate::error::CliError;
use brushmask_core::{MaskColor, RasterBuffer};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Read a PNG as a mask filled with `color`.
pub fn read_png(path: &Path, color: MaskColor) -> Result<RasterBuffer, CliError> {
    let file = File::open(path)?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    let coverage = coverage(&buf[..info.buffer_size()], info.color_type)?;
    log::debug!(
        "Read {}x{} {:?} PNG from {}",
        info.width,
        info.height,
        info.color_type,
        path.display()
    );
    RasterBuffer::from_mask(info.width, info.height, &coverage, color)
        .ok_or_else(|| CliError::Image(format!("{}: truncated pixel data", path.display())))
}

/// Painted pixels of 8-bit image data.
fn coverage(data: &[u8], color_type: png::ColorType) -> Result<Vec<bool>, CliError> {
    let (channels, alpha) = match color_type {
        png::ColorType::Grayscale => (1, None),
        png::ColorType::GrayscaleAlpha => (2, Some(1)),
        png::ColorType::Rgb => (3, None),
        png::ColorType::Rgba => (4, Some(3)),
        png::ColorType::Indexed => {
            return Err(CliError::Image("indexed color was not expanded".to_string()));
        }
    };
    Ok(data
        .chunks_exact(channels)
        .map(|px| match alpha {
            Some(a) => px[a] > 0,
            None => px.iter().any(|&v| v > 0),
        })
        .collect())
}

/// Write a bitmap as an 8-bit RGBA PNG.
pub fn write_png(path: &Path, bitmap: &RasterBuffer) -> Result<(), CliError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), bitmap.width(), bitmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(bitmap.data())?;
    writer.finish()?;
    log::debug!(
        "Wrote {}x{} PNG to {}",
        bitmap.width(),
        bitmap.height(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_png_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let color = MaskColor::new(10, 20, 30, 255);
        let mask = [true, false, false, true, true, false];
        let bitmap = RasterBuffer::from_mask(3, 2, &mask, color).unwrap();

        write_png(&path, &bitmap).unwrap();
        let read = read_png(&path, color).unwrap();
        assert_eq!(read, bitmap);
    }

    #[test]
    fn test_grayscale_png_uses_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = png::Encoder::new(BufWriter::new(file), 2, 2);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 255, 7, 0]).unwrap();
        }

        let read = read_png(&path, MaskColor::default()).unwrap();
        assert_eq!(read.coverage(), vec![false, true, true, false]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = read_png(&dir.path().join("missing.png"), MaskColor::default());
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
