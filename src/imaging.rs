//! Image decoding, re-encoding and post-processing.

use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};

use crate::artifacts::{persist, temp_sibling};

/// JPEG quality for saved images.
pub const JPEG_QUALITY: u8 = 90;

/// Side length the watermark logo is resized to, in pixels.
pub const WATERMARK_SIZE: u32 = 100;

/// Distance between the watermark and the bottom-right corner, in pixels.
pub const WATERMARK_INSET: u32 = 10;

/// Brightness multiplier applied by [`darken`] for mood videos.
pub const MOOD_BRIGHTNESS: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode an image from memory, sniffing the format from its content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImagingError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Load an image from disk, sniffing the format from its content rather than
/// trusting the extension.
pub fn load(path: &Path) -> Result<DynamicImage, ImagingError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(img)
}

/// Encode `img` as RGB JPEG into `writer`.
pub fn encode_jpeg<W: Write>(img: &DynamicImage, writer: W) -> Result<(), ImagingError> {
    let mut writer = BufWriter::new(writer);
    let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder)?;
    writer.flush()?;
    Ok(())
}

/// Encode `img` as RGB JPEG and atomically replace `dest` with it.
pub fn save_jpeg(img: &DynamicImage, dest: &Path) -> Result<(), ImagingError> {
    let temp = temp_sibling(dest)?;
    encode_jpeg(img, temp.as_file())?;
    persist(temp, dest)?;
    Ok(())
}

/// Composite the logo at `logo_path` into the bottom-right corner of the
/// image at `image_path`, in place.
///
/// The logo is resized to [`WATERMARK_SIZE`] square and inset by
/// [`WATERMARK_INSET`]; its alpha channel is respected.
pub fn apply_watermark(image_path: &Path, logo_path: &Path) -> Result<(), ImagingError> {
    let mut base = load(image_path)?.to_rgba8();
    let logo = load(logo_path)?
        .resize_exact(WATERMARK_SIZE, WATERMARK_SIZE, FilterType::Lanczos3)
        .to_rgba8();

    let offset = WATERMARK_SIZE + WATERMARK_INSET;
    let x = i64::from(base.width()) - i64::from(offset);
    let y = i64::from(base.height()) - i64::from(offset);
    // Negative offsets clip the logo on images smaller than the logo area.
    image::imageops::overlay(&mut base, &logo, x, y);

    save_jpeg(&DynamicImage::ImageRgba8(base), image_path)
}

/// Scale every channel of `img` by `factor` (0.0 = black, 1.0 = unchanged).
pub fn darken(img: &DynamicImage, factor: f32) -> RgbImage {
    let factor = factor.clamp(0.0, 1.0);
    let mut rgb = img.to_rgb8();
    for pixel in rgb.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (f32::from(*channel) * factor).round() as u8;
        }
    }
    rgb
}
