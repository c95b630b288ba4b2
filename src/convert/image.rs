//! Image conversion in-process through the `image` crate.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use super::{ConvertError, converted_sibling};

pub const TARGETS: &[&str] = &["png", "jpg", "bmp", "gif", "tiff"];

pub fn convert(input: &Path, target_ext: &str) -> Result<PathBuf, ConvertError> {
    if !TARGETS.contains(&target_ext) {
        return Err(ConvertError::UnsupportedTarget(target_ext.to_string()));
    }

    let decoded = image::open(input)?;
    // JPEG and BMP encoders reject alpha channels.
    let decoded = match target_ext {
        "jpg" | "bmp" => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        _ => decoded,
    };

    let output_path = converted_sibling(input, target_ext);
    decoded.save(&output_path)?;
    Ok(output_path)
}
