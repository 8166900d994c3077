//! Image derivative generation
//!
//! Exports deliver bounded derivatives rather than the archival masters:
//! every staged image is scaled to fit the derivative bounds, aspect ratio
//! preserved, and written as JPEG regardless of the staged filename's
//! extension.

use crate::domain::errors::ArcaError;
use crate::domain::result::Result;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// Bounding box of exported derivatives, in pixels.
pub const DERIVATIVE_BOUNDS: (u32, u32) = (600, 600);

/// Produces the staged derivative for one source image.
pub trait DerivativeWriter: Send + Sync {
    fn write_derivative(&self, source: &Path, dest: &Path) -> Result<()>;
}

/// JPEG derivative writer on the `image` crate.
pub struct JpegDerivativeWriter {
    max_width: u32,
    max_height: u32,
}

impl JpegDerivativeWriter {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

impl Default for JpegDerivativeWriter {
    fn default() -> Self {
        let (width, height) = DERIVATIVE_BOUNDS;
        Self::new(width, height)
    }
}

impl DerivativeWriter for JpegDerivativeWriter {
    fn write_derivative(&self, source: &Path, dest: &Path) -> Result<()> {
        let img = image::open(source).map_err(|err| {
            ArcaError::Imaging(format!("cannot read {}: {err}", source.display()))
        })?;
        let scaled = img.resize(self.max_width, self.max_height, FilterType::Lanczos3);
        // JPEG has no alpha channel
        let flattened = DynamicImage::ImageRgb8(scaled.to_rgb8());
        flattened
            .save_with_format(dest, ImageFormat::Jpeg)
            .map_err(|err| {
                ArcaError::Imaging(format!("cannot write {}: {err}", dest.display()))
            })?;
        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            width = flattened.width(),
            height = flattened.height(),
            "wrote derivative"
        );
        Ok(())
    }
}
