//! Format-specific preview backends.
//!
//! Every backend turns one source file into an in-memory image no larger than
//! [`THUMBNAIL_SIZE`] on either side. Writing the result to disk is left to
//! the caller so a failed render never leaves a partial file behind.

pub mod archive;
pub mod pdf;
pub mod raster;
pub mod svg;

use crate::error::AppError;
use image::{imageops::FilterType, DynamicImage};
use std::path::Path;

/// Longest edge of a generated preview, in pixels.
pub const THUMBNAIL_SIZE: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Vector,
    Document,
    Raster,
    Archive,
}

impl FileKind {
    /// Maps a lower-cased extension (no dot) to the backend that handles it.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "svg" => Some(FileKind::Vector),
            "pdf" => Some(FileKind::Document),
            "png" | "jpg" | "jpeg" => Some(FileKind::Raster),
            "zip" => Some(FileKind::Archive),
            _ => None,
        }
    }
}

pub trait PreviewRenderer {
    fn render(&self, path: &Path) -> Result<DynamicImage, AppError>;
}

pub fn renderer_for(kind: FileKind) -> &'static dyn PreviewRenderer {
    match kind {
        FileKind::Vector => &svg::SvgRenderer,
        FileKind::Document => &pdf::PdfRenderer,
        FileKind::Raster => &raster::RasterRenderer,
        FileKind::Archive => &archive::ArchiveRenderer,
    }
}

/// Shrinks `image` to fit a `max`×`max` box, keeping its aspect ratio.
/// Images already inside the box are returned untouched.
pub(crate) fn fit_within(image: DynamicImage, max: u32) -> DynamicImage {
    if image.width() <= max && image.height() <= max {
        return image;
    }
    image.resize(max, max, FilterType::Lanczos3)
}

/// Drops the alpha channel so previews are stored as solid RGB.
pub(crate) fn to_solid(image: DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    }
}
