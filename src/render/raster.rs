use super::{fit_within, to_solid, PreviewRenderer, THUMBNAIL_SIZE};
use crate::error::AppError;
use image::{io::Reader as ImageReader, DynamicImage};
use std::path::Path;

pub struct RasterRenderer;

impl PreviewRenderer for RasterRenderer {
    fn render(&self, path: &Path) -> Result<DynamicImage, AppError> {
        log::trace!("Opening image for thumbnail generation: {:?}", path);
        // Sniff the content rather than trusting the extension.
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        log::debug!("Decoded {:?}: {}x{}", path, image.width(), image.height());
        Ok(fit_within(to_solid(image), THUMBNAIL_SIZE))
    }
}
