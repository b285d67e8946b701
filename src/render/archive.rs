use super::{fit_within, to_solid, PreviewRenderer, THUMBNAIL_SIZE};
use crate::error::AppError;
use image::{DynamicImage, Rgb, RgbImage};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Entry names (compared lower-cased) that count as a bundled preview.
pub const ARCHIVE_PREVIEW_NAMES: [&str; 5] = [
    "preview.jpg",
    "preview.png",
    "preview.jpeg",
    "thumbnail.png",
    "thumb.jpg",
];

/// Light blue fill used when an archive carries no usable preview.
pub const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([173, 216, 230]);

/// Renders zip bundles. Always produces an image: archives without a
/// bundled preview get a solid placeholder.
pub struct ArchiveRenderer;

pub fn placeholder() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(
        THUMBNAIL_SIZE,
        THUMBNAIL_SIZE,
        PLACEHOLDER_COLOR,
    ))
}

/// Decodes the first entry, in listing order, whose name is a known preview.
fn extract_preview(path: &Path) -> Result<Option<DynamicImage>, AppError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    for index in 0..archive.len() {
        let is_preview = archive
            .name_for_index(index)
            .map(|name| ARCHIVE_PREVIEW_NAMES.contains(&name.to_lowercase().as_str()))
            .unwrap_or(false);
        if !is_preview {
            continue;
        }

        let mut entry = archive.by_index(index)?;
        log::debug!("Using bundled preview {} from {:?}", entry.name(), path);
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        return Ok(Some(image::load_from_memory(&data)?));
    }

    Ok(None)
}

impl PreviewRenderer for ArchiveRenderer {
    fn render(&self, path: &Path) -> Result<DynamicImage, AppError> {
        match extract_preview(path) {
            Ok(Some(preview)) => Ok(fit_within(to_solid(preview), THUMBNAIL_SIZE)),
            Ok(None) => {
                log::debug!("No bundled preview in {:?}, using placeholder", path);
                Ok(placeholder())
            }
            Err(e) => {
                log::warn!("Could not read preview from {:?}: {}. Using placeholder", path, e);
                Ok(placeholder())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn png_bytes(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_render_uses_bundled_preview() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bundle.zip");
        write_zip(
            &path,
            &[
                ("box.svg", b"<svg/>".to_vec()),
                ("PREVIEW.PNG", png_bytes(600, 300, Rgba([0, 255, 0, 255]))),
            ],
        );

        let preview = ArchiveRenderer.render(&path).unwrap();
        assert_eq!((preview.width(), preview.height()), (300, 150));
        assert_eq!(preview.to_rgb8().get_pixel(10, 10), &Rgb([0, 255, 0]));
    }

    #[test]
    fn test_render_picks_first_match_in_listing_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bundle.zip");
        write_zip(
            &path,
            &[
                ("thumb.jpg", png_bytes(20, 20, Rgba([0, 0, 255, 255]))),
                ("preview.png", png_bytes(20, 20, Rgba([255, 0, 0, 255]))),
            ],
        );

        let preview = ArchiveRenderer.render(&path).unwrap();
        assert_eq!(preview.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_render_nested_preview_is_not_matched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bundle.zip");
        write_zip(
            &path,
            &[("images/preview.png", png_bytes(20, 20, Rgba([255, 0, 0, 255])))],
        );

        let preview = ArchiveRenderer.render(&path).unwrap();
        assert_eq!(preview.to_rgb8(), placeholder().to_rgb8());
    }

    #[test]
    fn test_render_without_preview_gives_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bundle.zip");
        write_zip(&path, &[("cut.svg", b"<svg/>".to_vec())]);

        let preview = ArchiveRenderer.render(&path).unwrap();
        assert_eq!((preview.width(), preview.height()), (300, 300));
        assert!(preview
            .to_rgb8()
            .pixels()
            .all(|pixel| *pixel == PLACEHOLDER_COLOR));
    }

    #[test]
    fn test_render_corrupt_archive_gives_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.zip");
        std::fs::write(&path, b"not a zip at all").unwrap();

        let preview = ArchiveRenderer.render(&path).unwrap();
        assert_eq!(preview.to_rgb8(), placeholder().to_rgb8());
    }
}
