use super::{PreviewRenderer, THUMBNAIL_SIZE};
use crate::error::AppError;
use image::{DynamicImage, RgbaImage};
use lazy_static::lazy_static;
use resvg::{tiny_skia, usvg};
use std::path::Path;
use std::sync::Arc;

lazy_static! {
    static ref FONT_DB: Arc<usvg::fontdb::Database> = {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        log::debug!("Loaded {} system font faces for SVG text", fontdb.len());
        Arc::new(fontdb)
    };
}

pub struct SvgRenderer;

/// Output size for a drawing of `width`×`height` user units: 300 px wide,
/// unless that would make it taller than 300 px, in which case the height is
/// capped instead.
pub fn output_size(width: f32, height: f32) -> Option<(u32, u32)> {
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    let target = THUMBNAIL_SIZE as f32;
    let scale = (target / width).min(target / height);
    let out_w = (width * scale).round().clamp(1.0, target) as u32;
    let out_h = (height * scale).round().clamp(1.0, target) as u32;
    Some((out_w, out_h))
}

impl PreviewRenderer for SvgRenderer {
    fn render(&self, path: &Path) -> Result<DynamicImage, AppError> {
        let data = std::fs::read(path)?;

        let options = usvg::Options {
            fontdb: FONT_DB.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_data(&data, &options)?;

        let size = tree.size();
        let (width, height) = output_size(size.width(), size.height())
            .ok_or_else(|| AppError::Render(format!("SVG has no usable size: {:?}", path)))?;
        log::trace!(
            "Rasterizing {:?} from {}x{} to {}x{}",
            path,
            size.width(),
            size.height(),
            width,
            height
        );

        let transform = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| AppError::Render("failed to allocate pixmap".into()))?;
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha; `image` expects straight alpha.
        let pixels: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.demultiply();
                [color.red(), color.green(), color.blue(), color.alpha()]
            })
            .collect();

        RgbaImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| AppError::Render("pixmap size does not match its buffer".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_svg(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
                <rect x="0" y="0" width="{w}" height="{h}" fill="red"/>
            </svg>"#,
            w = width,
            h = height
        );
        std::fs::write(&path, svg).unwrap();
        path
    }

    #[test]
    fn test_output_size() {
        assert_eq!(output_size(600.0, 300.0), Some((300, 150)));
        assert_eq!(output_size(100.0, 50.0), Some((300, 150)));
        assert_eq!(output_size(100.0, 400.0), Some((75, 300)));
        assert_eq!(output_size(0.0, 10.0), None);
    }

    #[test]
    fn test_render_wide_svg_at_fixed_width() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_svg(temp_dir.path(), "sign.svg", 120, 60);

        let preview = SvgRenderer.render(&path).unwrap();
        assert_eq!((preview.width(), preview.height()), (300, 150));

        let pixel = preview.to_rgba8().get_pixel(150, 75).0;
        assert_eq!(pixel, [255, 0, 0, 255]);
    }

    #[test]
    fn test_render_tall_svg_stays_inside_box() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_svg(temp_dir.path(), "tower.svg", 50, 200);

        let preview = SvgRenderer.render(&path).unwrap();
        assert_eq!((preview.width(), preview.height()), (75, 300));
    }

    #[test]
    fn test_render_invalid_svg_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.svg");
        std::fs::write(&path, "<svg").unwrap();

        assert!(SvgRenderer.render(&path).is_err());
    }
}
