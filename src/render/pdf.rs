use super::{fit_within, to_solid, PreviewRenderer, THUMBNAIL_SIZE};
use crate::error::AppError;
use image::{DynamicImage, RgbaImage};
use lazy_static::lazy_static;
use pdfium_render::prelude::{PdfRenderConfig, Pdfium, PdfiumError};
use std::path::Path;

/// Resolution the first page is rendered at before downscaling.
pub const PDF_RENDER_DPI: f32 = 150.0;

/// PDF user space is defined at 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

// Looked up in the current working directory first, then in the system paths.
const BINDING_LOCATION: &str = "./";

lazy_static! {
    static ref PDFIUM: Option<Pdfium> = Pdfium::bind_to_library(
        Pdfium::pdfium_platform_library_name_at_path(BINDING_LOCATION)
    )
    .or_else(|_| Pdfium::bind_to_system_library())
    .map(Pdfium::new)
    .map_err(|e| log::error!("Unable to load the pdfium library: {:?}", e))
    .ok();
}

fn pdf_error(e: PdfiumError) -> AppError {
    AppError::Pdf(format!("{:?}", e))
}

pub struct PdfRenderer;

impl PreviewRenderer for PdfRenderer {
    fn render(&self, path: &Path) -> Result<DynamicImage, AppError> {
        let pdfium = PDFIUM
            .as_ref()
            .ok_or_else(|| AppError::Pdf("pdfium library is not available".into()))?;

        let document = pdfium.load_pdf_from_file(path, None).map_err(pdf_error)?;
        let page = document.pages().first().map_err(pdf_error)?;

        let config = PdfRenderConfig::new().scale_page_by_factor(PDF_RENDER_DPI / POINTS_PER_INCH);
        let bitmap = page.render_with_config(&config).map_err(pdf_error)?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        log::trace!("Rendered first page of {:?} at {}x{}", path, width, height);

        let page_image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
            .ok_or_else(|| AppError::Render("page bitmap size does not match its buffer".into()))?;

        Ok(fit_within(
            to_solid(DynamicImage::ImageRgba8(page_image)),
            THUMBNAIL_SIZE,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A one-page PDF with a blank page of the given size in points.
    fn single_page_pdf(width: u32, height: u32) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << >> >>",
                width, height
            ),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_render_first_page_fits_and_keeps_aspect_ratio() {
        if PDFIUM.is_none() {
            eprintln!("pdfium is not available, skipping");
            return;
        }
        let temp_dir = TempDir::new().unwrap();

        // US letter, portrait: 1275x1650 at 150 DPI before fitting.
        let portrait = temp_dir.path().join("portrait.pdf");
        std::fs::write(&portrait, single_page_pdf(612, 792)).unwrap();
        let image = PdfRenderer.render(&portrait).unwrap();
        assert_eq!(image.height(), THUMBNAIL_SIZE);
        assert!(image.width() <= THUMBNAIL_SIZE);
        assert!((image.width() as i64 - 232).abs() <= 1);
        assert!(!image.color().has_alpha());

        let landscape = temp_dir.path().join("landscape.pdf");
        std::fs::write(&landscape, single_page_pdf(792, 612)).unwrap();
        let image = PdfRenderer.render(&landscape).unwrap();
        assert_eq!(image.width(), THUMBNAIL_SIZE);
        assert!((image.height() as i64 - 232).abs() <= 1);
    }

    // Fails the same way whether or not pdfium is installed.
    #[test]
    fn test_render_corrupt_pdf_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4 truncated").unwrap();

        assert!(PdfRenderer.render(&path).is_err());
    }
}
