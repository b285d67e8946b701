use crate::error::AppError;
use crate::render::{renderer_for, FileKind};
use crate::walker::supported_extension;
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Curator-supplied previews looked for next to each file, in priority order.
pub const SIBLING_PREVIEW_NAMES: [&str; 3] = ["preview.jpg", "preview.png", "preview.jpeg"];

/// Prefix of every thumbnail reference stored in the catalog.
pub const THUMBNAIL_REFERENCE_PREFIX: &str = "thumbnails";

/// Produces the stored thumbnail for a discovered file.
///
/// A sibling `preview.*` image always wins and is copied as-is; otherwise the
/// format backend renders a PNG. Each successful call writes exactly one file
/// into the thumbnail directory.
#[derive(Debug, Clone)]
pub struct ThumbnailResolver {
    thumbnail_dir: PathBuf,
}

impl ThumbnailResolver {
    pub fn new(thumbnail_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let thumbnail_dir = thumbnail_dir.into();
        if !thumbnail_dir.exists() {
            std::fs::create_dir_all(&thumbnail_dir)?;
            log::debug!("Created thumbnail directory: {:?}", thumbnail_dir);
        }
        Ok(Self { thumbnail_dir })
    }

    pub fn thumbnail_dir(&self) -> &Path {
        &self.thumbnail_dir
    }

    /// Thumbnail reference for `path`, or `None` when no preview could be made.
    pub fn resolve(&self, path: &Path) -> Option<String> {
        match self.try_resolve(path) {
            Ok(reference) => Some(reference),
            Err(e) => {
                log::error!("Error generating thumbnail for {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn try_resolve(&self, path: &Path) -> Result<String, AppError> {
        let stem = file_stem(path);

        if let Some(preview) = sibling_preview(path) {
            let ext = preview
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            let name = format!("{}_preview.{}", stem, ext);
            std::fs::copy(&preview, self.thumbnail_dir.join(&name))?;
            log::info!("Used existing preview for {:?}", path.file_name().unwrap_or_default());
            return Ok(reference(&name));
        }

        let kind = supported_extension(path)
            .as_deref()
            .and_then(FileKind::from_extension)
            .ok_or_else(|| {
                AppError::Render(format!("No thumbnail generation method for {:?}", path))
            })?;

        let preview = renderer_for(kind).render(path)?;
        let name = format!("{}_thumb.png", stem);
        preview.save_with_format(self.thumbnail_dir.join(&name), ImageFormat::Png)?;
        log::info!(
            "Generated {}x{} thumbnail for {:?}",
            preview.width(),
            preview.height(),
            path.file_name().unwrap_or_default()
        );
        Ok(reference(&name))
    }
}

fn sibling_preview(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    SIBLING_PREVIEW_NAMES
        .iter()
        .map(|name| parent.join(name))
        .find(|candidate| candidate.is_file())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn reference(name: &str) -> String {
    format!("{}/{}", THUMBNAIL_REFERENCE_PREFIX, name)
}
