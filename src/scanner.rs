use crate::asset::{Asset, NewAsset};
use crate::catalog::CatalogStore;
use crate::error::AppError;
use crate::thumbnail::ThumbnailResolver;
use crate::walker::{discover_files, supported_extension};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// What happened during a scan, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Started {
        root: PathBuf,
    },
    RootMissing {
        root: PathBuf,
    },
    AssetAdded {
        file_path: String,
        thumbnail_path: Option<String>,
    },
    AssetUpdated {
        file_path: String,
        old_size: u64,
        new_size: u64,
    },
    ThumbnailFailed {
        path: PathBuf,
        reason: String,
    },
    FileSkipped {
        path: PathBuf,
        reason: String,
    },
    Completed {
        processed: usize,
    },
}

pub trait ScanListener {
    fn on_event(&self, event: &ScanEvent);
}

/// Writes scan events to the `log` facade.
pub struct LogListener;

impl ScanListener for LogListener {
    fn on_event(&self, event: &ScanEvent) {
        match event {
            ScanEvent::Started { root } => log::info!("Scan started in {}", root.display()),
            ScanEvent::RootMissing { root } => {
                log::error!("Data directory {} does not exist", root.display())
            }
            ScanEvent::AssetAdded { file_path, .. } => log::info!("Added new asset: {}", file_path),
            ScanEvent::AssetUpdated {
                file_path,
                old_size,
                new_size,
            } => log::info!(
                "Updated file size for {} ({} -> {} bytes)",
                file_path,
                old_size,
                new_size
            ),
            ScanEvent::ThumbnailFailed { path, reason } => {
                log::warn!("No thumbnail for {:?}: {}", path, reason)
            }
            ScanEvent::FileSkipped { path, reason } => {
                log::error!("Error processing file {:?}: {}", path, reason)
            }
            ScanEvent::Completed { processed } => {
                log::info!("Scan completed. Processed {} files", processed)
            }
        }
    }
}

/// Result of processing one discovered file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Added(Asset),
    Updated { old_size: u64, new_size: u64 },
    Unchanged,
}

/// Walks a data directory and brings the catalog in line with it.
///
/// Files are handled one at a time, to completion. A failure on one file,
/// including a panic inside a preview backend, is reported as
/// [`ScanEvent::FileSkipped`] and never stops the scan.
pub struct DirectoryScanner<'a, C: CatalogStore + ?Sized> {
    catalog: &'a C,
    resolver: ThumbnailResolver,
    listeners: Vec<&'a dyn ScanListener>,
}

impl<'a, C: CatalogStore + ?Sized> DirectoryScanner<'a, C> {
    pub fn new(catalog: &'a C, resolver: ThumbnailResolver) -> Self {
        Self {
            catalog,
            resolver,
            listeners: vec![&LogListener as &dyn ScanListener],
        }
    }

    pub fn with_listener(mut self, listener: &'a dyn ScanListener) -> Self {
        self.listeners.push(listener);
        self
    }

    fn emit(&self, event: ScanEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }

    /// Scans `root` recursively and returns how many files were processed
    /// without error. A missing root yields 0.
    pub fn scan(&self, root: &Path) -> usize {
        self.emit(ScanEvent::Started {
            root: root.to_path_buf(),
        });

        if !root.is_dir() {
            self.emit(ScanEvent::RootMissing {
                root: root.to_path_buf(),
            });
            self.emit(ScanEvent::Completed { processed: 0 });
            return 0;
        }

        let mut processed = 0;
        for path in discover_files(root) {
            let result = panic::catch_unwind(AssertUnwindSafe(|| self.process_file(root, &path)));
            match result {
                Ok(Ok(outcome)) => {
                    log::trace!("Processed {:?}: {:?}", path, outcome);
                    processed += 1;
                }
                Ok(Err(e)) => self.emit(ScanEvent::FileSkipped {
                    path,
                    reason: e.to_string(),
                }),
                Err(payload) => self.emit(ScanEvent::FileSkipped {
                    path,
                    reason: format!("panicked: {}", panic_message(&*payload)),
                }),
            }
        }

        self.emit(ScanEvent::Completed { processed });
        processed
    }

    /// Inserts `path` when it is new to the catalog, or refreshes its size
    /// when it changed on disk. The thumbnail is only made on insert.
    pub fn process_file(&self, root: &Path, path: &Path) -> Result<FileOutcome, AppError> {
        let file_path = catalog_key(root, path)?;
        let file_size = std::fs::metadata(path)?.len();

        if let Some(existing) = self.catalog.find_by_path(&file_path)? {
            if existing.file_size == file_size {
                return Ok(FileOutcome::Unchanged);
            }
            self.catalog.update_size(&existing, file_size)?;
            self.emit(ScanEvent::AssetUpdated {
                file_path,
                old_size: existing.file_size,
                new_size: file_size,
            });
            return Ok(FileOutcome::Updated {
                old_size: existing.file_size,
                new_size: file_size,
            });
        }

        let ext = supported_extension(path)
            .ok_or_else(|| AppError::Generic(format!("Unsupported file type: {:?}", path)))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let thumbnail_path = match self.resolver.try_resolve(path) {
            Ok(reference) => Some(reference),
            Err(e) => {
                self.emit(ScanEvent::ThumbnailFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        };

        let asset = self.catalog.insert(&NewAsset {
            filename,
            file_path,
            file_type: format!(".{}", ext),
            file_size,
            thumbnail_path,
        })?;
        self.emit(ScanEvent::AssetAdded {
            file_path: asset.file_path.clone(),
            thumbnail_path: asset.thumbnail_path.clone(),
        });
        Ok(FileOutcome::Added(asset))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Catalog identity of `path`: its location relative to `root`, with `/`
/// separators on every platform.
pub fn catalog_key(root: &Path, path: &Path) -> Result<String, AppError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| AppError::Generic(format!("{:?} is not under {:?}", path, root)))?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
