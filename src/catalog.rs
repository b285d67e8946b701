use crate::asset::{Asset, NewAsset};
use crate::error::AppError;

/// The persisted set of known files, as seen by the scanner.
///
/// Writes are synchronous: `find_by_path` must observe every earlier
/// `insert` made through the same store.
pub trait CatalogStore {
    fn find_by_path(&self, file_path: &str) -> Result<Option<Asset>, AppError>;
    fn insert(&self, asset: &NewAsset) -> Result<Asset, AppError>;
    /// Sets the stored size and bumps `updated_at`. Nothing else changes.
    fn update_size(&self, asset: &Asset, new_size: u64) -> Result<(), AppError>;
}
