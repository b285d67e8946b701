use crate::asset::{Asset, NewAsset, Tag};
use crate::catalog::CatalogStore;
use crate::error::AppError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const ASSET_COLUMNS: &str =
    "a.id, a.filename, a.file_path, a.file_type, a.file_size, a.thumbnail_path, a.created_at, a.updated_at";

/// SQLite-backed catalog. Holds the assets written by the scanner and the
/// tags attached to them by the web layer.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Opens (or creates) the catalog database at `db_path`, creating its
    /// parent directory when missing.
    pub fn open(db_path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::debug!("Created database directory: {:?}", parent);
            }
        }

        let conn = Connection::open(db_path)?;
        log::info!("Catalog database opened at: {}", db_path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AppError> {
        let catalog = SqliteCatalog { conn };
        catalog.init_schema()?;
        Ok(catalog)
    }

    fn init_schema(&self) -> Result<(), AppError> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS assets (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                filename        TEXT NOT NULL,
                file_path       TEXT NOT NULL UNIQUE,
                file_type       TEXT NOT NULL,
                file_size       INTEGER NOT NULL DEFAULT 0,
                thumbnail_path  TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tags (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL UNIQUE,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS asset_tags (
                asset_id        INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
                tag_id          INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (asset_id, tag_id)
            );

            CREATE INDEX IF NOT EXISTS idx_assets_created_at ON assets(created_at DESC);",
        )?;
        log::debug!("Catalog schema created/verified");
        Ok(())
    }

    fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
        let file_size: i64 = row.get(4)?;
        Ok(Asset {
            id: row.get(0)?,
            filename: row.get(1)?,
            file_path: row.get(2)?,
            file_type: row.get(3)?,
            file_size: file_size.max(0) as u64,
            thumbnail_path: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            tags: Vec::new(),
        })
    }

    fn tag_names(&self, asset_id: i64) -> Result<Vec<String>, AppError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name FROM tags t
             JOIN asset_tags at ON at.tag_id = t.id
             WHERE at.asset_id = ?1
             ORDER BY t.name",
        )?;
        let names = stmt
            .query_map([asset_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn with_tags(&self, mut asset: Asset) -> Result<Asset, AppError> {
        asset.tags = self.tag_names(asset.id)?;
        Ok(asset)
    }

    pub fn find_by_id(&self, asset_id: i64) -> Result<Option<Asset>, AppError> {
        let asset = self
            .conn
            .query_row(
                &format!("SELECT {} FROM assets a WHERE a.id = ?1", ASSET_COLUMNS),
                [asset_id],
                Self::asset_from_row,
            )
            .optional()?;
        asset.map(|a| self.with_tags(a)).transpose()
    }

    /// All assets, newest first. A non-empty `tag_filter` keeps only assets
    /// carrying a tag whose name contains it, ignoring case.
    pub fn list_assets(&self, tag_filter: Option<&str>) -> Result<Vec<Asset>, AppError> {
        let filter = tag_filter.map(str::trim).filter(|f| !f.is_empty());

        let assets = match filter {
            Some(filter) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM assets a
                     WHERE EXISTS (
                        SELECT 1 FROM asset_tags at
                        JOIN tags t ON t.id = at.tag_id
                        WHERE at.asset_id = a.id
                          AND LOWER(t.name) LIKE '%' || LOWER(?1) || '%'
                     )
                     ORDER BY a.created_at DESC, a.id DESC",
                    ASSET_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([filter], Self::asset_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM assets a ORDER BY a.created_at DESC, a.id DESC",
                    ASSET_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], Self::asset_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        assets.into_iter().map(|a| self.with_tags(a)).collect()
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Attaches `tag_name` to the asset, creating the tag on first use.
    /// Returns `false` when the asset already carried the tag.
    pub fn add_tag(&self, asset_id: i64, tag_name: &str) -> Result<bool, AppError> {
        let tag_name = tag_name.trim();
        if tag_name.is_empty() {
            return Err(AppError::BadRequest("Tag name must not be empty".into()));
        }
        let asset = self
            .find_by_id(asset_id)?
            .ok_or_else(|| AppError::NotFound(format!("Asset {}", asset_id)))?;

        self.conn.execute(
            "INSERT OR IGNORE INTO tags (name, created_at) VALUES (?1, ?2)",
            params![tag_name, Utc::now()],
        )?;
        let tag_id: i64 =
            self.conn
                .query_row("SELECT id FROM tags WHERE name = ?1", [tag_name], |row| {
                    row.get(0)
                })?;

        let linked = self.conn.execute(
            "INSERT OR IGNORE INTO asset_tags (asset_id, tag_id) VALUES (?1, ?2)",
            params![asset_id, tag_id],
        )?;
        if linked > 0 {
            log::info!("Added tag '{}' to asset {}", tag_name, asset.filename);
        }
        Ok(linked > 0)
    }

    /// Detaches a tag from an asset. Returns `false` when they were not linked.
    pub fn remove_tag(&self, asset_id: i64, tag_id: i64) -> Result<bool, AppError> {
        let asset = self
            .find_by_id(asset_id)?
            .ok_or_else(|| AppError::NotFound(format!("Asset {}", asset_id)))?;
        let tag_name: String = self
            .conn
            .query_row("SELECT name FROM tags WHERE id = ?1", [tag_id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("Tag {}", tag_id)))?;

        let removed = self.conn.execute(
            "DELETE FROM asset_tags WHERE asset_id = ?1 AND tag_id = ?2",
            params![asset_id, tag_id],
        )?;
        if removed > 0 {
            log::info!("Removed tag '{}' from asset {}", tag_name, asset.filename);
        }
        Ok(removed > 0)
    }
}

impl CatalogStore for SqliteCatalog {
    fn find_by_path(&self, file_path: &str) -> Result<Option<Asset>, AppError> {
        log::trace!("Looking up catalog entry for: {}", file_path);
        let asset = self
            .conn
            .query_row(
                &format!("SELECT {} FROM assets a WHERE a.file_path = ?1", ASSET_COLUMNS),
                [file_path],
                Self::asset_from_row,
            )
            .optional()?;
        asset.map(|a| self.with_tags(a)).transpose()
    }

    fn insert(&self, asset: &NewAsset) -> Result<Asset, AppError> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO assets (filename, file_path, file_type, file_size, thumbnail_path, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                asset.filename,
                asset.file_path,
                asset.file_type,
                asset.file_size as i64,
                asset.thumbnail_path,
                now,
                now,
            ],
        )?;

        Ok(Asset {
            id: self.conn.last_insert_rowid(),
            filename: asset.filename.clone(),
            file_path: asset.file_path.clone(),
            file_type: asset.file_type.clone(),
            file_size: asset.file_size,
            thumbnail_path: asset.thumbnail_path.clone(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        })
    }

    fn update_size(&self, asset: &Asset, new_size: u64) -> Result<(), AppError> {
        let updated = self.conn.execute(
            "UPDATE assets SET file_size = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_size as i64, Utc::now(), asset.id],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Asset {}", asset.file_path)));
        }
        Ok(())
    }
}

// Connection has no useful Debug output; show the database path instead.
impl std::fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCatalog")
            .field("path", &self.conn.path())
            .finish()
    }
}
