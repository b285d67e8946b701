// src/asset.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog record for one source file, keyed by its root-relative path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: u64,
    pub thumbnail_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// The fields the scanner knows when it first sees a file.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub filename: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: u64,
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
