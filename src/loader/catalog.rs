//! # Catalog Persistence
//!
//! All metadata (users, feeds, columns, file records) is kept in a single
//! `catalog.json`. Payloads live in the storage backend, not here.
//!
//! Writes go to `catalog.json.tmp`, are fsynced, then renamed over the
//! previous catalog so a crash never leaves a half-written file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::column::Column;
use super::errors::{LoaderError, LoaderResult};
use super::feed::Feed;
use super::file::DataFile;
use crate::auth::User;

pub const CATALOG_FILE: &str = "catalog.json";
const FORMAT_VERSION: u32 = 1;

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

/// Serialized form of everything the service knows about
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub feeds: Vec<Feed>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub files: Vec<DataFile>,
}

/// Reads and writes the catalog file
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store for `<data_dir>/catalog.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CATALOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the catalog
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// A missing file is an empty catalog
    pub fn load(&self) -> LoaderResult<Catalog> {
        if !self.exists() {
            return Ok(Catalog {
                format_version: FORMAT_VERSION,
                ..Catalog::default()
            });
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            LoaderError::Catalog(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let catalog: Catalog = serde_json::from_str(&content).map_err(|e| {
            LoaderError::Catalog(format!("Invalid catalog {}: {}", self.path.display(), e))
        })?;

        if catalog.format_version != FORMAT_VERSION {
            return Err(LoaderError::Catalog(format!(
                "Unsupported catalog format version {}",
                catalog.format_version
            )));
        }

        Ok(catalog)
    }

    pub fn save(&self, catalog: &Catalog) -> LoaderResult<()> {
        let json = serde_json::to_vec_pretty(catalog)
            .map_err(|e| LoaderError::Catalog(format!("Failed to serialize catalog: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
