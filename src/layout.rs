//! On-disk layout of the harvest data directory.
//!
//! ```text
//! <data>/
//!   dotgov.csv                  domain directory cache
//!   inventory-list.json         discovered inventory references
//!   agencies/<id>.data.json     cached inventory payloads
//!   master-inventory.json       merged records
//!   master-inventory.csv        merged CSV export
//! ```

use std::io;
use std::path::{Path, PathBuf};

const DIRECTORY_CSV: &str = "dotgov.csv";
const INVENTORY_LIST: &str = "inventory-list.json";
const AGENCIES_DIR: &str = "agencies";
const PAYLOAD_SUFFIX: &str = ".data.json";
const MERGED_JSON: &str = "master-inventory.json";
const MERGED_CSV: &str = "master-inventory.csv";

/// Paths of every file the pipeline reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Creates a layout rooted at `root`. Nothing is touched on disk.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Creates the data and payload directories if absent.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.agencies_dir())
    }

    /// Data directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn directory_csv(&self) -> PathBuf {
        self.root.join(DIRECTORY_CSV)
    }

    #[must_use]
    pub fn inventory_list(&self) -> PathBuf {
        self.root.join(INVENTORY_LIST)
    }

    #[must_use]
    pub fn agencies_dir(&self) -> PathBuf {
        self.root.join(AGENCIES_DIR)
    }

    /// Cache path for the payload of the domain with slug `id`.
    #[must_use]
    pub fn payload_path(&self, id: &str) -> PathBuf {
        self.agencies_dir().join(format!("{id}{PAYLOAD_SUFFIX}"))
    }

    #[must_use]
    pub fn merged_json(&self) -> PathBuf {
        self.root.join(MERGED_JSON)
    }

    #[must_use]
    pub fn merged_csv(&self) -> PathBuf {
        self.root.join(MERGED_CSV)
    }
}
