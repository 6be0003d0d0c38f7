//! Example catalog - the ordered list of programs the user can load
//!
//! The first entry is the session default. Entries are fixed once the catalog
//! is handed to a session; fetching never mutates the catalog.

mod bundled;
mod entry;

use std::fs;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::CatalogError;

pub use entry::{ExampleEntry, Locator};

/// Read side of the catalog, as consumed by the session controller
#[async_trait]
pub trait Catalog: Send + Sync {
    fn entries(&self) -> &[ExampleEntry];

    /// Resolve a locator to its text. Safe to call concurrently.
    async fn fetch(&self, locator: &Locator) -> Result<String, CatalogError>;

    fn find(&self, name: &str) -> Option<&ExampleEntry> {
        self.entries().iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExampleCatalog {
    entries: Vec<ExampleEntry>,
}

impl ExampleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the programs shipped with the binary
    pub fn with_bundled() -> Self {
        let mut catalog = Self::new();
        for key in bundled::keys() {
            catalog.register(ExampleEntry::bundled(key));
        }
        catalog
    }

    /// Add an entry. An entry with the same name is replaced in place.
    pub fn register(&mut self, entry: ExampleEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == entry.name) {
            debug!(name = %entry.name, locator = %entry.locator, "replacing example");
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Register every `.lox` file in `dir`, sorted by name. Returns how many were added.
    pub fn add_dir(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        let read_dir = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

        let mut files: Vec<_> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "lox"))
            .collect();
        files.sort_by_key(|p| p.file_name().map(|n| n.to_string_lossy().to_lowercase()));

        let count = files.len();
        for path in files {
            self.register(ExampleEntry::file(path));
        }
        Ok(count)
    }

    /// Move the named entry to the front so it becomes the session default
    pub fn set_default(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(idx) => {
                let entry = self.entries.remove(idx);
                self.entries.insert(0, entry);
                true
            }
            None => {
                warn!(name, "default example is not in the catalog");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl Catalog for ExampleCatalog {
    fn entries(&self) -> &[ExampleEntry] {
        &self.entries
    }

    async fn fetch(&self, locator: &Locator) -> Result<String, CatalogError> {
        match locator {
            Locator::Bundled(key) => bundled::lookup(key)
                .map(str::to_string)
                .ok_or_else(|| CatalogError::NotFound(locator.to_string())),
            Locator::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
                String::from_utf8(bytes).map_err(|_| {
                    CatalogError::Transport(format!("{}: not valid UTF-8", path.display()))
                })
            }
        }
    }
}

fn io_error(path: &Path, err: io::Error) -> CatalogError {
    if err.kind() == io::ErrorKind::NotFound {
        CatalogError::NotFound(path.display().to_string())
    } else {
        CatalogError::Transport(format!("{}: {}", path.display(), err))
    }
}
