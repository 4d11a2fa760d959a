//! Byte sources for icon resources.
//!
//! The resolver never knows where encoded bytes come from; it asks a
//! [`StreamSource`] to open a resource by name. Two sources are provided:
//! [`DirectorySource`] searches directories on disk, [`MemorySource`] serves
//! bytes registered in memory (embedded assets, tests).

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor};
use std::path::PathBuf;
use std::sync::Arc;

use horizon_icons_render::IconStream;
use parking_lot::RwLock;

use crate::config::IconConfig;

/// Opens raw image streams by resource name.
///
/// Implementations return an error of kind [`io::ErrorKind::NotFound`] for
/// unknown names, so the resolver can fall through to the next candidate.
pub trait StreamSource: Send + Sync {
    /// Open the resource called `name`.
    fn open_stream(&self, name: &str) -> io::Result<Box<dyn IconStream>>;
}

impl<S: StreamSource + ?Sized> StreamSource for Arc<S> {
    fn open_stream(&self, name: &str) -> io::Result<Box<dyn IconStream>> {
        (**self).open_stream(name)
    }
}

/// Searches directories for `<name>.<ext>` files.
///
/// Directories are searched in order; for each directory every extension
/// is tried in order, and the first existing file wins.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    /// Search paths, in priority order
    search_paths: Vec<PathBuf>,
    /// Extensions tried for each name
    extensions: Vec<String>,
}

impl DirectorySource {
    /// Create a source over the given directories and extensions.
    pub fn new(search_paths: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            search_paths,
            extensions,
        }
    }

    /// Create a source from the configured search paths and extensions.
    pub fn from_config(config: &IconConfig) -> Self {
        Self::new(config.search_paths.clone(), config.extensions.clone())
    }

    /// Add a search path.
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    /// Get current search paths.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Locate the file backing `name`.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.search_paths.iter().find_map(|dir| {
            self.extensions
                .iter()
                .map(|ext| dir.join(format!("{}.{}", name, ext)))
                .find(|path| path.is_file())
        })
    }
}

impl StreamSource for DirectorySource {
    fn open_stream(&self, name: &str) -> io::Result<Box<dyn IconStream>> {
        let path = self.find(name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("icon resource '{}' not found", name),
            )
        })?;
        tracing::trace!(name, path = %path.display(), "opening icon resource");
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Serves resources from memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    resources: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a resource.
    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.resources.write().insert(name.into(), bytes.into());
    }

    /// Register a resource, builder style.
    #[must_use]
    pub fn with(self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Remove a resource.
    pub fn remove(&self, name: &str) -> bool {
        self.resources.write().remove(name).is_some()
    }

    /// Whether a resource is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.resources.read().contains_key(name)
    }
}

/// Byte view sharing the registered buffer.
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl StreamSource for MemorySource {
    fn open_stream(&self, name: &str) -> io::Result<Box<dyn IconStream>> {
        let bytes = self.resources.read().get(name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("icon resource '{}' not found", name),
            )
        })?;
        Ok(Box::new(Cursor::new(SharedBytes(bytes))))
    }
}
