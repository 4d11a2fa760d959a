//! Classifier-scoped icon memoization.
//!
//! Icons are cached by (identity, classifier) family, then by size. The
//! two-level layout answers both "is there *any* size for this role" and
//! "is there *this exact* size" without scanning the whole store.
//!
//! Entries live for the lifetime of the cache: there is no eviction,
//! capacity bound or expiry. The cache does no locking of its own; wrap it
//! (for example in a `parking_lot::RwLock`) to share it between threads.
//!
//! # Example
//!
//! ```ignore
//! use horizon_icons_render::{Classifier, FamilyKey, IconCache, IconIdentity, IconImage, ImageBuffer};
//!
//! let mut cache = IconCache::new();
//! let family = FamilyKey::new(IconIdentity::folder(), Classifier::DEFAULT);
//! cache.put(&family, 32, IconImage::owned(ImageBuffer::new(32, 32)))?;
//!
//! assert!(cache.get(&family, 32).is_some());
//! assert!(cache.get_any(&family).is_some());
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::error::{RenderError, RenderResult};
use crate::frame::IconImage;

/// Opaque, comparable identity of an icon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IconIdentity {
    /// A protocol, identified by its unique identifier.
    Protocol(String),
    /// A named icon: a resource name or a path key such as `path:folder`.
    Name(String),
}

impl IconIdentity {
    /// Identity of a protocol.
    pub fn protocol(identifier: impl Into<String>) -> Self {
        IconIdentity::Protocol(identifier.into())
    }

    /// Identity of a named resource.
    pub fn name(name: impl Into<String>) -> Self {
        IconIdentity::Name(name.into())
    }

    /// The shared identity of all folders.
    pub fn folder() -> Self {
        IconIdentity::Name("path:folder".to_string())
    }

    /// The shared identity of all files with the given extension.
    pub fn extension(extension: &str) -> Self {
        IconIdentity::Name(format!("path:{}", extension))
    }
}

impl fmt::Display for IconIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconIdentity::Protocol(id) => write!(f, "protocol:{}", id),
            IconIdentity::Name(name) => f.write_str(name),
        }
    }
}

/// Role tag partitioning icon families independently of size.
///
/// The empty classifier is the default role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Classifier(Cow<'static, str>);

impl Classifier {
    /// Default role.
    pub const DEFAULT: Classifier = Classifier::from_static("");
    /// Protocol disk icons.
    pub const DISK: Classifier = Classifier::from_static("Disk");
    /// Protocol application icons.
    pub const ICON: Classifier = Classifier::from_static("Icon");
    /// Symbolic links.
    pub const ALIAS: Classifier = Classifier::from_static("alias");
    /// Entries shown decrypted.
    pub const UNLOCKED: Classifier = Classifier::from_static("unlocked");
    /// Folders that cannot be entered.
    pub const PRIVATE_FOLDER: Classifier = Classifier::from_static("privatefolder");
    /// Write-only folders.
    pub const DROP_FOLDER: Classifier = Classifier::from_static("dropfolder");
    /// Read-only folders.
    pub const READONLY_FOLDER: Classifier = Classifier::from_static("readonlyfolder");
    /// Executables without an extension.
    pub const EXECUTABLE: Classifier = Classifier::from_static("executable");

    /// Create a classifier from a static tag.
    pub const fn from_static(tag: &'static str) -> Self {
        Classifier(Cow::Borrowed(tag))
    }

    /// Create a classifier from any tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Classifier(Cow::Owned(tag.into()))
    }

    /// The tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the default (empty) role.
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An icon family: all size variants sharing one identity and classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FamilyKey {
    /// What the icon depicts.
    pub identity: IconIdentity,
    /// The role the icon plays.
    pub classifier: Classifier,
}

impl FamilyKey {
    /// Create a family key.
    pub fn new(identity: IconIdentity, classifier: Classifier) -> Self {
        Self {
            identity,
            classifier,
        }
    }

    /// The exact key for one size of this family.
    pub fn at(&self, size: u32) -> IconKey {
        IconKey {
            family: self.clone(),
            size,
        }
    }
}

impl fmt::Display for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.classifier.is_default() {
            write!(f, "{}", self.identity)
        } else {
            write!(f, "{}[{}]", self.identity, self.classifier)
        }
    }
}

/// Composite cache key: family plus pixel size.
///
/// A size of 0 means "unspecified" and is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconKey {
    /// The family this size variant belongs to.
    pub family: FamilyKey,
    /// Width/height in pixels.
    pub size: u32,
}

impl IconKey {
    /// Create a key.
    pub fn new(identity: IconIdentity, size: u32, classifier: Classifier) -> Self {
        Self {
            family: FamilyKey::new(identity, classifier),
            size,
        }
    }
}

/// Size variants of one family, in insertion order.
#[derive(Debug, Default)]
struct Family {
    variants: IndexMap<u32, IconImage>,
    /// Set by the marker form of put: the size of the family's default.
    default_size: Option<u32>,
}

/// Process-lifetime icon memoization table.
#[derive(Debug, Default)]
pub struct IconCache {
    families: HashMap<FamilyKey, Family>,
    /// Statistics: number of cache hits.
    hits: AtomicU64,
    /// Statistics: number of cache misses.
    misses: AtomicU64,
}

impl IconCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Any one size variant of the family.
    ///
    /// Returns the variant recorded as the family default when there is one,
    /// otherwise the first variant inserted.
    pub fn get_any(&self, family: &FamilyKey) -> Option<IconImage> {
        let found = self.families.get(family).and_then(|f| {
            f.default_size
                .and_then(|size| f.variants.get(&size))
                .or_else(|| f.variants.values().next())
                .cloned()
        });
        self.record(found.is_some());
        found
    }

    /// Exact size lookup.
    pub fn get(&self, family: &FamilyKey, size: u32) -> Option<IconImage> {
        let found = self
            .families
            .get(family)
            .and_then(|f| f.variants.get(&size))
            .cloned();
        self.record(found.is_some());
        found
    }

    /// Whether the exact size is stored. Does not count towards statistics.
    pub fn contains(&self, family: &FamilyKey, size: u32) -> bool {
        self.families
            .get(family)
            .is_some_and(|f| f.variants.contains_key(&size))
    }

    /// Exact lookup by composite key.
    pub fn get_key(&self, key: &IconKey) -> Option<IconImage> {
        self.get(&key.family, key.size)
    }

    /// All known size variants of the family, in insertion order.
    pub fn filter(&self, family: &FamilyKey) -> Vec<IconImage> {
        self.families
            .get(family)
            .map(|f| f.variants.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Sizes cached for the family, in insertion order.
    pub fn sizes(&self, family: &FamilyKey) -> Vec<u32> {
        self.families
            .get(family)
            .map(|f| f.variants.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Insert or overwrite one size variant.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidKey`] when `size` is 0.
    pub fn put(&mut self, family: &FamilyKey, size: u32, image: IconImage) -> RenderResult<()> {
        if size == 0 {
            return Err(RenderError::InvalidKey(format!(
                "size 0 is not storable for {}",
                family
            )));
        }
        self.families
            .entry(family.clone())
            .or_default()
            .variants
            .insert(size, image);
        Ok(())
    }

    /// Record that the family's default has been produced, at `size`.
    ///
    /// Only the first call per family has an effect.
    pub fn mark_default(&mut self, family: &FamilyKey, size: u32) {
        let entry = self.families.entry(family.clone()).or_default();
        if entry.default_size.is_none() {
            entry.default_size = Some(size);
        }
    }

    /// Size recorded as the family default.
    pub fn default_size(&self, family: &FamilyKey) -> Option<u32> {
        self.families.get(family).and_then(|f| f.default_size)
    }

    /// Whether the family has at least one stored variant.
    pub fn contains_family(&self, family: &FamilyKey) -> bool {
        self.families
            .get(family)
            .is_some_and(|f| !f.variants.is_empty())
    }

    /// Total number of stored variants across all families.
    pub fn len(&self) -> usize {
        self.families.values().map(|f| f.variants.len()).sum()
    }

    /// Check if no variant is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    pub fn stats(&self) -> IconCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        IconCacheStats {
            families: self.families.len(),
            variants: self.len(),
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Statistics about icon cache usage.
#[derive(Debug, Clone, Copy)]
pub struct IconCacheStats {
    /// Number of families with at least one entry or default marker.
    pub families: usize,
    /// Number of stored size variants.
    pub variants: usize,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}
