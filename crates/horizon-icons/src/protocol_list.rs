//! Image list of protocol disk icons, kept in sync with a registry.

use horizon_icons_render::IconImage;
use indexmap::IndexMap;

use crate::protocol::ProtocolRegistry;
use crate::resolver::IconResolver;

/// Outcome of a [`ProtocolImageList::sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Keys that were resolved and inserted.
    pub added: Vec<String>,
    /// Keys that were dropped because no protocol lists them anymore.
    pub removed: Vec<String>,
    /// Protocols skipped because their disk icon could not be resolved.
    pub failed: Vec<String>,
}

impl SyncReport {
    /// Whether the sync changed the list.
    pub fn is_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Protocol disk icons at a fixed size, keyed by disk resource name.
///
/// Entries survive a sync unchanged as long as some protocol still lists
/// their key.
#[derive(Debug, Clone)]
pub struct ProtocolImageList {
    size: u32,
    entries: IndexMap<String, IconImage>,
}

impl ProtocolImageList {
    /// Create an empty list of `size` pixel icons.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            entries: IndexMap::new(),
        }
    }

    /// Icon size of the entries.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Bring the list in line with the registry.
    ///
    /// New keys are resolved through `resolver` and appended; keys no
    /// protocol lists anymore are removed. A protocol without a disk icon,
    /// or whose icon fails to resolve, is skipped.
    pub fn sync(&mut self, registry: &dyn ProtocolRegistry, resolver: &IconResolver) -> SyncReport {
        let protocols = registry.list_all();
        let mut report = SyncReport::default();

        for protocol in &protocols {
            let Some(key) = protocol.disk.as_deref() else {
                tracing::warn!(protocol = %protocol.identifier, "protocol has no disk icon");
                report.failed.push(protocol.identifier.clone());
                continue;
            };
            if self.entries.contains_key(key) {
                continue;
            }
            match resolver.protocol_disk(protocol, self.size) {
                Ok(image) => {
                    self.entries.insert(key.to_string(), image);
                    report.added.push(key.to_string());
                }
                Err(err) => {
                    tracing::warn!(
                        protocol = %protocol.identifier,
                        "skipping protocol disk icon: {}",
                        err
                    );
                    report.failed.push(protocol.identifier.clone());
                }
            }
        }

        self.entries.retain(|key, _| {
            let present = protocols.iter().any(|p| p.disk.as_deref() == Some(key.as_str()));
            if !present {
                report.removed.push(key.clone());
            }
            present
        });

        tracing::debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            entries = self.entries.len(),
            "synced protocol image list"
        );
        report
    }

    pub fn get(&self, key: &str) -> Option<&IconImage> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IconImage)> {
        self.entries.iter().map(|(key, image)| (key.as_str(), image))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
