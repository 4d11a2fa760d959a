//! Protocols and the registry that lists them.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A connection protocol with its artwork resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protocol {
    /// Unique identifier, e.g. `"sftp"`.
    pub identifier: String,
    /// Resource name of the disk icon. Also the key of the protocol image list.
    #[serde(default)]
    pub disk: Option<String>,
    /// Resource name of the application icon.
    #[serde(default)]
    pub icon: Option<String>,
}

impl Protocol {
    /// Create a protocol without artwork.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            disk: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn with_disk(mut self, disk: impl Into<String>) -> Self {
        self.disk = Some(disk.into());
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Lists the currently known protocols.
///
/// Change notification is wired by the owner: whenever the registry
/// changes, it calls [`ProtocolImageList::sync`](crate::protocol_list::ProtocolImageList::sync).
pub trait ProtocolRegistry: Send + Sync {
    fn list_all(&self) -> Vec<Protocol>;
}

/// A registry holding a replaceable list of protocols.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    protocols: RwLock<Vec<Protocol>>,
}

impl StaticRegistry {
    pub fn new(protocols: Vec<Protocol>) -> Self {
        Self {
            protocols: RwLock::new(protocols),
        }
    }

    /// Replace the full protocol list.
    pub fn replace(&self, protocols: Vec<Protocol>) {
        *self.protocols.write() = protocols;
    }

    /// Add a protocol, replacing one with the same identifier.
    pub fn register(&self, protocol: Protocol) {
        let mut protocols = self.protocols.write();
        protocols.retain(|p| p.identifier != protocol.identifier);
        protocols.push(protocol);
    }

    /// Remove a protocol by identifier.
    pub fn unregister(&self, identifier: &str) -> bool {
        let mut protocols = self.protocols.write();
        let before = protocols.len();
        protocols.retain(|p| p.identifier != identifier);
        protocols.len() != before
    }
}

impl ProtocolRegistry for StaticRegistry {
    fn list_all(&self) -> Vec<Protocol> {
        self.protocols.read().clone()
    }
}
