//! Icon resolution for Horizon Icons.
//!
//! This crate answers "which picture represents this?" for file-system
//! entries, named resources and connection protocols, featuring:
//!
//! - **Classification**: folders, files by extension, executables, and
//!   badged variants for links, decrypted entries and restricted folders
//! - **Caching**: every decoded, resized or composited image is memoized by
//!   identity, size and classifier
//! - **Nearest fit**: missing sizes are derived from the closest available one
//! - **Protocol lists**: an image list of protocol disk icons kept in sync
//!   with a registry
//!
//! # Example
//!
//! ```ignore
//! use horizon_icons::prelude::*;
//!
//! let config = IconConfig::from_file("icons.toml")?;
//! let resolver = IconResolver::with_config(DirectorySource::from_config(&config), config);
//!
//! let subject = PathSubject::directory().with_permission(Permission::from_symbolic("r-x").unwrap());
//! let icon = resolver.resolve_for_subject(&subject, 32)?;
//! ```

pub mod classify;
pub mod config;
pub mod protocol;
pub mod protocol_list;
pub mod resolver;
pub mod source;
pub mod subject;

mod error;

pub use error::{Error, Result};

pub use horizon_icons_render as render;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::classify::{BaseIcon, Classification, classify};
    pub use crate::config::{FilterName, IconConfig};
    pub use crate::protocol::{Protocol, ProtocolRegistry, StaticRegistry};
    pub use crate::protocol_list::{ProtocolImageList, SyncReport};
    pub use crate::resolver::IconResolver;
    pub use crate::source::{DirectorySource, MemorySource, StreamSource};
    pub use crate::subject::{FileSubject, PathSubject, Permission};

    pub use horizon_icons_render::{
        Classifier, FamilyKey, IconIdentity, IconImage, IconKey, ImageBuffer,
    };
}
