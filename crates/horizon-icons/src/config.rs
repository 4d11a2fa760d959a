//! Resolver configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! reference_dpi = 96.0
//! resize_filter = "lanczos3"
//! protocol_list_size = 16
//! file_resource_pattern = "mime-{ext}"
//! search_paths = ["/usr/share/app/icons"]
//! ```

use std::path::{Path, PathBuf};

use horizon_icons_render::{REFERENCE_DPI, ResizeFilter};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder replaced by the file extension in `file_resource_pattern`.
pub const EXTENSION_PLACEHOLDER: &str = "{ext}";

/// Resampling filter names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterName {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<FilterName> for ResizeFilter {
    fn from(name: FilterName) -> Self {
        match name {
            FilterName::Nearest => ResizeFilter::Nearest,
            FilterName::Triangle => ResizeFilter::Triangle,
            FilterName::CatmullRom => ResizeFilter::CatmullRom,
            FilterName::Gaussian => ResizeFilter::Gaussian,
            FilterName::Lanczos3 => ResizeFilter::Lanczos3,
        }
    }
}

/// Configuration for [`IconResolver`](crate::resolver::IconResolver) and its
/// collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Resolution raster frames are normalized to.
    /// Default: 96.0.
    pub reference_dpi: f32,
    /// Filter used for every resize.
    /// Default: triangle.
    pub resize_filter: FilterName,
    /// Icon size of the protocol image list.
    /// Default: 16.
    pub protocol_list_size: u32,
    /// Resource holding the folder icon.
    pub folder_resource: String,
    /// Resource name of a file icon, `{ext}` replaced by the extension.
    pub file_resource_pattern: String,
    /// Resource used when no extension-specific file icon exists.
    pub generic_file_resource: String,
    /// Resource returned for extensionless executables.
    pub executable_resource: String,
    /// Directories searched by [`DirectorySource`](crate::source::DirectorySource).
    pub search_paths: Vec<PathBuf>,
    /// File extensions tried, in order, for each resource name.
    pub extensions: Vec<String>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            reference_dpi: REFERENCE_DPI,
            resize_filter: FilterName::default(),
            protocol_list_size: 16,
            folder_resource: "folder".to_string(),
            file_resource_pattern: "file-{ext}".to_string(),
            generic_file_resource: "file".to_string(),
            executable_resource: "executable".to_string(),
            search_paths: Vec::new(),
            extensions: ["ico", "png", "tiff", "tif", "gif", "bmp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl IconConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: IconConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::config(path, e))?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded icon configuration");
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.reference_dpi.is_finite() && self.reference_dpi > 0.0) {
            return Err(Error::invalid_value(
                "reference_dpi",
                format!("must be positive, got {}", self.reference_dpi),
            ));
        }
        if self.protocol_list_size == 0 {
            return Err(Error::invalid_value("protocol_list_size", "must be non-zero"));
        }
        if !self.file_resource_pattern.contains(EXTENSION_PLACEHOLDER) {
            return Err(Error::invalid_value(
                "file_resource_pattern",
                format!("must contain '{}'", EXTENSION_PLACEHOLDER),
            ));
        }
        Ok(())
    }

    /// Set the reference resolution.
    #[must_use]
    pub fn with_reference_dpi(mut self, dpi: f32) -> Self {
        self.reference_dpi = dpi;
        self
    }

    /// Set the resize filter.
    #[must_use]
    pub fn with_resize_filter(mut self, filter: FilterName) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Set the protocol image list size.
    #[must_use]
    pub fn with_protocol_list_size(mut self, size: u32) -> Self {
        self.protocol_list_size = size;
        self
    }

    /// Add a directory search path.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
        self
    }

    /// Resource name of the file icon for `extension`.
    pub fn file_resource(&self, extension: &str) -> String {
        self.file_resource_pattern
            .replace(EXTENSION_PLACEHOLDER, &extension.to_ascii_lowercase())
    }
}
