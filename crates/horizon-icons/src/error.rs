//! Error types for icon resolution.

use std::path::PathBuf;

use horizon_icons_render::RenderError;

/// Result type alias for icon resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving icons.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Decoding, fitting or caching failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The stream source has no resource of this name.
    #[error("Icon resource '{name}' not found")]
    MissingResource { name: String },

    /// The protocol declares no disk (or application) icon.
    #[error("Protocol '{protocol}' has no {role} icon")]
    MissingProtocolIcon { protocol: String, role: &'static str },

    /// Reading the configuration file failed.
    #[error("Failed to read configuration '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Invalid value for '{property}': {message}")]
    InvalidValue { property: String, message: String },
}

impl Error {
    /// Create a missing-resource error.
    pub fn missing_resource(name: impl Into<String>) -> Self {
        Self::MissingResource { name: name.into() }
    }

    /// Create a missing protocol icon error.
    pub fn missing_protocol_icon(protocol: impl Into<String>, role: &'static str) -> Self {
        Self::MissingProtocolIcon {
            protocol: protocol.into(),
            role,
        }
    }

    /// Create a configuration I/O error.
    pub fn config(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Config {
            path: path.into(),
            source,
        }
    }

    /// Create a value error.
    pub fn invalid_value(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Whether the error means "no image could be produced" for the request.
    ///
    /// Decode failures, empty candidate sets, missing resources and missing
    /// protocol icons all fall in this class.
    pub fn is_miss(&self) -> bool {
        match self {
            Self::Render(err) => {
                err.is_decode_error() || matches!(err, RenderError::EmptyCandidateSet { .. })
            }
            Self::MissingResource { .. } | Self::MissingProtocolIcon { .. } => true,
            _ => false,
        }
    }
}
