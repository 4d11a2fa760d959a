//! Pixel layer for Horizon Icons.
//!
//! This crate turns raw image streams into icon frames and keeps them in a
//! classifier-scoped memoization table:
//!
//! - [`ImageDecoder`]: format-aware decoding (ICO, GIF, multi-page TIFF,
//!   single-frame rasters), producing [`IconImage`] frames.
//! - [`NearestFitResolver`]: picks the closest candidate size and derives an
//!   exactly sized copy.
//! - [`Compositor`]: draws badge overlays onto base artwork.
//! - [`IconCache`]: maps (identity, size, classifier) to images.
//!
//! Frames from formats that cannot be safely duplicated are returned as
//! [`StreamBoundFrame`]s, which own their backing stream and expose no
//! [`ImageBuffer`], so they can never reach a resize.
//!
//! # Example
//!
//! ```ignore
//! use std::io::Cursor;
//! use horizon_icons_render::{DecodeMode, ImageDecoder, ImageOps, NearestFitResolver};
//!
//! let frames = ImageDecoder::default()
//!     .decode(Box::new(Cursor::new(bytes)), DecodeMode::Cached, |_| false)?;
//! let owned: Vec<_> = frames.iter().filter_map(|f| f.as_owned().cloned()).collect();
//!
//! let ops = ImageOps::default();
//! let icon = NearestFitResolver::new(&ops).resolve(&owned, 16, |_, _| {})?;
//! ```

mod compositor;
mod decoder;
mod error;
mod frame;
mod icon_cache;
mod image_buffer;
mod nearest_fit;
mod raster;

pub use compositor::Compositor;
pub use decoder::{DecodeMode, ImageDecoder, REFERENCE_DPI};
pub use error::{RenderError, RenderResult};
pub use frame::{IconImage, IconStream, StreamBoundFrame};
pub use icon_cache::{Classifier, FamilyKey, IconCache, IconCacheStats, IconIdentity, IconKey};
pub use image_buffer::{ImageBuffer, OutputFormat, ResizeFilter};
pub use nearest_fit::{Fit, NearestFitResolver, select as select_nearest};
pub use raster::{ImageOps, RasterOps};

// Re-export the pixel type used by the public API.
pub use image::Rgba;
