//! Decoded icon frames.
//!
//! A decoded frame is either an independently owned [`ImageBuffer`] or a
//! [`StreamBoundFrame`]: a frame from a format that cannot be safely
//! duplicated, which owns its backing stream for as long as it lives.
//!
//! `StreamBoundFrame` deliberately exposes no `ImageBuffer`, so it can never
//! be handed to a resize, a nearest-fit or a composition. Callers that need
//! another size must decode the stream again into an owned frame.

use std::borrow::Cow;
use std::io::{Read, Seek};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::image_buffer::ImageBuffer;

/// A readable, seekable byte stream supplying encoded image data.
pub trait IconStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> IconStream for T {}

/// A frame whose backing stream must stay open while the frame is alive.
///
/// The stream is released when the frame is dropped, never earlier.
pub struct StreamBoundFrame {
    pixels: RgbaImage,
    stream: Mutex<Option<Box<dyn IconStream>>>,
}

impl StreamBoundFrame {
    /// Bind decoded pixels to the stream they were decoded from.
    pub fn new(pixels: RgbaImage, stream: Box<dyn IconStream>) -> Self {
        Self {
            pixels,
            stream: Mutex::new(Some(stream)),
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Read a single pixel.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Borrow the raw RGBA bytes.
    #[inline]
    pub fn rgba_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Whether the backing stream is still held.
    pub fn holds_stream(&self) -> bool {
        self.stream.lock().is_some()
    }
}

impl Drop for StreamBoundFrame {
    fn drop(&mut self) {
        if self.stream.get_mut().take().is_some() {
            tracing::trace!(
                width = self.width(),
                height = self.height(),
                "releasing stream of stream-bound frame"
            );
        }
    }
}

impl std::fmt::Debug for StreamBoundFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBoundFrame")
            .field("dimensions", &format!("{}x{}", self.width(), self.height()))
            .field("holds_stream", &self.holds_stream())
            .finish()
    }
}

/// A cached or freshly resolved icon image.
///
/// Cloning is cheap: both variants are reference counted, and two clones of
/// the same cache entry compare equal under [`IconImage::ptr_eq`].
#[derive(Debug, Clone)]
pub enum IconImage {
    /// An independent copy, safe to resize, composite and duplicate.
    Owned(Arc<ImageBuffer>),
    /// A non-duplicable frame tied to its backing stream.
    StreamBound(Arc<StreamBoundFrame>),
}

impl IconImage {
    /// Wrap an owned buffer.
    pub fn owned(buffer: ImageBuffer) -> Self {
        IconImage::Owned(Arc::new(buffer))
    }

    /// Wrap a stream-bound frame.
    pub fn stream_bound(frame: StreamBoundFrame) -> Self {
        IconImage::StreamBound(Arc::new(frame))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            IconImage::Owned(buffer) => buffer.width(),
            IconImage::StreamBound(frame) => frame.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            IconImage::Owned(buffer) => buffer.height(),
            IconImage::StreamBound(frame) => frame.height(),
        }
    }

    /// The owned buffer, or `None` for a stream-bound frame.
    pub fn as_owned(&self) -> Option<&Arc<ImageBuffer>> {
        match self {
            IconImage::Owned(buffer) => Some(buffer),
            IconImage::StreamBound(_) => None,
        }
    }

    /// Whether this image is tied to its backing stream.
    pub fn is_stream_bound(&self) -> bool {
        matches!(self, IconImage::StreamBound(_))
    }

    /// RGBA8 pixel data.
    pub fn rgba_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            IconImage::Owned(buffer) => Cow::Owned(buffer.as_rgba8_bytes()),
            IconImage::StreamBound(frame) => Cow::Borrowed(frame.rgba_bytes()),
        }
    }

    /// Whether both handles point at the same underlying image.
    pub fn ptr_eq(&self, other: &IconImage) -> bool {
        match (self, other) {
            (IconImage::Owned(a), IconImage::Owned(b)) => Arc::ptr_eq(a, b),
            (IconImage::StreamBound(a), IconImage::StreamBound(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<ImageBuffer> for IconImage {
    fn from(buffer: ImageBuffer) -> Self {
        IconImage::owned(buffer)
    }
}

impl From<Arc<ImageBuffer>> for IconImage {
    fn from(buffer: Arc<ImageBuffer>) -> Self {
        IconImage::Owned(buffer)
    }
}
