//! Badge composition.

use crate::image_buffer::ImageBuffer;
use crate::raster::RasterOps;

/// Draws badge overlays onto base artwork.
pub struct Compositor<'a> {
    ops: &'a dyn RasterOps,
}

impl<'a> Compositor<'a> {
    /// Create a compositor over the given primitives.
    pub fn new(ops: &'a dyn RasterOps) -> Self {
        Self { ops }
    }

    /// Produce a new `size` x `size` surface: `base` resized to fill it, with
    /// `overlay` stretched over the full canvas on top.
    ///
    /// Neither input is modified.
    pub fn overlay(&self, base: &ImageBuffer, overlay: &ImageBuffer, size: u32) -> ImageBuffer {
        let mut surface = self.ops.resize(base, size, size);
        self.ops.draw_full(&mut surface, overlay);
        tracing::debug!(
            size,
            base = ?base.dimensions(),
            overlay = ?overlay.dimensions(),
            "composited badge"
        );
        surface
    }
}
