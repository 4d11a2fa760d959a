//! Rendering primitives used by nearest-fit and composition.

use crate::image_buffer::{ImageBuffer, ResizeFilter};

/// The two pixel operations the icon pipeline relies on.
///
/// Both take [`ImageBuffer`] only, which keeps stream-bound frames out of
/// every resize and draw.
pub trait RasterOps: Send + Sync {
    /// Produce a new image of exactly `width` x `height`.
    fn resize(&self, image: &ImageBuffer, width: u32, height: u32) -> ImageBuffer;

    /// Draw `image` onto `canvas`, stretched to the canvas bounds.
    fn draw_full(&self, canvas: &mut ImageBuffer, image: &ImageBuffer);
}

/// [`RasterOps`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOps {
    filter: ResizeFilter,
}

impl ImageOps {
    /// Create with the given resampling filter.
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    /// The resampling filter in use.
    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }
}

impl RasterOps for ImageOps {
    fn resize(&self, image: &ImageBuffer, width: u32, height: u32) -> ImageBuffer {
        image.resize(width, height, self.filter)
    }

    fn draw_full(&self, canvas: &mut ImageBuffer, image: &ImageBuffer) {
        canvas.draw_stretched(image, self.filter);
    }
}
