//! CPU-side icon image buffer.
//!
//! This module provides [`ImageBuffer`], a wrapper around `image::DynamicImage`
//! carrying the resolution the frame was normalized to. It offers the small
//! set of operations the icon pipeline needs: exact resizing, stretched
//! drawing of one image over another, and encoding.
//!
//! # Example
//!
//! ```ignore
//! use horizon_icons_render::{ImageBuffer, ResizeFilter};
//!
//! let icon = ImageBuffer::from_bytes(&png_data)?
//!     .with_resolution(96.0)
//!     .resize(16, 16, ResizeFilter::Lanczos3);
//! ```

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat as ImgFormat, Rgba, RgbaImage};

use crate::error::{RenderError, RenderResult};

/// Resampling filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    /// Nearest neighbor interpolation. Fast but pixelated.
    Nearest,
    /// Bilinear interpolation. Balanced speed and quality.
    #[default]
    Triangle,
    /// Catmull-Rom bicubic interpolation. Good quality.
    CatmullRom,
    /// Gaussian blur interpolation. Smooth results.
    Gaussian,
    /// Lanczos interpolation with window size 3. High quality.
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            ResizeFilter::Nearest => image::imageops::FilterType::Nearest,
            ResizeFilter::Triangle => image::imageops::FilterType::Triangle,
            ResizeFilter::CatmullRom => image::imageops::FilterType::CatmullRom,
            ResizeFilter::Gaussian => image::imageops::FilterType::Gaussian,
            ResizeFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Output format for image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// PNG format (lossless).
    Png,
    /// GIF format.
    Gif,
    /// Windows icon container.
    Ico,
    /// BMP format.
    Bmp,
}

impl OutputFormat {
    fn to_image_format(self) -> ImgFormat {
        match self {
            OutputFormat::Png => ImgFormat::Png,
            OutputFormat::Gif => ImgFormat::Gif,
            OutputFormat::Ico => ImgFormat::Ico,
            OutputFormat::Bmp => ImgFormat::Bmp,
        }
    }
}

/// A CPU-side, independently owned icon image.
///
/// Every geometric operation returns a new `ImageBuffer`; the source is never
/// mutated, so buffers shared through the cache stay stable.
#[derive(Clone)]
pub struct ImageBuffer {
    inner: DynamicImage,
    /// Horizontal/vertical resolution in dots per inch, when known.
    resolution: Option<f32>,
}

impl ImageBuffer {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Create a new transparent image with the specified dimensions.
    #[inline]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: DynamicImage::ImageRgba8(RgbaImage::new(width, height)),
            resolution: None,
        }
    }

    /// Create an image filled with a single RGBA pixel value.
    pub fn from_pixel(width: u32, height: u32, pixel: Rgba<u8>) -> Self {
        Self {
            inner: DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel)),
            resolution: None,
        }
    }

    /// Load an image from bytes in memory, guessing the format.
    pub fn from_bytes(bytes: &[u8]) -> RenderResult<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic_image(img))
    }

    /// Create an image from raw RGBA pixel data.
    ///
    /// The data must be exactly `width * height * 4` bytes, with pixels in
    /// row-major order, 4 bytes per pixel (R, G, B, A).
    pub fn from_rgba(data: &[u8], width: u32, height: u32) -> RenderResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(RenderError::Decode(format!(
                "Invalid data size: expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        let rgba = RgbaImage::from_raw(width, height, data.to_vec()).ok_or_else(|| {
            RenderError::Decode("Failed to create image from raw data".to_string())
        })?;
        Ok(Self::from_dynamic_image(DynamicImage::ImageRgba8(rgba)))
    }

    /// Create from an existing `DynamicImage`.
    #[inline]
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        Self {
            inner: img,
            resolution: None,
        }
    }

    /// Return this image tagged with the given resolution (dots per inch).
    ///
    /// Only metadata changes; pixel data is untouched.
    #[must_use]
    pub fn with_resolution(mut self, dpi: f32) -> Self {
        self.resolution = Some(dpi);
        self
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    /// Get the width of the image in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Get the height of the image in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Get the dimensions as a (width, height) tuple.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// Resolution in dots per inch, if the frame was normalized.
    #[inline]
    pub fn resolution(&self) -> Option<f32> {
        self.resolution
    }

    /// Get a pixel as RGBA, or `None` when out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() {
            Some(self.inner.get_pixel(x, y))
        } else {
            None
        }
    }

    // ========================================================================
    // GEOMETRIC TRANSFORMS
    // ========================================================================

    /// Resize the image to exact dimensions.
    ///
    /// This may change the aspect ratio. The resolution tag is carried over.
    #[must_use]
    pub fn resize(&self, width: u32, height: u32, filter: ResizeFilter) -> Self {
        Self {
            inner: self.inner.resize_exact(width, height, filter.to_image_filter()),
            resolution: self.resolution,
        }
    }

    // ========================================================================
    // COMPOSITION
    // ========================================================================

    /// Draw `other` over this image, stretched to cover the full bounds.
    ///
    /// Source-over alpha compositing is used, so transparent regions of
    /// `other` leave the underlying pixels visible.
    pub fn draw_stretched(&mut self, other: &ImageBuffer, filter: ResizeFilter) {
        let (width, height) = self.dimensions();
        let mut canvas = self.inner.to_rgba8();
        let top = if other.dimensions() == (width, height) {
            other.inner.to_rgba8()
        } else {
            image::imageops::resize(&other.inner, width, height, filter.to_image_filter())
        };
        image::imageops::overlay(&mut canvas, &top, 0, 0);
        self.inner = DynamicImage::ImageRgba8(canvas);
    }

    // ========================================================================
    // RAW ACCESS
    // ========================================================================

    /// The pixels as tightly packed RGBA8 bytes, row-major.
    pub fn as_rgba8_bytes(&self) -> Vec<u8> {
        self.inner.to_rgba8().into_raw()
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Encode the image to bytes in the specified format.
    pub fn encode(&self, format: OutputFormat) -> RenderResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let rgba = DynamicImage::ImageRgba8(self.inner.to_rgba8());
        rgba.write_to(&mut buffer, format.to_image_format())
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    /// Encode the image as PNG.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        self.encode(OutputFormat::Png)
    }
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("dimensions", &format!("{}x{}", self.width(), self.height()))
            .field("color_type", &self.inner.color())
            .field("resolution", &self.resolution)
            .finish()
    }
}
