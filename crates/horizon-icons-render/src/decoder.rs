//! Raw stream decoding into icon frames.
//!
//! The decoder detects the encoded format and applies per-format rules:
//!
//! - **Icon containers** (ICO): one frame at its native size.
//! - **GIF**: one frame, not safely duplicable. In [`DecodeMode::Cached`] the
//!   frame keeps the backing stream alive and is returned as a
//!   [`StreamBoundFrame`]; in [`DecodeMode::Detached`] an owned copy is taken
//!   and the stream is released.
//! - **TIFF**: one owned frame per page, skipping pages the caller already
//!   has, each normalized to the reference resolution.
//! - **Any other raster**: one owned frame, normalized to the reference
//!   resolution.

use std::io::{Cursor, Read, Seek, SeekFrom};

use image::codecs::gif::GifDecoder;
use image::{
    AnimationDecoder, DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage,
};
use tiff::ColorType as TiffColor;
use tiff::decoder::{Decoder as TiffDecoder, DecodingResult};

use crate::error::{RenderError, RenderResult};
use crate::frame::{IconImage, IconStream, StreamBoundFrame};
use crate::image_buffer::ImageBuffer;

/// Default resolution raster frames are normalized to.
pub const REFERENCE_DPI: f32 = 96.0;

/// How non-duplicable frames are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Non-duplicable frames stay bound to their stream, for caching as is.
    #[default]
    Cached,
    /// Every frame is an owned copy; the stream is always released.
    Detached,
}

/// Turns raw image streams into icon frames.
#[derive(Debug, Clone, Copy)]
pub struct ImageDecoder {
    reference_dpi: f32,
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new(REFERENCE_DPI)
    }
}

impl ImageDecoder {
    /// Create a decoder normalizing raster frames to `reference_dpi`.
    pub fn new(reference_dpi: f32) -> Self {
        Self { reference_dpi }
    }

    /// The resolution raster frames are normalized to.
    pub fn reference_dpi(&self) -> f32 {
        self.reference_dpi
    }

    /// Decode every frame of `stream`.
    ///
    /// `skip_width` is consulted for each page of a multi-page container
    /// before its pixels are decoded; pages for which it returns `true` are
    /// left out, as is any page whose width an earlier page of the same
    /// stream already produced. Single-frame formats ignore it.
    ///
    /// The stream is dropped on return unless a stream-bound frame took it.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnsupportedFormat`] for unrecognized content,
    /// [`RenderError::Decode`] for corrupt content and [`RenderError::Io`]
    /// when the stream cannot be read.
    pub fn decode<F>(
        &self,
        mut stream: Box<dyn IconStream>,
        mode: DecodeMode,
        mut skip_width: F,
    ) -> RenderResult<Vec<IconImage>>
    where
        F: FnMut(u32) -> bool,
    {
        stream.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;

        let format = image::guess_format(&bytes).map_err(|_| RenderError::UnsupportedFormat)?;
        tracing::debug!(?format, len = bytes.len(), ?mode, "decoding icon stream");

        match format {
            ImageFormat::Ico => {
                let image = image::load_from_memory_with_format(&bytes, ImageFormat::Ico)?;
                Ok(vec![IconImage::owned(ImageBuffer::from_dynamic_image(image))])
            }
            ImageFormat::Gif => {
                let pixels = first_gif_frame(&bytes)?;
                match mode {
                    DecodeMode::Cached => {
                        Ok(vec![IconImage::stream_bound(StreamBoundFrame::new(pixels, stream))])
                    }
                    DecodeMode::Detached => Ok(vec![IconImage::owned(self.normalize(
                        DynamicImage::ImageRgba8(pixels),
                    ))]),
                }
            }
            ImageFormat::Tiff => self.decode_pages(&bytes, &mut skip_width),
            other => {
                let image = image::load_from_memory_with_format(&bytes, other)?;
                Ok(vec![IconImage::owned(self.normalize(image))])
            }
        }
    }

    /// Decode each page of a TIFF container.
    fn decode_pages<F>(&self, bytes: &[u8], skip_width: &mut F) -> RenderResult<Vec<IconImage>>
    where
        F: FnMut(u32) -> bool,
    {
        let mut decoder = TiffDecoder::new(Cursor::new(bytes))?;
        let mut frames = Vec::new();
        let mut seen = Vec::new();
        let mut page = 0usize;

        loop {
            let (width, height) = decoder.dimensions()?;
            if seen.contains(&width) {
                tracing::trace!(page, width, "skipping page with a width already decoded");
            } else if skip_width(width) {
                tracing::trace!(page, width, "skipping cached page");
            } else {
                seen.push(width);
                let color = decoder.colortype()?;
                let data = match decoder.read_image()? {
                    DecodingResult::U8(data) => data,
                    _ => {
                        return Err(RenderError::Decode(format!(
                            "unsupported TIFF sample format on page {}",
                            page
                        )));
                    }
                };
                let image = page_image(color, width, height, data)?;
                frames.push(IconImage::owned(self.normalize(image)));
            }

            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
            page += 1;
        }

        Ok(frames)
    }

    fn normalize(&self, image: DynamicImage) -> ImageBuffer {
        ImageBuffer::from_dynamic_image(image).with_resolution(self.reference_dpi)
    }
}

fn first_gif_frame(bytes: &[u8]) -> RenderResult<RgbaImage> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    let frame = decoder
        .into_frames()
        .next()
        .ok_or_else(|| RenderError::Decode("GIF contains no frames".to_string()))??;
    Ok(frame.into_buffer())
}

fn page_image(color: TiffColor, width: u32, height: u32, data: Vec<u8>) -> RenderResult<DynamicImage> {
    let malformed = || RenderError::Decode(format!("TIFF page data does not match {}x{}", width, height));
    let image = match color {
        TiffColor::RGBA(8) => {
            DynamicImage::ImageRgba8(RgbaImage::from_raw(width, height, data).ok_or_else(malformed)?)
        }
        TiffColor::RGB(8) => {
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, data).ok_or_else(malformed)?)
        }
        TiffColor::GrayA(8) => DynamicImage::ImageLumaA8(
            GrayAlphaImage::from_raw(width, height, data).ok_or_else(malformed)?,
        ),
        TiffColor::Gray(8) => {
            DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, data).ok_or_else(malformed)?)
        }
        other => {
            return Err(RenderError::Decode(format!("unsupported TIFF color type {:?}", other)));
        }
    };
    Ok(image)
}

#[cfg(test)]
mod tests {
    use image::Rgba;
    use tiff::encoder::{TiffEncoder, colortype};

    use super::*;
    use crate::image_buffer::OutputFormat;

    fn stream(bytes: Vec<u8>) -> Box<dyn IconStream> {
        Box::new(Cursor::new(bytes))
    }

    fn encoded(size: u32, format: OutputFormat) -> Vec<u8> {
        ImageBuffer::from_pixel(size, size, Rgba([255, 0, 0, 255]))
            .encode(format)
            .unwrap()
    }

    fn multi_page_tiff(sizes: &[u32]) -> Vec<u8> {
        let pages: Vec<(u32, u8)> = sizes.iter().map(|&size| (size, 200)).collect();
        filled_tiff(&pages)
    }

    /// One RGBA page per `(size, fill)`, every channel set to `fill`.
    fn filled_tiff(pages: &[(u32, u8)]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut out).unwrap();
            for &(size, fill) in pages {
                let data = vec![fill; (size * size * 4) as usize];
                encoder.write_image::<colortype::RGBA8>(size, size, &data).unwrap();
            }
        }
        out.into_inner()
    }

    #[test]
    fn test_decode_png_normalized() {
        let frames = ImageDecoder::default()
            .decode(stream(encoded(24, OutputFormat::Png)), DecodeMode::Cached, |_| false)
            .unwrap();
        assert_eq!(frames.len(), 1);
        let owned = frames[0].as_owned().unwrap();
        assert_eq!(owned.dimensions(), (24, 24));
        assert_eq!(owned.resolution(), Some(96.0));
    }

    #[test]
    fn test_decode_ico_single_native_frame() {
        let frames = ImageDecoder::default()
            .decode(stream(encoded(32, OutputFormat::Ico)), DecodeMode::Cached, |_| false)
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].width(), 32);
        assert!(!frames[0].is_stream_bound());
    }

    #[test]
    fn test_decode_gif_is_stream_bound() {
        let frames = ImageDecoder::default()
            .decode(stream(encoded(16, OutputFormat::Gif)), DecodeMode::Cached, |_| false)
            .unwrap();
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            IconImage::StreamBound(frame) => {
                assert!(frame.holds_stream());
                assert_eq!(frame.width(), 16);
            }
            IconImage::Owned(_) => panic!("GIF frame must be stream-bound"),
        }
    }

    #[test]
    fn test_decode_gif_detached_is_owned() {
        let frames = ImageDecoder::default()
            .decode(stream(encoded(16, OutputFormat::Gif)), DecodeMode::Detached, |_| false)
            .unwrap();
        assert!(frames[0].as_owned().is_some());
    }

    #[test]
    fn test_decode_tiff_pages() {
        let frames = ImageDecoder::new(72.0)
            .decode(stream(multi_page_tiff(&[16, 32, 48])), DecodeMode::Cached, |_| false)
            .unwrap();
        let widths: Vec<u32> = frames.iter().map(|f| f.width()).collect();
        assert_eq!(widths, vec![16, 32, 48]);
        assert!(frames.iter().all(|f| f.as_owned().unwrap().resolution() == Some(72.0)));
    }

    #[test]
    fn test_decode_tiff_skips_known_widths() {
        let mut asked = Vec::new();
        let frames = ImageDecoder::default()
            .decode(stream(multi_page_tiff(&[16, 32, 48])), DecodeMode::Cached, |w| {
                asked.push(w);
                w == 32
            })
            .unwrap();
        let widths: Vec<u32> = frames.iter().map(|f| f.width()).collect();
        assert_eq!(widths, vec![16, 48]);
        assert_eq!(asked, vec![16, 32, 48]);
    }

    #[test]
    fn test_decode_tiff_keeps_first_page_of_a_width() {
        let frames = ImageDecoder::default()
            .decode(
                stream(filled_tiff(&[(16, 10), (16, 250), (32, 90)])),
                DecodeMode::Cached,
                |_| false,
            )
            .unwrap();
        let widths: Vec<u32> = frames.iter().map(|f| f.width()).collect();
        assert_eq!(widths, vec![16, 32]);
        assert_eq!(frames[0].as_owned().unwrap().get_pixel(0, 0), Some(Rgba([10, 10, 10, 10])));
    }

    #[test]
    fn test_decode_garbage() {
        let err = ImageDecoder::default()
            .decode(stream(b"definitely not an image".to_vec()), DecodeMode::Cached, |_| false)
            .unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_decode_truncated_png() {
        let mut bytes = encoded(16, OutputFormat::Png);
        bytes.truncate(bytes.len() / 2);
        let err = ImageDecoder::default()
            .decode(stream(bytes), DecodeMode::Cached, |_| false)
            .unwrap_err();
        assert!(err.is_decode_error());
    }
}
