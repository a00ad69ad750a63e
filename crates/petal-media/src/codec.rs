//! Crop-and-encode helper.
//!
//! Decodes a source image fully into memory (upright, per its EXIF
//! orientation), copies one pixel-space rectangle
//! onto a fresh surface of exactly that size and re-encodes it as JPEG at a
//! fixed quality.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageError, ImageReader};
use thiserror::Error;

/// JPEG quality used for every cropped upload (0.95 on a 0–1 scale).
pub const JPEG_QUALITY: u8 = 95;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("crop rectangle {0} is empty")]
    EmptyRect(CropRect),
    #[error("crop rectangle {rect} exceeds image bounds {width}x{height}")]
    OutOfBounds { rect: CropRect, width: u32, height: u32 },
    #[error("failed to encode cropped image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("encoder produced no data")]
    EmptyOutput,
}

/// Region of a source image, in source pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= width && b <= height)
    }
}

impl std::fmt::Display for CropRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A fully decoded source bitmap.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
}

impl SourceImage {
    /// Decode from raw file bytes; the format is guessed from the content.
    ///
    /// The EXIF orientation is applied, so dimensions and crop coordinates
    /// refer to the image as a viewer displays it.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(ImageError::IoError(e)))?
            .into_decoder()
            .map_err(CodecError::Decode)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

        let mut image = DynamicImage::from_decoder(decoder).map_err(CodecError::Decode)?;
        image.apply_orientation(orientation);
        Ok(Self { image })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Compressed output of [`crop_and_encode`].
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

/// Copy `rect` out of `source` and encode it as JPEG at [`JPEG_QUALITY`].
///
/// Empty rectangles and rectangles that reach past the image edge are
/// rejected rather than producing an empty or padded blob.
pub fn crop_and_encode(source: &SourceImage, rect: CropRect) -> Result<EncodedImage, CodecError> {
    if rect.is_empty() {
        return Err(CodecError::EmptyRect(rect));
    }

    let (width, height) = source.dimensions();
    if !rect.fits_within(width, height) {
        return Err(CodecError::OutOfBounds { rect, width, height });
    }

    // JPEG has no alpha channel
    let surface = source
        .image
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .to_rgb8();

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode_image(&surface)
        .map_err(CodecError::Encode)?;

    if buf.is_empty() {
        return Err(CodecError::EmptyOutput);
    }

    Ok(EncodedImage {
        bytes: Bytes::from(buf),
        width: rect.width,
        height: rect.height,
        content_type: JPEG_CONTENT_TYPE,
    })
}
