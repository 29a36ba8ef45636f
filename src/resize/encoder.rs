//! Image transformer.
//!
//! Decodes a source image, optionally normalizes its orientation and resizes
//! it to a target width, then encodes it either into a requested output format
//! or back into the source's own format.
//!
//! Per-format encoder settings live in [`ENCODE_PROFILES`]; adding a format is a
//! table entry plus an arm in [`encode`], not a change to the pipeline.

use std::io::Cursor;

use avif_decode::{Decoder as AvifDecoder, Image as AvifImage};
use bytes::Bytes;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{
    DynamicImage, ImageBuffer, ImageDecoder, ImageFormat, ImageReader, RgbImage, RgbaImage,
};

use crate::error::TransformError;

/// Default base encoding quality (1-100).
pub const DEFAULT_QUALITY: u8 = 80;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
pub const AVIF_SPEED: u8 = 6;

// =============================================================================
// Output Formats
// =============================================================================

/// Encodings a derived image can be produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

/// Accepted format tokens and the encoding each selects.
pub const SUPPORTED_FORMATS: &[(&str, OutputFormat)] = &[
    ("jpg", OutputFormat::Jpeg),
    ("jpeg", OutputFormat::Jpeg),
    ("png", OutputFormat::Png),
    ("webp", OutputFormat::WebP),
    ("avif", OutputFormat::Avif),
];

impl OutputFormat {
    /// Look up a format token (`jpg`, `png`, ...). Tokens are lowercase.
    pub fn from_token(token: &str) -> Option<Self> {
        SUPPORTED_FORMATS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, format)| *format)
    }

    /// The `image` crate format this encoding corresponds to.
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Avif => ImageFormat::Avif,
        }
    }
}

/// Codec name for an `image` crate format (`jpeg`, `png`, `avif`, ...).
pub fn format_label(format: ImageFormat) -> &'static str {
    format
        .to_mime_type()
        .strip_prefix("image/")
        .or_else(|| format.extensions_str().first().copied())
        .unwrap_or("octet-stream")
}

// =============================================================================
// Encode Profiles
// =============================================================================

/// Encoder settings for one output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeProfile {
    /// Format this profile applies to
    pub format: OutputFormat,

    /// Percentage of the base quality handed to the encoder
    pub quality_percent: u8,

    /// Bake orientation metadata into the pixels even when not resizing.
    ///
    /// The AVIF encoder writes no orientation metadata, so an unrotated
    /// image would be served sideways.
    pub auto_orient: bool,
}

impl EncodeProfile {
    /// Encoder quality for the given base quality, floored and kept in 1-100.
    pub fn quality(&self, base: u8) -> u8 {
        let scaled = u16::from(base) * u16::from(self.quality_percent) / 100;
        scaled.clamp(1, 100) as u8
    }
}

/// Encoder settings per output format.
pub const ENCODE_PROFILES: &[EncodeProfile] = &[
    EncodeProfile {
        format: OutputFormat::Jpeg,
        quality_percent: 100,
        auto_orient: false,
    },
    EncodeProfile {
        format: OutputFormat::Png,
        quality_percent: 100,
        auto_orient: false,
    },
    EncodeProfile {
        format: OutputFormat::WebP,
        quality_percent: 100,
        auto_orient: false,
    },
    // AVIF reaches comparable visual quality at a lower setting
    EncodeProfile {
        format: OutputFormat::Avif,
        quality_percent: 70,
        auto_orient: true,
    },
];

const PASSTHROUGH_PROFILE: EncodeProfile = EncodeProfile {
    format: OutputFormat::Jpeg,
    quality_percent: 100,
    auto_orient: false,
};

/// Encoder settings for `format`.
pub fn profile_for(format: OutputFormat) -> EncodeProfile {
    ENCODE_PROFILES
        .iter()
        .find(|profile| profile.format == format)
        .copied()
        .unwrap_or(EncodeProfile {
            format,
            ..PASSTHROUGH_PROFILE
        })
}

// =============================================================================
// Transform Plan
// =============================================================================

/// What to do with one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformPlan {
    /// Target width in pixels; `None` keeps the source dimensions
    pub width: Option<u32>,

    /// Normalize orientation when resizing
    pub orient_on_resize: bool,

    /// Output encoding; `None` keeps the source's own format
    pub target: Option<OutputFormat>,

    /// Base encoding quality (1-100)
    pub quality: u8,
}

impl TransformPlan {
    /// Whether orientation metadata must be applied to the pixels.
    pub fn needs_orientation(&self) -> bool {
        let on_resize = self.orient_on_resize && self.width.is_some();
        let by_profile = self
            .target
            .map(|format| profile_for(format).auto_orient)
            .unwrap_or(false);
        on_resize || by_profile
    }

    /// Whether the source bytes can be returned untouched.
    pub fn is_passthrough(&self) -> bool {
        self.width.is_none() && self.target.is_none()
    }
}

/// Output of a transform.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    /// Encoded image bytes
    pub data: Bytes,

    /// Codec name of the encoded bytes (e.g. `jpeg`)
    pub format: &'static str,
}

impl TransformedImage {
    /// `Content-Type` value for the encoded bytes.
    pub fn content_type(&self) -> String {
        format!("image/{}", self.format)
    }
}

// =============================================================================
// Transformer
// =============================================================================

/// Stateless image transformer. CPU-bound; run it off the async runtime.
#[derive(Debug, Clone, Default)]
pub struct ImageTransformer {}

impl ImageTransformer {
    /// Create a new transformer.
    pub fn new() -> Self {
        Self {}
    }

    /// Run `plan` against the source bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the source format is not recognised, or if
    /// decoding or encoding fails.
    pub fn transform(
        &self,
        source: &[u8],
        plan: &TransformPlan,
    ) -> Result<TransformedImage, TransformError> {
        if plan.is_passthrough() {
            return Ok(TransformedImage {
                data: Bytes::copy_from_slice(source),
                format: format_label(source_format(source)?),
            });
        }

        let DecodedImage {
            mut image,
            format: source_format,
            orientation,
        } = self.decode(source)?;

        if plan.needs_orientation() {
            image.apply_orientation(orientation);
        }

        if let Some(width) = plan.width {
            image = resize_to_width(image, width);
        }

        let (format, quality) = match plan.target {
            Some(target) => (target.image_format(), profile_for(target).quality(plan.quality)),
            None => (source_format, plan.quality),
        };

        let data = encode(&image, format, quality)?;

        Ok(TransformedImage {
            data: Bytes::from(data),
            format: format_label(format),
        })
    }

    /// Decode source bytes in any supported codec.
    ///
    /// AVIF goes through a dedicated decoder; everything else through the
    /// `image` crate, which also reports the EXIF orientation.
    pub fn decode(&self, source: &[u8]) -> Result<DecodedImage, TransformError> {
        let format = source_format(source)?;

        if format == ImageFormat::Avif {
            return Ok(DecodedImage {
                image: decode_avif(source)?,
                format,
                orientation: Orientation::NoTransforms,
            });
        }

        let mut decoder = ImageReader::with_format(Cursor::new(source), format)
            .into_decoder()
            .map_err(decode_error)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;

        Ok(DecodedImage {
            image,
            format,
            orientation,
        })
    }
}

/// A decoded source image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixels as stored, before orientation is applied
    pub image: DynamicImage,

    /// Detected source codec
    pub format: ImageFormat,

    /// Orientation recorded in the source metadata
    pub orientation: Orientation,
}

fn source_format(source: &[u8]) -> Result<ImageFormat, TransformError> {
    image::guess_format(source).map_err(|_| TransformError::UnknownFormat)
}

fn decode_avif(source: &[u8]) -> Result<DynamicImage, TransformError> {
    let image = AvifDecoder::from_avif(source)
        .and_then(|decoder| decoder.to_image())
        .map_err(|e| TransformError::Decode {
            message: e.to_string(),
        })?;

    let (width, height) = (to_u32(image_width(&image))?, to_u32(image_height(&image))?);
    let mismatch = || TransformError::Decode {
        message: "AVIF buffer does not match its dimensions".to_string(),
    };

    let decoded = match image {
        AvifImage::Rgb8(img) => {
            let buf: Vec<u8> = img.buf().iter().flat_map(|px| [px.r, px.g, px.b]).collect();
            RgbImage::from_vec(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        AvifImage::Rgb16(img) => {
            let buf: Vec<u16> = img.buf().iter().flat_map(|px| [px.r, px.g, px.b]).collect();
            ImageBuffer::from_vec(width, height, buf).map(DynamicImage::ImageRgb16)
        }
        AvifImage::Rgba8(img) => {
            let buf: Vec<u8> = img
                .buf()
                .iter()
                .flat_map(|px| [px.r, px.g, px.b, px.a])
                .collect();
            RgbaImage::from_vec(width, height, buf).map(DynamicImage::ImageRgba8)
        }
        AvifImage::Rgba16(img) => {
            let buf: Vec<u16> = img
                .buf()
                .iter()
                .flat_map(|px| [px.r, px.g, px.b, px.a])
                .collect();
            ImageBuffer::from_vec(width, height, buf).map(DynamicImage::ImageRgba16)
        }
        AvifImage::Gray8(img) => {
            let buf: Vec<u8> = img.buf().iter().map(|px| px.0).collect();
            ImageBuffer::from_vec(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        AvifImage::Gray16(img) => {
            let buf: Vec<u16> = img.buf().iter().map(|px| px.0).collect();
            ImageBuffer::from_vec(width, height, buf).map(DynamicImage::ImageLuma16)
        }
    };

    decoded.ok_or_else(mismatch)
}

fn image_width(image: &AvifImage) -> usize {
    match image {
        AvifImage::Rgb8(img) => img.width(),
        AvifImage::Rgb16(img) => img.width(),
        AvifImage::Rgba8(img) => img.width(),
        AvifImage::Rgba16(img) => img.width(),
        AvifImage::Gray8(img) => img.width(),
        AvifImage::Gray16(img) => img.width(),
    }
}

fn image_height(image: &AvifImage) -> usize {
    match image {
        AvifImage::Rgb8(img) => img.height(),
        AvifImage::Rgb16(img) => img.height(),
        AvifImage::Rgba8(img) => img.height(),
        AvifImage::Rgba16(img) => img.height(),
        AvifImage::Gray8(img) => img.height(),
        AvifImage::Gray16(img) => img.height(),
    }
}

fn to_u32(value: usize) -> Result<u32, TransformError> {
    u32::try_from(value).map_err(|_| TransformError::Decode {
        message: format!("AVIF dimension {} out of range", value),
    })
}

/// Resize to `width`, preserving the aspect ratio.
fn resize_to_width(img: DynamicImage, width: u32) -> DynamicImage {
    if img.width() == width || img.width() == 0 {
        return img;
    }

    let height = (u64::from(img.height()) * u64::from(width) + u64::from(img.width()) / 2)
        / u64::from(img.width());
    let height = height.clamp(1, u64::from(u32::MAX)) as u32;

    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encode `img` as `format`. Quality is ignored by lossless encoders.
fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, TransformError> {
    let mut buf = Cursor::new(Vec::new());
    let label = format_label(format);
    let encode_error = |e: image::ImageError| TransformError::Encode {
        format: label,
        message: e.to_string(),
    };

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_error)?;
        }
        ImageFormat::Avif => {
            let encoder = AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality);
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_with_encoder(encoder)
                .map_err(encode_error)?;
        }
        ImageFormat::WebP => {
            // The webp encoder is lossless only
            let encoder = WebPEncoder::new_lossless(&mut buf);
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_with_encoder(encoder)
                .map_err(encode_error)?;
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new(&mut buf);
            img.write_with_encoder(encoder).map_err(encode_error)?;
        }
        other => {
            img.write_to(&mut buf, other).map_err(encode_error)?;
        }
    }

    Ok(buf.into_inner())
}

fn decode_error(e: image::ImageError) -> TransformError {
    TransformError::Decode {
        message: e.to_string(),
    }
}
