//! Request parameter validation and key layout.
//!
//! Everything here is pure: widths and formats are checked against fixed
//! allow-lists, the source key is derived from the requested format, and the
//! derived object key is built from the request alone.

use crate::error::RequestError;

use super::encoder::OutputFormat;

/// Widths a derived image may be produced at.
///
/// Keeping this list small bounds how many derived objects a single source
/// can ever fan out into.
pub const SUPPORTED_WIDTHS: &[u32] = &[1920, 1280, 1200, 1024, 768, 720, 640, 560, 480, 320, 240];

/// Width sentinel meaning "keep the source width".
pub const KEEP_SOURCE_WIDTH: u32 = 0;

/// Format sentinel meaning "keep the source encoding".
pub const SOURCE_FORMAT: &str = "source";

/// Prefix of every derived object key in the CDN bucket.
pub const DERIVED_KEY_PREFIX: &str = "image";

// =============================================================================
// Endpoint Variant
// =============================================================================

/// The two URL shapes the endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// `/{width}/{image}`: resize only, stored at `image/{width}/{image}`.
    Legacy,

    /// `/{width}/{format}/{image}`: resize and re-encode, stored at
    /// `image/{width}/{format}/{image}`.
    FormatAware,
}

impl Variant {
    /// Whether `width` is acceptable for this variant.
    ///
    /// Only the format-aware variant understands the keep-source sentinel.
    pub fn allows_width(self, width: u32) -> bool {
        match self {
            Variant::Legacy => SUPPORTED_WIDTHS.contains(&width),
            Variant::FormatAware => {
                width == KEEP_SOURCE_WIDTH || SUPPORTED_WIDTHS.contains(&width)
            }
        }
    }
}

/// Parse and validate the raw width path segment.
pub fn parse_width(raw: &str, variant: Variant) -> Result<u32, RequestError> {
    let invalid = || RequestError::InvalidWidth {
        given: raw.to_string(),
    };

    let width: u32 = raw.trim().parse().map_err(|_| invalid())?;
    if variant.allows_width(width) {
        Ok(width)
    } else {
        Err(invalid())
    }
}

// =============================================================================
// Format Resolution
// =============================================================================

/// Result of resolving the requested format against the image key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormat {
    /// Key to fetch from the private bucket
    pub fetch_key: String,

    /// Concrete encoding token after resolving `source` (lowercase, may be empty)
    pub effective_format: String,

    /// Whether the requested format was the `source` sentinel
    pub keep_source: bool,
}

/// Split a key into its base and extension.
///
/// Only the final path segment is considered, so dots in directory names are
/// never mistaken for an extension. The extension excludes the dot.
pub fn split_extension(key: &str) -> (&str, Option<&str>) {
    let name_start = key.rfind('/').map(|i| i + 1).unwrap_or(0);
    match key[name_start..].rfind('.') {
        Some(dot) => {
            let dot = name_start + dot;
            (&key[..dot], Some(&key[dot + 1..]))
        }
        None => (key, None),
    }
}

/// Resolve which object to fetch and which encoding to produce.
///
/// With `source`, the original key is fetched and its extension becomes the
/// effective format. Otherwise the private bucket is expected to hold a copy of
/// the image under the requested extension, so the key's extension is swapped
/// (or appended when the key has none).
pub fn resolve_format(key: &str, requested: &str) -> ResolvedFormat {
    let (base, extension) = split_extension(key);

    if requested == SOURCE_FORMAT {
        ResolvedFormat {
            fetch_key: key.to_string(),
            effective_format: extension.unwrap_or_default().to_ascii_lowercase(),
            keep_source: true,
        }
    } else {
        ResolvedFormat {
            fetch_key: format!("{}.{}", base, requested),
            effective_format: requested.to_string(),
            keep_source: false,
        }
    }
}

/// Resolve and validate the format, returning the concrete output format.
pub fn validate_format(
    key: &str,
    requested: &str,
) -> Result<(ResolvedFormat, OutputFormat), RequestError> {
    let resolved = resolve_format(key, requested);
    match OutputFormat::from_token(&resolved.effective_format) {
        Some(format) => Ok((resolved, format)),
        None => Err(RequestError::InvalidFormat {
            given: if resolved.keep_source {
                resolved.effective_format
            } else {
                requested.to_string()
            },
        }),
    }
}

// =============================================================================
// Derived Keys
// =============================================================================

/// Key of a derived object in the CDN bucket.
///
/// The format segment is the token as requested, so `source` requests are
/// stored under a literal `source` segment.
pub fn derived_key(width: u32, format: Option<&str>, image: &str) -> String {
    match format {
        Some(format) => format!("{}/{}/{}/{}", DERIVED_KEY_PREFIX, width, format, image),
        None => format!("{}/{}/{}", DERIVED_KEY_PREFIX, width, image),
    }
}
