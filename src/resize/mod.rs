//! Resize pipeline.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ ResizeRequest
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             ResizeService               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ TrustedCaller│  │ params          │  │
//! │  │ (header)     │  │ (allow-lists,   │  │
//! │  │              │  │  key layout)    │  │
//! │  └──────────────┘  └─────────────────┘  │
//! │  ┌──────────────────────────────────┐   │
//! │  │ ImageTransformer (EncodeProfile) │   │
//! │  └──────────────────────────────────┘   │
//! └──────────┬──────────────────┬───────────┘
//!            │ get              │ put
//!            ▼                  ▼
//!   ┌────────────────┐  ┌────────────────┐
//!   │ private bucket │  │  CDN bucket    │
//!   └────────────────┘  └────────────────┘
//! ```
//!
//! # Components
//!
//! - [`ResizeService`]: runs a request through caller check, validation,
//!   fetch, transform, store and response
//! - [`TrustedCaller`]: constant-time check of the caller header
//! - [`resolve_format`]: maps the requested format onto a fetch key and an
//!   effective encoding
//! - [`ImageTransformer`]: decode, orient, resize and encode
//! - [`ResizeResponse`]: 403 text or 200 image, renderable as a proxy response

mod caller;
mod encoder;
mod params;
mod response;
mod service;

pub use caller::{TrustedCaller, TRUSTED_CALLER_TOKEN};
pub use encoder::{
    format_label, profile_for, DecodedImage, EncodeProfile, ImageTransformer, OutputFormat,
    TransformPlan, TransformedImage, AVIF_SPEED, DEFAULT_QUALITY, ENCODE_PROFILES,
    SUPPORTED_FORMATS,
};
pub use params::{
    derived_key, parse_width, resolve_format, split_extension, validate_format, ResolvedFormat,
    Variant, DERIVED_KEY_PREFIX, KEEP_SOURCE_WIDTH, SOURCE_FORMAT, SUPPORTED_WIDTHS,
};
pub use response::{ProxyResponse, ResizeResponse, ResponseBody};
pub use service::{
    ResizeJob, ResizeRequest, ResizeService, ResizeSettings, DEFAULT_CACHE_MAX_AGE,
};
