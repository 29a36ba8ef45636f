//! # CDN Image Resizer
//!
//! An on-demand image transformation endpoint that sits behind a CDN.
//!
//! A request names a source image, a width and a target format. The resizer
//! fetches the original from a private bucket, resizes and re-encodes it,
//! writes the derived image to the public CDN bucket and returns the bytes so
//! the edge can cache the response.
//!
//! ## Features
//!
//! - **Bounded fan-out**: widths and formats come from fixed allow-lists
//! - **Deterministic keys**: derived objects live at `image/{width}/{format}/{image}`
//! - **Format conversion**: JPEG, PNG, WebP and AVIF output, or keep the source encoding
//! - **Perimeter check**: only requests carrying the edge network's caller token are served
//!
//! ## Architecture
//!
//! - [`io`] - Object storage seam and its S3 implementation
//! - [`resize`] - Validation, key layout, transform and the resize service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use cdn_image_resizer::{create_router, create_s3_client, RouterConfig};
//! use cdn_image_resizer::{ResizeService, ResizeSettings, S3ObjectStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let service = ResizeService::new(
//!         S3ObjectStore::new(client.clone(), "originals"),
//!         S3ObjectStore::new(client, "cdn"),
//!         ResizeSettings::default(),
//!     );
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod resize;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use error::{IoError, RequestError, ResizeError, TransformError};
pub use io::{create_s3_client, ObjectStore, PutObject, S3ObjectStore, ORIGINAL_KEY_METADATA};
pub use resize::{
    resolve_format, EncodeProfile, ImageTransformer, OutputFormat, ProxyResponse, ResizeRequest,
    ResizeResponse, ResizeService, ResizeSettings, ResolvedFormat, TransformPlan, Variant,
    KEEP_SOURCE_WIDTH, SOURCE_FORMAT, SUPPORTED_FORMATS, SUPPORTED_WIDTHS, TRUSTED_CALLER_TOKEN,
};
pub use server::{create_router, AppState, ProxyEvent, RouterConfig};
