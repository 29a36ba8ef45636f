//! Configuration management for the CDN image resizer.
//!
//! Configuration is read once at startup from command-line arguments, falling
//! back to environment variables:
//!
//! - `PRIVATE_BUCKET_NAME` - Bucket holding the original images (required)
//! - `CDN_BUCKET_NAME` - Public bucket receiving derived images (required)
//! - `RESIZER_HOST` - Server bind address (default: 0.0.0.0)
//! - `RESIZER_PORT` - Server port (default: 3000)
//! - `RESIZER_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `RESIZER_S3_REGION` - AWS region (default: us-east-1)
//! - `RESIZER_TRUSTED_CALLER` - Expected caller header value (default: Amazon CloudFront)
//! - `RESIZER_CALLER_HEADER` - Header carrying the caller identity (default: user-agent)
//! - `RESIZER_QUALITY` - Base encoding quality (default: 80)
//! - `RESIZER_CACHE_MAX_AGE` - Cache-Control max-age in seconds (default: one year)

use clap::Parser;
use http::HeaderName;

use crate::resize::{ResizeSettings, DEFAULT_CACHE_MAX_AGE, DEFAULT_QUALITY, TRUSTED_CALLER_TOKEN};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default header inspected for the trusted caller token.
pub const DEFAULT_CALLER_HEADER: &str = "user-agent";

// =============================================================================
// CLI Arguments
// =============================================================================

/// CDN Image Resizer - on-demand image resizing behind a CDN.
///
/// Fetches originals from a private bucket, resizes and re-encodes them, and
/// writes the result to the public CDN bucket before returning it.
#[derive(Parser, Debug, Clone)]
#[command(name = "cdn-image-resizer")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RESIZER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RESIZER_PORT")]
    pub port: u16,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// Private bucket holding the original images.
    #[arg(long, env = "PRIVATE_BUCKET_NAME")]
    pub private_bucket: String,

    /// Public bucket fronted by the CDN, receiving derived images.
    #[arg(long, env = "CDN_BUCKET_NAME")]
    pub cdn_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "RESIZER_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "RESIZER_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Caller Check
    // =========================================================================
    /// Header value identifying the edge network.
    #[arg(long, default_value = TRUSTED_CALLER_TOKEN, env = "RESIZER_TRUSTED_CALLER")]
    pub trusted_caller: String,

    /// Name of the header carrying the caller identity.
    #[arg(long, default_value = DEFAULT_CALLER_HEADER, env = "RESIZER_CALLER_HEADER")]
    pub caller_header: String,

    // =========================================================================
    // Output Configuration
    // =========================================================================
    /// Base encoding quality (1-100). Some formats scale it down.
    #[arg(long, default_value_t = DEFAULT_QUALITY, env = "RESIZER_QUALITY")]
    pub quality: u8,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "RESIZER_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.private_bucket.is_empty() {
            return Err(
                "Private bucket name is required. Set --private-bucket or PRIVATE_BUCKET_NAME"
                    .to_string(),
            );
        }
        if self.cdn_bucket.is_empty() {
            return Err(
                "CDN bucket name is required. Set --cdn-bucket or CDN_BUCKET_NAME".to_string(),
            );
        }

        if self.trusted_caller.is_empty() {
            return Err("trusted_caller must not be empty".to_string());
        }

        if HeaderName::from_bytes(self.caller_header.as_bytes()).is_err() {
            return Err(format!(
                "caller_header '{}' is not a valid HTTP header name",
                self.caller_header
            ));
        }

        if self.quality == 0 || self.quality > 100 {
            return Err("quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed caller header name. Call `validate()` first.
    pub fn caller_header_name(&self) -> HeaderName {
        HeaderName::from_bytes(self.caller_header.as_bytes())
            .unwrap_or(http::header::USER_AGENT)
    }

    /// Settings handed to the resize service.
    pub fn resize_settings(&self) -> ResizeSettings {
        ResizeSettings {
            trusted_caller: self.trusted_caller.clone(),
            quality: self.quality,
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
