//! Resize service.
//!
//! The service runs one request through a strictly linear pipeline:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐
//! │ check caller │──▶│ validate     │──▶│ fetch     │──▶│ transform │──▶│ store +   │
//! │   (403)      │   │ width/format │   │ (private) │   │ (codec)   │   │ respond   │
//! └──────────────┘   │   (403)      │   └───────────┘   └───────────┘   └───────────┘
//!                    └──────────────┘
//! ```
//!
//! Rejections in the first two stages become 403 responses. Failures after
//! that are returned as [`ResizeError`] without any retry or cleanup; the
//! next identical request simply redoes the work.

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{RequestError, ResizeError, TransformError};
use crate::io::{ObjectStore, PutObject};

use super::caller::{TrustedCaller, TRUSTED_CALLER_TOKEN};
use super::encoder::{ImageTransformer, TransformPlan, TransformedImage, DEFAULT_QUALITY};
use super::params::{derived_key, parse_width, validate_format, Variant, KEEP_SOURCE_WIDTH};
use super::response::ResizeResponse;

/// Default Cache-Control max-age for derived images (one year).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 31_536_000;

// =============================================================================
// Settings
// =============================================================================

/// Process-wide settings for the resize service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeSettings {
    /// Caller header value identifying the edge network
    pub trusted_caller: String,

    /// Base encoding quality (1-100)
    pub quality: u8,

    /// Cache-Control max-age sent with format-aware responses
    pub cache_max_age: u32,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            trusted_caller: TRUSTED_CALLER_TOKEN.to_string(),
            quality: DEFAULT_QUALITY,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }
}

// =============================================================================
// Resize Request
// =============================================================================

/// A request for a derived image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    /// Value of the caller identity header, if present
    pub caller: Option<String>,

    /// Source image key, including its extension
    pub image: String,

    /// Raw width path segment
    pub width: String,

    /// Requested format token; `None` selects the legacy width-only variant
    pub format: Option<String>,
}

impl ResizeRequest {
    /// Create a format-aware request.
    pub fn new(
        caller: Option<String>,
        image: impl Into<String>,
        width: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            caller,
            image: image.into(),
            width: width.into(),
            format: Some(format.into()),
        }
    }

    /// Create a legacy width-only request.
    pub fn legacy(caller: Option<String>, image: impl Into<String>, width: impl Into<String>) -> Self {
        Self {
            caller,
            image: image.into(),
            width: width.into(),
            format: None,
        }
    }

    /// Which URL shape this request came through.
    pub fn variant(&self) -> Variant {
        if self.format.is_some() {
            Variant::FormatAware
        } else {
            Variant::Legacy
        }
    }
}

/// A validated request, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeJob {
    /// Key fetched from the private bucket
    pub fetch_key: String,

    /// Key written in the CDN bucket
    pub derived_key: String,

    /// Codec work to perform
    pub plan: TransformPlan,

    /// Cache-Control header value, if the variant sends one
    pub cache_control: Option<String>,
}

// =============================================================================
// Resize Service
// =============================================================================

/// Service turning resize requests into derived images.
///
/// Holds one store for the private originals and one for the public CDN
/// bucket. The service has no mutable state and is shared across requests.
///
/// # Example
///
/// ```ignore
/// let private = S3ObjectStore::new(client.clone(), "originals");
/// let public = S3ObjectStore::new(client, "cdn");
/// let service = ResizeService::new(private, public, ResizeSettings::default());
///
/// let request = ResizeRequest::new(
///     Some("Amazon CloudFront".to_string()),
///     "photo.jpg",
///     "640",
///     "jpg",
/// );
/// let response = service.handle(request).await?;
/// ```
pub struct ResizeService<S: ObjectStore> {
    private: S,
    public: S,
    caller: TrustedCaller,
    transformer: ImageTransformer,
    quality: u8,
    cache_max_age: u32,
}

impl<S: ObjectStore> ResizeService<S> {
    /// Create a new service over the private and public stores.
    pub fn new(private: S, public: S, settings: ResizeSettings) -> Self {
        Self {
            private,
            public,
            caller: TrustedCaller::new(settings.trusted_caller),
            transformer: ImageTransformer::new(),
            quality: settings.quality,
            cache_max_age: settings.cache_max_age,
        }
    }

    /// Handle one request.
    ///
    /// Returns a 403 response for untrusted callers and invalid parameters, a
    /// 200 response with the image otherwise. Storage and codec failures are
    /// returned as errors.
    pub async fn handle(&self, request: ResizeRequest) -> Result<ResizeResponse, ResizeError> {
        match self.prepare(&request) {
            Ok(job) => self.run(job).await,
            Err(rejection) => {
                warn!(
                    image = %request.image,
                    width = %request.width,
                    format = ?request.format,
                    "Rejected request: {}",
                    rejection
                );
                Ok(ResizeResponse::rejected(&rejection))
            }
        }
    }

    /// Check the caller and validate parameters, without touching storage.
    pub fn prepare(&self, request: &ResizeRequest) -> Result<ResizeJob, RequestError> {
        if !self.caller.is_trusted(request.caller.as_deref()) {
            return Err(RequestError::Forbidden);
        }

        let variant = request.variant();
        let width = parse_width(&request.width, variant)?;

        if request.image.is_empty() {
            return Err(RequestError::MissingImage);
        }

        let target_width = (width != KEEP_SOURCE_WIDTH).then_some(width);

        match &request.format {
            Some(format) => {
                let (resolved, output) = validate_format(&request.image, format)?;
                Ok(ResizeJob {
                    derived_key: derived_key(width, Some(format.as_str()), &request.image),
                    fetch_key: resolved.fetch_key,
                    plan: TransformPlan {
                        width: target_width,
                        orient_on_resize: true,
                        target: (!resolved.keep_source).then_some(output),
                        quality: self.quality,
                    },
                    cache_control: Some(format!("public, max-age={}", self.cache_max_age)),
                })
            }
            None => Ok(ResizeJob {
                fetch_key: request.image.clone(),
                derived_key: derived_key(width, None, &request.image),
                plan: TransformPlan {
                    width: target_width,
                    orient_on_resize: false,
                    target: None,
                    quality: self.quality,
                },
                cache_control: None,
            }),
        }
    }

    /// Fetch, transform, store and respond.
    async fn run(&self, job: ResizeJob) -> Result<ResizeResponse, ResizeError> {
        debug!(
            fetch_key = %job.fetch_key,
            derived_key = %job.derived_key,
            plan = ?job.plan,
            "Running resize job"
        );

        let source = self.private.get_object(&job.fetch_key).await?;
        info!(
            bucket = self.private.bucket(),
            key = %job.fetch_key,
            bytes = source.len(),
            "Fetched image"
        );

        let output = self.transform(source, job.plan).await?;
        info!(
            format = output.format,
            bytes = output.data.len(),
            "Resized image"
        );

        let content_type = output.content_type();
        self.public
            .put_object(PutObject::derived(
                job.derived_key.clone(),
                output.data.clone(),
                content_type.clone(),
                job.fetch_key,
            ))
            .await?;
        info!(
            bucket = self.public.bucket(),
            key = %job.derived_key,
            "Uploaded image"
        );

        Ok(ResizeResponse::image(
            output.data,
            content_type,
            job.cache_control,
        ))
    }

    /// Run the codec on the blocking pool.
    async fn transform(
        &self,
        source: Bytes,
        plan: TransformPlan,
    ) -> Result<TransformedImage, TransformError> {
        let transformer = self.transformer.clone();
        tokio::task::spawn_blocking(move || transformer.transform(&source, &plan))
            .await
            .map_err(|e| TransformError::Task {
                message: e.to_string(),
            })?
    }
}
