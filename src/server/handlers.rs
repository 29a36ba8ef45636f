//! HTTP request handlers for the resize endpoint.
//!
//! # Endpoints
//!
//! - `GET /{width}/{format}/{image}` - Resize and re-encode an image
//! - `GET /legacy/{width}/{image}` - Resize only (width-only URL shape)
//! - `POST /invoke` - Proxy-event invocation returning a proxy response document
//! - `GET /health` - Health check endpoint

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{IoError, ResizeError, TransformError};
use crate::io::ObjectStore;
use crate::resize::{ResizeRequest, ResizeResponse, ResizeService, ResponseBody};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the resize service.
pub struct AppState<S: ObjectStore> {
    /// The resize service
    pub service: Arc<ResizeService<S>>,

    /// Header carrying the caller identity
    pub caller_header: HeaderName,
}

impl<S: ObjectStore> AppState<S> {
    /// Create a new application state.
    pub fn new(service: ResizeService<S>, caller_header: HeaderName) -> Self {
        Self {
            service: Arc::new(service),
            caller_header,
        }
    }

    fn caller(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.caller_header)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

impl<S: ObjectStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            caller_header: self.caller_header.clone(),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for format-aware requests.
///
/// Extracted from: `/{width}/{format}/{*image}`
#[derive(Debug, Deserialize)]
pub struct ResizePathParams {
    /// Requested width (`0` keeps the source width)
    pub width: String,

    /// Requested format token or `source`
    pub format: String,

    /// Source image key (may contain slashes)
    pub image: String,
}

/// Path parameters for legacy width-only requests.
///
/// Extracted from: `/legacy/{width}/{*image}`
#[derive(Debug, Deserialize)]
pub struct LegacyPathParams {
    /// Requested width
    pub width: String,

    /// Source image key (may contain slashes)
    pub image: String,
}

/// Proxy-integration event, as forwarded by the edge integration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    /// Request headers (names compared case-insensitively)
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Path parameters: `image`, `width` and optionally `format`
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
}

impl ProxyEvent {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters.as_ref()?.get(name).map(String::as_str)
    }

    /// Convert into a resize request. A missing `format` selects the legacy variant.
    pub fn to_request(&self, caller_header: &HeaderName) -> ResizeRequest {
        let caller = self.header(caller_header.as_str()).map(str::to_string);
        let image = self.path_parameter("image").unwrap_or_default();
        let width = self.path_parameter("width").unwrap_or_default();

        match self.path_parameter("format") {
            Some(format) => ResizeRequest::new(caller, image, width, format),
            None => ResizeRequest::legacy(caller, image, width),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Response Mapping
// =============================================================================

impl IntoResponse for ResizeResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            ResponseBody::Text(text) => text.into_response(),
            ResponseBody::Binary(data) => data.into_response(),
        };
        *response.status_mut() = self.status;

        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => debug!(header = %name, "Skipping invalid response header"),
            }
        }

        response
    }
}

/// Upstream failures are reported without application detail.
///
/// Storage failures map to 502, codec failures to 500. Both are logged at
/// ERROR level with the full error.
impl IntoResponse for ResizeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ResizeError::Io(IoError::NotFound(_)) => (StatusCode::BAD_GATEWAY, "not_found"),
            ResizeError::Io(IoError::Connection(_)) => {
                (StatusCode::BAD_GATEWAY, "connection_error")
            }
            ResizeError::Io(IoError::S3(_)) => (StatusCode::BAD_GATEWAY, "storage_error"),
            ResizeError::Transform(TransformError::Task { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "task_error")
            }
            ResizeError::Transform(_) => (StatusCode::INTERNAL_SERVER_ERROR, "transform_error"),
        };

        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            self
        );

        let message = status.canonical_reason().unwrap_or("Internal Server Error");
        (status, message).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle format-aware resize requests.
///
/// # Endpoint
///
/// `GET /{width}/{format}/{image}`
///
/// # Response
///
/// - `200 OK`: image bytes with `Content-Type: image/{format}` and
///   `Cache-Control: public, max-age={cache_max_age}`
/// - `403 Forbidden`: untrusted caller, or width/format not allowed
/// - `502 Bad Gateway` / `500 Internal Server Error`: storage or codec failure
pub async fn resize_handler<S: ObjectStore + 'static>(
    State(state): State<AppState<S>>,
    Path(params): Path<ResizePathParams>,
    headers: HeaderMap,
) -> Result<ResizeResponse, ResizeError> {
    let request = ResizeRequest::new(
        state.caller(&headers),
        params.image,
        params.width,
        params.format,
    );
    state.service.handle(request).await
}

/// Handle legacy width-only resize requests.
///
/// # Endpoint
///
/// `GET /legacy/{width}/{image}`
///
/// Same as [`resize_handler`] but keeps the source encoding, never sends
/// `Cache-Control`, and stores at `image/{width}/{image}`.
pub async fn legacy_resize_handler<S: ObjectStore + 'static>(
    State(state): State<AppState<S>>,
    Path(params): Path<LegacyPathParams>,
    headers: HeaderMap,
) -> Result<ResizeResponse, ResizeError> {
    let request = ResizeRequest::legacy(state.caller(&headers), params.image, params.width);
    state.service.handle(request).await
}

/// Handle proxy-event invocations.
///
/// # Endpoint
///
/// `POST /invoke`
///
/// Accepts `{ headers, pathParameters }` and answers with the proxy response
/// document `{ statusCode, body, headers?, isBase64Encoded? }`. Upstream
/// failures are not turned into a document; they fail the invocation.
pub async fn invoke_handler<S: ObjectStore + 'static>(
    State(state): State<AppState<S>>,
    Json(event): Json<ProxyEvent>,
) -> Result<Response, ResizeError> {
    let request = event.to_request(&state.caller_header);
    let response = state.service.handle(request).await?;
    Ok(Json(response.to_proxy()).into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
