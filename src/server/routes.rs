//! Router configuration for the resize endpoint.
//!
//! # Route Structure
//!
//! ```text
//! /health                          - Health check
//! /invoke                          - Proxy-event invocation (POST)
//! /legacy/{width}/{*image}         - Width-only resize
//! /{width}/{format}/{*image}       - Resize and re-encode
//! ```
//!
//! The trusted-caller check happens inside the resize service rather than as
//! middleware, so rejections keep their plain-text 403 bodies on every route.
//!
//! # Example
//!
//! ```ignore
//! use cdn_image_resizer::server::routes::{create_router, RouterConfig};
//!
//! let service = ResizeService::new(private, public, ResizeSettings::default());
//! let router = create_router(service, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use axum::{
    routing::{get, post},
    Router,
};
use http::HeaderName;
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, invoke_handler, legacy_resize_handler, resize_handler, AppState,
};
use crate::io::ObjectStore;
use crate::resize::ResizeService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Header carrying the caller identity
    pub caller_header: HeaderName,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - The caller identity is read from `User-Agent`
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            caller_header: http::header::USER_AGENT,
            enable_tracing: true,
        }
    }

    /// Read the caller identity from a different header.
    pub fn with_caller_header(mut self, header: HeaderName) -> Self {
        self.caller_header = header;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
pub fn create_router<S>(service: ResizeService<S>, config: RouterConfig) -> Router
where
    S: ObjectStore + 'static,
{
    let app_state = AppState::new(service, config.caller_header);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/invoke", post(invoke_handler::<S>))
        .route(
            "/legacy/{width}/{*image}",
            get(legacy_resize_handler::<S>),
        )
        .route("/{width}/{format}/{*image}", get(resize_handler::<S>))
        .with_state(app_state);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
