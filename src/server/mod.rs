//! HTTP server layer for the CDN image resizer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        GET /{width}/{format}/{image}   POST /invoke             │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (extract, map responses) │  │       (router config)       │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, invoke_handler, legacy_resize_handler, resize_handler, AppState,
    HealthResponse, LegacyPathParams, ProxyEvent, ResizePathParams,
};
pub use routes::{create_router, RouterConfig};
