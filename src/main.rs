//! CDN Image Resizer - on-demand image resizing behind a CDN.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cdn_image_resizer::{
    create_router, create_s3_client, Config, ResizeService, RouterConfig, S3ObjectStore,
    SUPPORTED_FORMATS, SUPPORTED_WIDTHS,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("CDN Image Resizer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Private bucket: {}", config.private_bucket);
    info!("  CDN bucket: {}", config.cdn_bucket);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    info!("  Caller header: {}", config.caller_header);
    info!("  Quality: {}", config.quality);
    info!("  Widths: {:?}", SUPPORTED_WIDTHS);
    info!(
        "  Formats: {}",
        SUPPORTED_FORMATS
            .iter()
            .map(|(token, _)| *token)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let service = ResizeService::new(
        S3ObjectStore::new(s3_client.clone(), config.private_bucket.clone()),
        S3ObjectStore::new(s3_client, config.cdn_bucket.clone()),
        config.resize_settings(),
    );

    let router_config = RouterConfig::new()
        .with_caller_header(config.caller_header_name())
        .with_tracing(!config.no_tracing);
    let router = create_router(service, router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "cdn_image_resizer=debug,tower_http=debug"
    } else {
        "cdn_image_resizer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
