//! API integration tests for the resize routes.
//!
//! Tests verify:
//! - Resize and re-encode through the format-aware route
//! - Extension swapping when fetching sources
//! - `0` width and `source` format sentinels
//! - Legacy width-only route
//! - Rejections (caller, width, format) never touch storage
//! - Upstream failures map to opaque server errors

use axum::http::StatusCode;
use image::ImageFormat;

use cdn_image_resizer::{RouterConfig, ORIGINAL_KEY_METADATA};

use super::test_utils::{
    avif_image, body_bytes, body_text, build_router, build_router_with, get_as, get_trusted,
    inspect, jpeg_image, png_image, webp_image, MockObjectStore,
};

fn stores() -> (MockObjectStore, MockObjectStore) {
    (MockObjectStore::new("originals"), MockObjectStore::new("cdn"))
}

// =============================================================================
// Format-Aware Route
// =============================================================================

#[tokio::test]
async fn test_resize_jpeg_to_jpeg() {
    let (private, public) = stores();
    let private = private.with_object("photo.jpg", jpeg_image(1000, 500));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/640/jpg/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=31536000"
    );

    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (640, 320, ImageFormat::Jpeg));

    assert_eq!(private.gets(), vec!["photo.jpg".to_string()]);

    let puts = public.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].key, "image/640/jpg/photo.jpg");
    assert_eq!(puts[0].content_type, "image/jpeg");
    assert_eq!(
        puts[0].metadata.get(ORIGINAL_KEY_METADATA).map(String::as_str),
        Some("photo.jpg")
    );
    assert_eq!(puts[0].body, body);
}

#[tokio::test]
async fn test_fetch_key_swaps_extension() {
    let (private, public) = stores();
    let private = private.with_object("photo.png", png_image(800, 400));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/320/png/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (320, 160, ImageFormat::Png));

    assert_eq!(private.gets(), vec!["photo.png".to_string()]);
    let puts = public.puts();
    assert_eq!(puts[0].key, "image/320/png/photo.jpg");
    assert_eq!(puts[0].original_key(), Some("photo.png"));
}

#[tokio::test]
async fn test_avif_request_resizes_avif_source() {
    let (private, public) = stores();
    let private = private
        .with_object("photo.png", png_image(640, 320))
        .with_object("photo.avif", avif_image(640, 320));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/320/avif/photo.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/avif");
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=31536000"
    );
    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (320, 160, ImageFormat::Avif));

    assert_eq!(private.gets(), vec!["photo.avif".to_string()]);
    let puts = public.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].key, "image/320/avif/photo.png");
    assert_eq!(puts[0].content_type, "image/avif");
    assert_eq!(puts[0].original_key(), Some("photo.avif"));
    assert_eq!(puts[0].body, body);
}

#[tokio::test]
async fn test_avif_request_without_avif_source() {
    let (private, public) = stores();
    // Only the PNG exists, so the swapped .avif key is missing
    let private = private.with_object("photo.png", png_image(100, 100));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/320/avif/photo.png").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(private.gets(), vec!["photo.avif".to_string()]);
    assert!(public.puts().is_empty());
}

#[tokio::test]
async fn test_webp_request_resizes_webp_source() {
    let (private, public) = stores();
    let private = private.with_object("photo.webp", webp_image(500, 250));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/240/webp/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/webp");
    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (240, 120, ImageFormat::WebP));

    assert_eq!(private.gets(), vec!["photo.webp".to_string()]);
    let puts = public.puts();
    assert_eq!(puts[0].key, "image/240/webp/photo.jpg");
    assert_eq!(puts[0].original_key(), Some("photo.webp"));
}

#[tokio::test]
async fn test_source_format_resizes_avif_source() {
    let (private, public) = stores();
    let private = private.with_object("photo.avif", avif_image(480, 240));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/240/source/photo.avif").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/avif");
    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (240, 120, ImageFormat::Avif));
    assert_eq!(public.puts()[0].key, "image/240/source/photo.avif");
}

#[tokio::test]
async fn test_nested_image_key() {
    let (private, public) = stores();
    let private = private.with_object("albums/2024/photo.jpeg", jpeg_image(800, 800));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/480/jpeg/albums/2024/photo.jpeg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(private.gets(), vec!["albums/2024/photo.jpeg".to_string()]);
}

// =============================================================================
// Sentinels
// =============================================================================

#[tokio::test]
async fn test_keep_width_and_source_format_passes_through() {
    let (private, public) = stores();
    let source = png_image(123, 45);
    let private = private.with_object("photo.png", source.clone());
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/0/source/photo.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    let body = body_bytes(response).await;
    assert_eq!(body.as_ref(), source.as_slice());

    assert_eq!(private.gets(), vec!["photo.png".to_string()]);
    assert_eq!(public.puts()[0].key, "image/0/source/photo.png");
}

#[tokio::test]
async fn test_keep_width_never_resizes() {
    let (private, public) = stores();
    let private = private.with_object("photo.png", jpeg_image(333, 111));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/0/png/photo.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (333, 111, ImageFormat::Png));
}

#[tokio::test]
async fn test_source_format_keeps_codec_when_resizing() {
    let (private, public) = stores();
    let private = private.with_object("photo.png", png_image(1000, 250));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/240/source/photo.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (240, 60, ImageFormat::Png));
    assert_eq!(public.puts()[0].key, "image/240/source/photo.png");
}

// =============================================================================
// Legacy Route
// =============================================================================

#[tokio::test]
async fn test_legacy_resize() {
    let (private, public) = stores();
    let private = private.with_object("dir/photo.jpg", jpeg_image(1280, 640));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/legacy/640/dir/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
    assert!(response.headers().get("cache-control").is_none());

    let body = body_bytes(response).await;
    assert_eq!(inspect(&body), (640, 320, ImageFormat::Jpeg));

    assert_eq!(private.gets(), vec!["dir/photo.jpg".to_string()]);
    let puts = public.puts();
    assert_eq!(puts[0].key, "image/640/dir/photo.jpg");
    assert_eq!(puts[0].original_key(), Some("dir/photo.jpg"));
}

#[tokio::test]
async fn test_legacy_rejects_keep_width() {
    let (private, public) = stores();
    let private = private.with_object("photo.jpg", jpeg_image(100, 100));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/legacy/0/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(private.gets().is_empty());
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_invalid_width_rejected_without_storage_calls() {
    let (private, public) = stores();
    let private = private.with_object("photo.jpg", jpeg_image(100, 100));
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/999/jpg/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_text(response).await;
    assert!(body.contains("999"), "body should echo the width: {}", body);
    assert!(private.gets().is_empty());
    assert!(public.puts().is_empty());
}

#[tokio::test]
async fn test_non_numeric_width_rejected() {
    let (private, public) = stores();
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/wide/jpg/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("wide"));
}

#[tokio::test]
async fn test_invalid_format_rejected() {
    let (private, public) = stores();
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/640/gif/photo.jpg").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_text(response).await,
        "Not authorized, invalid format, given: gif"
    );

    let router = build_router(&private, &public);
    let response = get_trusted(router, "/640/source/photo.bmp").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("bmp"));

    assert!(private.gets().is_empty());
}

#[tokio::test]
async fn test_untrusted_caller_rejected() {
    let (private, public) = stores();
    let private = private.with_object("photo.jpg", jpeg_image(100, 100));

    for caller in [None, Some("curl/8.4.0"), Some("amazon cloudfront")] {
        let router = build_router(&private, &public);
        let response = get_as(router, "/640/jpg/photo.jpg", caller).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "Forbidden");
    }

    // Invalid parameters are not even looked at
    let router = build_router(&private, &public);
    let response = get_as(router, "/999/gif/photo.jpg", None).await;
    assert_eq!(body_text(response).await, "Forbidden");

    assert!(private.gets().is_empty());
    assert!(public.puts().is_empty());
}

#[tokio::test]
async fn test_custom_caller_header() {
    let (private, public) = stores();
    let private = private.with_object("photo.jpg", jpeg_image(100, 100));
    let config = RouterConfig::new()
        .with_caller_header(axum::http::HeaderName::from_static("x-edge-caller"));

    // The trusted token in User-Agent no longer counts
    let router = build_router_with(&private, &public, config.clone());
    let response = get_trusted(router, "/240/jpg/photo.jpg").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let router = build_router_with(&private, &public, config);
    let request = axum::http::Request::builder()
        .uri("/240/jpg/photo.jpg")
        .header("x-edge-caller", "Amazon CloudFront")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(router, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Idempotence and Upstream Failures
// =============================================================================

#[tokio::test]
async fn test_repeated_request_overwrites_same_key() {
    let (private, public) = stores();
    let private = private.with_object("photo.jpg", jpeg_image(800, 600));

    for _ in 0..2 {
        let router = build_router(&private, &public);
        let response = get_trusted(router, "/320/jpg/photo.jpg").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let puts = public.puts();
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].key, puts[1].key);
    assert_eq!(puts[0].content_type, puts[1].content_type);
    assert!(public.object("image/320/jpg/photo.jpg").is_some());
}

#[tokio::test]
async fn test_missing_source_is_server_error() {
    let (private, public) = stores();
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/640/jpg/missing.jpg").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_text(response).await;
    assert!(!body.contains("missing.jpg"), "no application detail leaks");
    assert!(public.puts().is_empty());
}

#[tokio::test]
async fn test_corrupt_source_is_server_error() {
    let (private, public) = stores();
    let private = private.with_object("photo.jpg", b"not an image at all".to_vec());
    let router = build_router(&private, &public);

    let response = get_trusted(router, "/640/jpg/photo.jpg").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(public.puts().is_empty());
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (private, public) = stores();
    let router = build_router(&private, &public);

    let response = get_as(router, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}
