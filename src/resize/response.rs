//! Resize responses and their proxy rendering.
//!
//! A [`ResizeResponse`] is either a plain-text rejection or the transformed
//! image. [`ProxyResponse`] is the JSON shape the edge integration expects:
//! `{ statusCode, body, headers?, isBase64Encoded? }`, with binary bodies
//! base64-encoded.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Body of a resize response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Human-readable explanation
    Text(String),

    /// Encoded image bytes
    Binary(Bytes),
}

/// Outcome of a handled resize request.
#[derive(Debug, Clone)]
pub struct ResizeResponse {
    /// HTTP status code
    pub status: StatusCode,

    /// Response headers (lowercase names are not required)
    pub headers: BTreeMap<String, String>,

    /// Response body
    pub body: ResponseBody,
}

impl ResizeResponse {
    /// 403 response explaining why the request was rejected.
    pub fn rejected(err: &RequestError) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            headers: BTreeMap::new(),
            body: ResponseBody::Text(err.to_string()),
        }
    }

    /// 200 response carrying image bytes.
    ///
    /// `cache_control` is only set by the format-aware variant.
    pub fn image(data: Bytes, content_type: String, cache_control: Option<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), content_type);
        if let Some(cache_control) = cache_control {
            headers.insert("Cache-Control".to_string(), cache_control);
        }

        Self {
            status: StatusCode::OK,
            headers,
            body: ResponseBody::Binary(data),
        }
    }

    /// Render as a proxy response, base64-encoding binary bodies.
    pub fn to_proxy(&self) -> ProxyResponse {
        let (body, is_base64_encoded) = match &self.body {
            ResponseBody::Text(text) => (text.clone(), None),
            ResponseBody::Binary(data) => (BASE64.encode(data), Some(true)),
        };

        ProxyResponse {
            status_code: self.status.as_u16(),
            body,
            headers: if self.headers.is_empty() {
                None
            } else {
                Some(self.headers.clone())
            },
            is_base64_encoded,
        }
    }
}

/// Proxy-integration response document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,

    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
}
