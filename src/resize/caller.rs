//! Trusted caller check.
//!
//! The endpoint is only reachable through the edge network, which overwrites a
//! caller header with a fixed token. Requests without that exact token are
//! rejected before any parsing or storage work happens. This is a perimeter
//! check, not authentication.

use subtle::ConstantTimeEq;

/// Header value set by the edge network.
pub const TRUSTED_CALLER_TOKEN: &str = "Amazon CloudFront";

/// Verifies the caller header against the trusted token.
#[derive(Debug, Clone)]
pub struct TrustedCaller {
    token: String,
}

impl TrustedCaller {
    /// Create a checker for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Whether `value` is exactly the trusted token.
    pub fn is_trusted(&self, value: Option<&str>) -> bool {
        match value {
            Some(value) => value.as_bytes().ct_eq(self.token.as_bytes()).into(),
            None => false,
        }
    }
}

impl Default for TrustedCaller {
    fn default() -> Self {
        Self::new(TRUSTED_CALLER_TOKEN)
    }
}
