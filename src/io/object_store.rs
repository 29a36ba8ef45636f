use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Metadata key recording which source object a derived object was built from.
pub const ORIGINAL_KEY_METADATA: &str = "original_key";

/// An object to be written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PutObject {
    /// Destination key within the store's bucket
    pub key: String,

    /// Object contents
    pub body: Bytes,

    /// MIME type stored alongside the object (e.g. `image/jpeg`)
    pub content_type: String,

    /// Custom user metadata
    pub metadata: HashMap<String, String>,
}

impl PutObject {
    /// Create a put request for a derived image, recording its source key.
    pub fn derived(
        key: impl Into<String>,
        body: Bytes,
        content_type: impl Into<String>,
        original_key: impl Into<String>,
    ) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(ORIGINAL_KEY_METADATA.to_string(), original_key.into());

        Self {
            key: key.into(),
            body,
            content_type: content_type.into(),
            metadata,
        }
    }

    /// The source key recorded in the metadata, if any.
    pub fn original_key(&self) -> Option<&str> {
        self.metadata.get(ORIGINAL_KEY_METADATA).map(String::as_str)
    }
}

/// Whole-object access to a single bucket.
///
/// The resize service holds two of these: one for the private originals and
/// one for the public CDN bucket. Implementations must be thread-safe.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full contents of the object at `key`.
    ///
    /// Returns `IoError::NotFound` when the object does not exist.
    async fn get_object(&self, key: &str) -> Result<Bytes, IoError>;

    /// Write an object, overwriting any existing object at the same key.
    async fn put_object(&self, object: PutObject) -> Result<(), IoError>;

    /// Name of the bucket backing this store (for logging).
    fn bucket(&self) -> &str;
}
