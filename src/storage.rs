use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of a presigned upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Content types accepted for quote photos, with the extension used for the key.
pub const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
];

#[derive(Debug, Error, PartialEq)]
pub enum StorageError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// MediaStore
///
/// Object storage for user-supplied media. Clients upload straight to the bucket
/// through short-lived presigned URLs; the API never proxies file bytes.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Creates the bucket if it does not exist. Local setups only.
    async fn ensure_bucket_exists(&self);

    /// Returns a PUT URL for `key`, bound to `content_type`, valid for `UPLOAD_URL_TTL`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError>;
}

pub type StorageState = Arc<dyn MediaStore>;

/// extension_for
///
/// The key extension for an accepted image type, or `UnsupportedContentType`.
pub fn extension_for(content_type: &str) -> Result<&'static str, StorageError> {
    let normalized = content_type.trim().to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == normalized)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| StorageError::UnsupportedContentType(content_type.to_string()))
}

/// quote_photo_key
///
/// `quotes/<userId>/<uuid>.<ext>`. The client's filename is never part of the key.
pub fn quote_photo_key(user_id: Uuid, content_type: &str) -> Result<String, StorageError> {
    let ext = extension_for(content_type)?;
    Ok(format!("quotes/{}/{}.{}", user_id, Uuid::new_v4(), ext))
}

/// Strips empty, `.` and `..` segments from an object key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// S3MediaStore
///
/// aws-sdk-s3 client against any S3-compatible endpoint (MinIO locally).
/// Path-style addressing is forced for MinIO compatibility.
#[derive(Clone)]
pub struct S3MediaStore {
    client: s3::Client,
    bucket_name: String,
}

impl S3MediaStore {
    pub fn new(endpoint: &str, region: &str, access_key: &str, secret_key: &str, bucket: &str) -> Self {
        let credentials = s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            // Already-exists lands here too.
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError> {
        extension_for(content_type)?;

        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(key))
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// MockMediaStore
///
/// Deterministic URLs for tests; `should_fail` simulates a backend outage.
#[derive(Clone, Default)]
pub struct MockMediaStore {
    pub should_fail: bool,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn ensure_bucket_exists(&self) {}

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError> {
        extension_for(content_type)?;
        if self.should_fail {
            return Err(StorageError::Backend("mock storage failure".to_string()));
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}
