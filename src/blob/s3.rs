//! S3-compatible blob store using the AWS SDK.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{validate_key, BlobError, BlobResult, BlobStore};

const PRECONDITION_FAILED: u16 = 412;

pub struct S3BlobStore {
    client: Client,
    bucket: String,
    /// Base URL that locations are built from, without a trailing slash.
    public_url: String,
}

impl std::fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl S3BlobStore {
    /// Builds a client for `bucket`.
    ///
    /// Explicit credentials are used when given, otherwise the default AWS provider
    /// chain. With a custom `endpoint` (MinIO and friends) path-style addressing is used.
    pub async fn new(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        credentials: Option<(&str, &str)>,
        public_url: Option<&str>,
    ) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some((access_key_id, secret_access_key)) = credentials {
            builder = builder.credentials_provider(aws_sdk_s3::config::Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "carlot-config",
            ));
        }
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let public_url = match (public_url, endpoint) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(endpoint)) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            (None, None) => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            public_url,
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> BlobResult<String> {
        validate_key(key)?;
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .if_none_match("*")
            .body(ByteStream::from(data));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        request
            .send()
            .await
            .map_err(|e| match e.raw_response().map(|r| r.status().as_u16()) {
                // Conditional write refused: something already lives under this key.
                Some(PRECONDITION_FAILED) => BlobError::AlreadyExists(key.to_string()),
                _ => BlobError::S3(format!("put {}: {}", key, e)),
            })?;
        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BlobError::S3(format!("delete {}: {}", key, e)))?;
        Ok(())
    }
}
