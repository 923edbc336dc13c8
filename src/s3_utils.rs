// Helpers for working with public S3-compatible URLs and the generated
// image uploads.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use crate::error::WorkflowError;

pub fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');

    // Allow simple templating: https://host/{bucket}/{key} or https://bucket.host/{key}
    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }

    // If the base already includes the bucket, append only the key.
    if trimmed.contains(bucket) {
        format!("{}/{}", trimmed, key)
    } else {
        format!("{}/{}/{}", trimmed, bucket, key)
    }
}

/// Uploads one generated image and returns its public URL. `MOCK_S3=true`
/// skips the network call so tests can run without object storage.
pub async fn upload_product_image(
    client: &S3Client,
    bucket: &str,
    public_base_url: &str,
    key: &str,
    bytes: Vec<u8>,
) -> Result<String, WorkflowError> {
    if std::env::var("MOCK_S3").unwrap_or_default() != "true" {
        client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("image/jpeg")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| WorkflowError::Storage(e.to_string()))?;
    }

    Ok(build_public_url(public_base_url, bucket, key))
}
