use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ArchiveConfig;

/// Keeps a copy of uploaded resumes in S3 / MinIO.
#[derive(Debug, Clone)]
pub struct ResumeArchive {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl ResumeArchive {
    /// Builds an S3 client for MinIO (local) or AWS (production).
    pub async fn connect(config: &ArchiveConfig) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "careernav-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        Self {
            s3: aws_sdk_s3::Client::new(&s3_config),
            bucket: config.s3_bucket.clone(),
        }
    }

    pub async fn store(
        &self,
        user_id: Option<Uuid>,
        extension: &str,
        content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let key = object_key(user_id, extension);
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Archived resume to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    /// Archives the file; failures are logged and dropped.
    pub async fn store_best_effort(
        &self,
        user_id: Option<Uuid>,
        extension: &str,
        content_type: &str,
        data: Bytes,
    ) -> Option<String> {
        self.store(user_id, extension, content_type, data)
            .await
            .map_err(|e| warn!("Resume archive failed: {e}"))
            .ok()
    }
}

/// `resumes/<user|anonymous>/<uuid>.<ext>`
pub fn object_key(user_id: Option<Uuid>, extension: &str) -> String {
    let owner = user_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    format!(
        "resumes/{owner}/{}.{}",
        Uuid::new_v4(),
        extension.trim_start_matches('.').to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_for_user() {
        let user = Uuid::new_v4();
        let key = object_key(Some(user), ".PDF");
        assert!(key.starts_with(&format!("resumes/{user}/")));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn test_object_key_for_anonymous() {
        assert!(object_key(None, "docx").starts_with("resumes/anonymous/"));
    }
}
