//! Optional archive of produced PDFs in S3 / MinIO.

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::config::ArchiveConfig;

/// `documents/{user_id}/{yyyy-mm-dd}/{uuid}.pdf`. Characters outside a safe set in the
/// user id are replaced so the id cannot introduce extra path segments.
pub fn document_key(user_id: &str, day: NaiveDate, id: Uuid) -> String {
    let safe_user: String = user_id
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '@' => c,
            _ => '_',
        })
        .collect();
    format!("documents/{safe_user}/{}/{id}.pdf", day.format("%Y-%m-%d"))
}

#[derive(Clone)]
pub struct DocumentArchive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl DocumentArchive {
    /// Constructs a client configured for MinIO (custom endpoint) or AWS.
    pub async fn connect(config: &ArchiveConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "tailor-static",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Uploads one document and returns its object key.
    pub async fn store(&self, user_id: &str, day: NaiveDate, document: Bytes) -> Result<String> {
        let key = document_key(user_id, day, Uuid::new_v4());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(document))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!(user_id, key = %key, "Archived document to s3://{}", self.bucket);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = Uuid::nil();
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            document_key("user-42", day, id),
            "documents/user-42/2024-03-09/00000000-0000-0000-0000-000000000000.pdf"
        );
    }

    #[test]
    fn test_key_sanitizes_user_id() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let key = document_key("../other user", day, Uuid::nil());
        assert!(key.starts_with("documents/.._other_user/2024-03-09/"));
        assert_eq!(key.matches('/').count(), 3);
    }
}
