//! Blob storage for uploaded files. S3 (or MinIO) in production.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;

const KEY_PREFIX: &str = "uploaded_resumes";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to store {key}: {message}")]
    Put { key: String, message: String },

    #[error("failed to read {key}: {message}")]
    Get { key: String, message: String },

    #[error("failed to delete {key}: {message}")]
    Delete { key: String, message: String },
}

/// Store and fetch opaque bytes by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Builds a client for MinIO (local) or AWS (production) from the injected config.
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "resume-api-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        // MinIO only serves path-style bucket addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!(bucket = %config.s3_bucket, endpoint = %config.s3_endpoint, "S3 client initialized");
        Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            config.s3_bucket.clone(),
        )
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Put {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        info!("Stored s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Get {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        let data = output.body.collect().await.map_err(|e| StorageError::Get {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// `uploaded_resumes/YYYY/MM/DD/<uuid>-<filename>`, with the filename reduced to
/// characters that are safe in an object key.
pub fn upload_key(now: DateTime<Utc>, id: Uuid, filename: &str) -> String {
    format!(
        "{KEY_PREFIX}/{}/{id}-{}",
        now.format("%Y/%m/%d"),
        sanitize_filename(filename)
    )
}

fn sanitize_filename(filename: &str) -> String {
    // Browsers on Windows may send the full client path.
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryBlobStore {
        pub objects: Mutex<HashMap<String, Bytes>>,
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<(), StorageError> {
            self.objects.lock().unwrap().insert(key.to_string(), body);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::Get {
                    key: key.to_string(),
                    message: "no such key".to_string(),
                })
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upload_key_is_dated_and_sanitized() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        let id = Uuid::nil();
        assert_eq!(
            upload_key(now, id, "My Resume (final).pdf"),
            format!("uploaded_resumes/2024/03/07/{id}-My_Resume__final_.pdf")
        );
    }

    #[test]
    fn test_sanitize_strips_client_paths_and_hidden_prefixes() {
        assert_eq!(sanitize_filename(r"C:\Users\jane\cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd.pdf"), "passwd.pdf");
        assert_eq!(sanitize_filename("..pdf"), "pdf");
        assert_eq!(sanitize_filename(""), "resume.pdf");
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = fakes::MemoryBlobStore::default();
        store
            .put("a/b.pdf", Bytes::from_static(b"%PDF-1.4"), "application/pdf")
            .await
            .unwrap();
        assert_eq!(store.get("a/b.pdf").await.unwrap(), Bytes::from_static(b"%PDF-1.4"));
        assert!(store.get("missing").await.is_err());

        store.delete("a/b.pdf").await.unwrap();
        assert!(store.get("a/b.pdf").await.is_err());
    }
}
