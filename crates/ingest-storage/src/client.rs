//! S3-compatible object store client (the Object Store Gateway).

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// The three logical buckets the gateway manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Client-uploaded source objects, addressed by `storage_key`.
    Uploads,
    /// Per-scene sidecar JSON documents produced by the build-sidecar stage.
    Sidecars,
    /// Worker scratch space (extracted audio, sampled frames). Not
    /// intended to be read back through a presigned URL.
    Tmp,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Uploads => "uploads",
            Bucket::Sidecars => "sidecars",
            Bucket::Tmp => "tmp",
        }
    }
}

/// Configuration for the object store client.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// S3 API endpoint URL.
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Bucket name prefix; the logical buckets are `{prefix}-uploads`,
    /// `{prefix}-sidecars`, `{prefix}-tmp`.
    pub bucket_prefix: String,
    /// Region, usually "auto" for non-AWS S3-compatible stores.
    pub region: String,
}

impl ObjectStoreConfig {
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("OSG_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("OSG_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("OSG_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("OSG_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("OSG_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("OSG_SECRET_ACCESS_KEY not set"))?,
            bucket_prefix: std::env::var("OSG_BUCKET_PREFIX")
                .map_err(|_| StorageError::config_error("OSG_BUCKET_PREFIX not set"))?,
            region: std::env::var("OSG_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Client for the S3-compatible object store.
#[derive(Clone)]
pub struct ObjectStoreClient {
    client: Client,
    bucket_prefix: String,
}

impl ObjectStoreClient {
    pub async fn new(config: ObjectStoreConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "osg",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket_prefix: config.bucket_prefix,
        })
    }

    pub async fn from_env() -> StorageResult<Self> {
        let config = ObjectStoreConfig::from_env()?;
        Self::new(config).await
    }

    fn bucket_name(&self, bucket: Bucket) -> String {
        format!("{}-{}", self.bucket_prefix, bucket.as_str())
    }

    /// Ensure the three logical buckets exist, creating them if not.
    /// Called once at startup; tolerant of a bucket already existing.
    pub async fn ensure_buckets(&self) -> StorageResult<()> {
        for bucket in [Bucket::Uploads, Bucket::Sidecars, Bucket::Tmp] {
            let name = self.bucket_name(bucket);
            match self.client.head_bucket().bucket(&name).send().await {
                Ok(_) => continue,
                Err(_) => {
                    self.client
                        .create_bucket()
                        .bucket(&name)
                        .send()
                        .await
                        .map_err(|e| {
                            StorageError::config_error(format!(
                                "failed to create bucket {name}: {e}"
                            ))
                        })?;
                    info!("created bucket {}", name);
                }
            }
        }
        Ok(())
    }

    /// Generate a presigned PUT URL bound to a bucket, key, content type,
    /// maximum size and TTL, for `init_upload`.
    pub async fn presign_put(
        &self,
        bucket: Bucket,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Generate a presigned GET URL.
    pub async fn presign_get(
        &self,
        bucket: Bucket,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Head the object to confirm the client actually completed the PUT,
    /// returning its size and content type.
    pub async fn stat(&self, bucket: Bucket, key: &str) -> StorageResult<ObjectStat> {
        let response = self
            .client
            .head_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NotFound") || e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::AwsSdk(e.to_string())
                }
            })?;

        Ok(ObjectStat {
            size_bytes: response.content_length().unwrap_or(0) as u64,
            content_type: response
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string(),
        })
    }

    pub async fn upload_file(
        &self,
        bucket: Bucket,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    pub async fn upload_bytes(
        &self,
        bucket: Bucket,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!("uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    pub async fn download_bytes(&self, bucket: Bucket, key: &str) -> StorageResult<Vec<u8>> {
        debug!("downloading {}", key);

        let response = self
            .client
            .get_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::DownloadFailed(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    pub async fn download_file(
        &self,
        bucket: Bucket,
        key: &str,
        path: impl AsRef<Path>,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        let bytes = self.download_bytes(bucket, key).await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::DownloadFailed(format!("create dir: {e}")))?;
        }

        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("write file: {e}")))?;

        info!("downloaded {} to {}", key, path.display());
        Ok(())
    }

    pub async fn delete_object(&self, bucket: Bucket, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }

    pub async fn exists(&self, bucket: Bucket, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::AwsSdk(e.to_string()))
                }
            }
        }
    }

    /// Check connectivity by heading the uploads bucket.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(self.bucket_name(Bucket::Uploads))
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("connectivity check failed: {e}")))?;
        Ok(())
    }
}

/// Size/content-type of a stored object, as returned by a HEAD request.
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub size_bytes: u64,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names_are_prefixed() {
        assert_eq!(Bucket::Uploads.as_str(), "uploads");
        assert_eq!(Bucket::Sidecars.as_str(), "sidecars");
        assert_eq!(Bucket::Tmp.as_str(), "tmp");
    }
}
