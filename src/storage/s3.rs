use aws_config::Region;
use aws_sdk_s3::{
    config::Credentials,
    primitives::ByteStream,
    types::{BucketCannedAcl, ObjectCannedAcl},
    Client, Config,
};
use bytes::Bytes;

use crate::{config::StorageConfig, error::AppResult};

/// S3-compatible object storage for profile pictures.
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    config: StorageConfig,
}

impl ObjectStorage {
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let creds = Credentials::new(&config.access_key, &config.secret_key, None, None, "userhub");

        let s3_config = Config::builder()
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(creds)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            config: config.clone(),
        })
    }

    pub async fn ensure_bucket(&self) -> AppResult<()> {
        let bucket = &self.config.avatars_bucket;
        let result = self.client.head_bucket().bucket(bucket).send().await;

        if result.is_err() {
            self.client
                .create_bucket()
                .bucket(bucket)
                .acl(BucketCannedAcl::PublicRead)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create bucket: {}", e))?;
            tracing::info!("Created bucket: {}", bucket);
        }

        Ok(())
    }

    pub async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<String> {
        self.client
            .put_object()
            .bucket(&self.config.avatars_bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to upload file: {}", e))?;

        Ok(self.file_url(key))
    }

    pub fn file_url(&self, key: &str) -> String {
        let base = self
            .config
            .public_url
            .as_deref()
            .unwrap_or(&self.config.endpoint);
        format!("{}/{}/{}", base, self.config.avatars_bucket, key)
    }
}
