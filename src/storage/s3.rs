//! S3-compatible object storage (DigitalOcean Spaces).

use super::StorageBackend;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};

pub struct S3Storage {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3Storage {
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: String,
        bucket: String,
        base_url: String,
    ) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "digital-ocean-spaces",
        );

        // Custom config for DigitalOcean Spaces
        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1")) // DigitalOcean Spaces doesn't really use regions
            .endpoint_url(endpoint)
            .load()
            .await;

        let client = S3Client::new(&config);

        Ok(Self {
            client,
            bucket,
            base_url,
        })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn content_type_for(key: &str) -> &'static str {
        match key.rsplit_once('.').map(|(_, ext)| ext) {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(Error::Storage(format!(
                        "Failed to stat {}: {}",
                        key, service_err
                    )))
                }
            }
        }
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    Error::SourceNotFound(key.to_string())
                } else {
                    Error::Storage(format!("Failed to read {}: {}", key, service_err))
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read body of {}: {}", key, e)))?;

        Ok(bytes.to_vec())
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(Self::content_type_for(key))
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| Error::StorageWrite(format!("Failed to upload {}: {}", key, e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_public_url_composition() {
        let storage = S3Storage::new(
            "key".to_string(),
            "secret".to_string(),
            "https://nyc3.digitaloceanspaces.com".to_string(),
            "thumbs".to_string(),
            "https://cdn.example.com".to_string(),
        )
        .await
        .unwrap();

        assert_eq!(
            storage.public_url("photos/catjpg_100x100_85q.jpg"),
            "https://cdn.example.com/photos/catjpg_100x100_85q.jpg"
        );
    }

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(S3Storage::content_type_for("a/b_10x10_85q.jpg"), "image/jpeg");
        assert_eq!(S3Storage::content_type_for("a/b_10x10_85q.webp"), "image/webp");
        assert_eq!(
            S3Storage::content_type_for("a/b_10x10_85q"),
            "application/octet-stream"
        );
    }
}
