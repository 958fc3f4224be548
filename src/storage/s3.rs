use super::ObjectStore;
use crate::models::S3Settings;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};

/// Any S3-compatible bucket (AWS, DigitalOcean Spaces, MinIO, R2).
pub struct S3Store {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3Store {
    pub async fn new(settings: &S3Settings) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "resize-packager",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint.clone())
            .load()
            .await;

        Ok(Self {
            client: S3Client::new(&config),
            bucket: settings.bucket.clone(),
            public_base_url: settings.public_base_url.clone(),
        })
    }

    fn get_public_url(&self, key: &str) -> String {
        public_url(&self.public_base_url, key)
    }
}

fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, name: &str, data: &[u8], content_type: &str) -> Result<String> {
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(body)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to upload {}: {}", name, e)))?;

        Ok(self.get_public_url(name))
    }
}

#[cfg(test)]
mod tests {
    use super::public_url;

    #[test]
    fn test_public_url_joins_without_double_slash() {
        assert_eq!(
            public_url("https://cdn.example.com/", "resized_images_1.zip"),
            "https://cdn.example.com/resized_images_1.zip"
        );
        assert_eq!(
            public_url("https://cdn.example.com", "resized_images_1.zip"),
            "https://cdn.example.com/resized_images_1.zip"
        );
    }
}
