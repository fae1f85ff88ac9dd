use super::BlobStore;
use crate::models::StorageConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, Client as S3Client};

/// Blob store backed by an S3-compatible bucket.
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3BlobStore {
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: String,
        region: String,
        bucket: String,
        base_url: String,
    ) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "colpo-report",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region))
            .endpoint_url(endpoint)
            .load()
            .await;

        // S3-compatible endpoints address buckets by path, not by subdomain.
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Ok(Self::from_client(S3Client::from_conf(config), bucket, base_url))
    }

    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        tracing::info!(
            "Image storage: bucket {} at {}",
            config.bucket,
            config.endpoint
        );
        Self::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.endpoint.clone(),
            config.region.clone(),
            config.bucket.clone(),
            config.public_url.clone(),
        )
        .await
    }

    pub fn from_client(client: S3Client, bucket: String, base_url: String) -> Self {
        Self {
            client,
            bucket,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Result<&'a str> {
        url.strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Storage(format!("URL outside bucket {}: {}", self.bucket, url)))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to upload file: {}", e)))?;

        tracing::info!("Uploaded {} ({} bytes)", key, data.len());
        Ok(self.public_url(key))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let key = self.key_for_url(url)?;

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read file: {}", e)))?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read body: {}", e)))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = self.key_for_url(url)?;

        // S3 reports success for keys that no longer exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to delete file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::Credentials;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PUBLIC_URL: &str = "https://cdn.example.com";
    const OBJECT_PATH: &str = "/colpo/images/p1/1_a.jpg";

    fn store_at(endpoint: Option<&str>, base_url: &str) -> S3BlobStore {
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("ak", "sk", None, None, "test"))
            .force_path_style(true);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        S3BlobStore::from_client(
            S3Client::from_conf(builder.build()),
            "colpo".to_string(),
            base_url.to_string(),
        )
    }

    fn store(base_url: &str) -> S3BlobStore {
        store_at(None, base_url)
    }

    #[tokio::test]
    async fn test_upload_puts_object_and_returns_public_url() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(OBJECT_PATH))
            .and(header("content-type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = store_at(Some(&server.uri()), PUBLIC_URL)
            .upload("images/p1/1_a.jpg", b"jpeg", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example.com/images/p1/1_a.jpg");
    }

    #[tokio::test]
    async fn test_fetch_reads_object_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = store_at(Some(&server.uri()), PUBLIC_URL)
            .fetch("https://cdn.example.com/images/p1/1_a.jpg")
            .await
            .unwrap();

        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_fetch_missing_object_is_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
            ))
            .mount(&server)
            .await;

        let err = store_at(Some(&server.uri()), PUBLIC_URL)
            .fetch("https://cdn.example.com/images/p1/1_a.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_delete_of_absent_object_succeeds() {
        let server = MockServer::start().await;

        // S3 answers 204 whether or not the key existed.
        Mock::given(method("DELETE"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .expect(2)
            .mount(&server)
            .await;

        let store = store_at(Some(&server.uri()), PUBLIC_URL);
        let url = "https://cdn.example.com/images/p1/1_a.jpg";
        store.delete(url).await.unwrap();
        store.delete(url).await.unwrap();
    }

    #[tokio::test]
    async fn test_denied_upload_is_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;

        let err = store_at(Some(&server.uri()), PUBLIC_URL)
            .upload("images/p1/1_a.jpg", b"jpeg", "image/jpeg")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to upload file"));
    }

    #[tokio::test]
    async fn test_foreign_url_never_reaches_bucket() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let err = store_at(Some(&server.uri()), PUBLIC_URL)
            .delete("https://elsewhere.test/images/p1/1_a.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_public_url_and_key_round_trip() {
        let store = store("https://cdn.example.com/");
        let url = store.public_url("images/p1/1_a.jpg");
        assert_eq!(url, "https://cdn.example.com/images/p1/1_a.jpg");
        assert_eq!(store.key_for_url(&url).unwrap(), "images/p1/1_a.jpg");
    }

    #[test]
    fn test_foreign_url_is_rejected() {
        let store = store("https://cdn.example.com");
        assert!(matches!(
            store.key_for_url("https://other.example.com/images/a.jpg"),
            Err(Error::Storage(_))
        ));
        assert!(store.key_for_url("https://cdn.example.com/").is_err());
    }
}
