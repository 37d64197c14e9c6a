use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;

/// Bucket-scoped object store for generated and uploaded files.
#[derive(Clone)]
pub struct ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds an S3 client for MinIO locally or AWS in production.
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "resume-static",
        );

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            config.s3_bucket.clone(),
            config.s3_public_base_url.clone(),
        )
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Uploads `body` under `key` and returns its public URL.
    pub async fn put(
        &self,
        key: &str,
        body: impl Into<Bytes>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.into()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload of {key} failed: {e}")))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(self.public_url(key))
    }
}

/// Key layout: `resumes/<user>/<resume>/<stamp>.<ext>`.
pub fn resume_asset_key(user_id: uuid::Uuid, resume_id: uuid::Uuid, stamp: i64, ext: &str) -> String {
    format!("resumes/{user_id}/{resume_id}/{stamp}.{ext}")
}

pub fn upload_key(user_id: uuid::Uuid, upload_id: uuid::Uuid) -> String {
    format!("uploads/{user_id}/{upload_id}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_trims_trailing_slash() {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let store = ObjectStore::new(
            aws_sdk_s3::Client::from_conf(conf),
            "resumes".into(),
            "http://cdn.local/resumes/".into(),
        );
        assert_eq!(store.public_url("a/b.pdf"), "http://cdn.local/resumes/a/b.pdf");
    }

    #[test]
    fn test_resume_asset_key_layout() {
        let user = uuid::Uuid::nil();
        let key = resume_asset_key(user, user, 17, "pdf");
        assert!(key.starts_with("resumes/00000000-"));
        assert!(key.ends_with("/17.pdf"));
    }
}
