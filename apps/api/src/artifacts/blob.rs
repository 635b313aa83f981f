//! Blob-backed artifact store for S3 / MinIO deployments.
//!
//! Keys follow `jobs/{job_id}/{artifact_name}`. Artifacts are small text
//! documents, so `append` is a read-modify-write; the at-most-one-writer
//! discipline per job is the caller's responsibility.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use crate::artifacts::{check_key, ArtifactStore};

pub struct BlobArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl BlobArtifactStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    fn key_for(job_id: &str, name: &str) -> String {
        format!("jobs/{job_id}/{name}")
    }

    fn content_type(name: &str) -> &'static str {
        if name.ends_with(".json") {
            "application/json"
        } else {
            "text/plain"
        }
    }
}

#[async_trait]
impl ArtifactStore for BlobArtifactStore {
    async fn load(&self, job_id: &str, name: &str) -> Result<Option<String>> {
        check_key(job_id, name)?;
        let key = Self::key_for(job_id, name);
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match response {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| anyhow!("failed to read s3://{}/{key}: {e}", self.bucket))?;
                let text = String::from_utf8(data.into_bytes().to_vec())
                    .map_err(|e| anyhow!("artifact {key} is not valid UTF-8: {e}"))?;
                Ok(Some(text))
            }
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(anyhow!("S3 get failed for {key}: {service}"))
                }
            }
        }
    }

    async fn save(&self, job_id: &str, name: &str, value: &str) -> Result<()> {
        check_key(job_id, name)?;
        let key = Self::key_for(job_id, name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(Bytes::copy_from_slice(value.as_bytes())))
            .content_type(Self::content_type(name))
            .send()
            .await
            .map_err(|e| anyhow!("S3 put failed for {key}: {e}"))?;
        Ok(())
    }

    async fn append(&self, job_id: &str, name: &str, line: &str) -> Result<()> {
        let mut content = self.load(job_id, name).await?.unwrap_or_default();
        content.push_str(line);
        content.push('\n');
        self.save(job_id, name, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            BlobArtifactStore::key_for("job-1", "schema_base.json"),
            "jobs/job-1/schema_base.json"
        );
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(
            BlobArtifactStore::content_type("current_schema.json"),
            "application/json"
        );
        assert_eq!(
            BlobArtifactStore::content_type("requirements.log"),
            "text/plain"
        );
    }
}
