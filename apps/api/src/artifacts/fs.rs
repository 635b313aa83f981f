//! Filesystem-backed artifact store: one directory per job under a
//! configured root. The local-development default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::artifacts::{check_key, ArtifactStore};

pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, job_id: &str, name: &str) -> PathBuf {
        self.root.join(job_id).join(name)
    }

    async fn ensure_job_dir(&self, job_id: &str) -> Result<()> {
        let dir = self.root.join(job_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create artifact dir {}", dir.display()))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn load(&self, job_id: &str, name: &str) -> Result<Option<String>> {
        check_key(job_id, name)?;
        let path = self.path_for(job_id, name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn save(&self, job_id: &str, name: &str, value: &str) -> Result<()> {
        check_key(job_id, name)?;
        self.ensure_job_dir(job_id).await?;
        let path = self.path_for(job_id, name);
        tokio::fs::write(&path, value)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }

    async fn append(&self, job_id: &str, name: &str, line: &str) -> Result<()> {
        check_key(job_id, name)?;
        self.ensure_job_dir(job_id).await?;
        let path = self.path_for(job_id, name);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open {} for append", path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}
