//! Per-job artifact store — the only persistence in the system.
//!
//! Artifacts are small structured documents and text files keyed by
//! `(job_id, artifact_name)`. The store is injected into the schema
//! pipeline as a trait object so the merge/validate logic stays pure and
//! unit-testable without a filesystem or network.

pub mod blob;
pub mod fs;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Artifact names used by the schema pipeline.
pub mod names {
    /// The last user-uploaded (or baseline-derived) trusted schema.
    pub const SCHEMA_BASE: &str = "schema_base.json";
    /// The current merged schema — the document every edit builds on.
    pub const CURRENT_SCHEMA: &str = "current_schema.json";
    /// Raw producer output from the most recent adjust call, kept verbatim
    /// (even when unparseable) so failures stay attributable.
    pub const CANDIDATE_SCHEMA: &str = "candidate_schema.json";
    /// Append-only log of edit instructions, one timestamped line each.
    pub const REQUIREMENTS_LOG: &str = "requirements.log";
    /// Derived snapshot: the logged instructions, duplicate-free, in order.
    pub const REQUIREMENTS_MERGED: &str = "requirements_merged.txt";
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Returns the artifact's content, or `None` if it was never written.
    async fn load(&self, job_id: &str, name: &str) -> Result<Option<String>>;

    /// Writes (or overwrites) an artifact.
    async fn save(&self, job_id: &str, name: &str, value: &str) -> Result<()>;

    /// Appends one line to an artifact, creating it if needed.
    async fn append(&self, job_id: &str, name: &str, line: &str) -> Result<()>;
}

/// Rejects job ids and artifact names that could escape the per-job
/// namespace of a path-based backend.
pub(crate) fn check_key(job_id: &str, name: &str) -> Result<()> {
    for part in [job_id, name] {
        if part.is_empty()
            || part.contains('/')
            || part.contains('\\')
            || part.contains("..")
        {
            anyhow::bail!("invalid artifact key: job_id={job_id:?} name={name:?}");
        }
    }
    Ok(())
}
