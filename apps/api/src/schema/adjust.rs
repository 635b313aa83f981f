//! The schema edit pipeline: requirements log → producer → removal
//! extraction → base-preserving merge → preservation assert → fail-closed
//! validation → commit.
//!
//! Producer failures (timeout, transport error, unparseable or
//! structurally-invalid output) are recovered locally: the base schema is
//! treated as the candidate, so the edit degrades to a no-op with a warning
//! instead of surfacing an error to the end user. A preservation violation
//! is the one failure that always aborts.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::artifacts::{names, ArtifactStore};
use crate::errors::AppError;
use crate::producer::SchemaProducer;
use crate::schema::merge::{assert_preservation, merge_schemas};
use crate::schema::models::Schema;
use crate::schema::normalize::normalize_schema;
use crate::schema::removal::extract_removals;
use crate::schema::validate::validate_schema;

#[derive(Debug, Serialize)]
pub struct AdjustOutcome {
    pub schema: Schema,
    /// False when the producer failed and the edit degraded to a no-op.
    pub applied: bool,
    pub removed_ids: Vec<String>,
    pub warnings: Vec<String>,
}

/// Applies one free-form edit instruction to a job's current schema.
pub async fn adjust_schema(
    store: &dyn ArtifactStore,
    producer: &dyn SchemaProducer,
    job_id: &str,
    instructions: &str,
    producer_timeout: Duration,
    extra_removal_keywords: &[String],
) -> Result<AdjustOutcome, AppError> {
    let base = load_current_schema(store, job_id).await?;

    let instructions = instructions.trim();
    if !instructions.is_empty() {
        let line = format!("[{}] {}", Utc::now().to_rfc3339(), single_line(instructions));
        store
            .append(job_id, names::REQUIREMENTS_LOG, &line)
            .await
            .map_err(AppError::storage)?;
    }
    let merged_requirements = rebuild_merged_requirements(store, job_id).await?;

    let mut warnings: Vec<String> = Vec::new();
    let candidate = propose_candidate(
        store,
        producer,
        job_id,
        &base,
        &merged_requirements,
        producer_timeout,
        &mut warnings,
    )
    .await?;
    let applied = candidate.is_some();

    // A failed producer degrades to a no-op edit: base as candidate, no
    // removals. The logged instruction still shapes the next attempt.
    let (candidate, removals) = match candidate {
        Some(candidate) => (
            candidate,
            extract_removals(instructions, &base, extra_removal_keywords),
        ),
        None => (base.clone(), HashSet::new()),
    };

    let merged = merge_schemas(&base, &candidate, &removals);
    assert_preservation(&base, &merged, &removals)
        .map_err(|e| AppError::Preservation(e.to_string()))?;

    // Fail-closed: a merged schema with blocking errors is never committed;
    // the previously accepted schema stays in effect.
    let merged_doc = serde_json::to_value(&merged)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("merged schema serialization: {e}")))?;
    let report = validate_schema(&merged_doc);
    if !report.ok {
        return Err(AppError::SchemaRejected(
            report.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    warnings.extend(report.warnings.into_iter().map(|w| w.message));

    let serialized = serde_json::to_string_pretty(&merged_doc)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("merged schema serialization: {e}")))?;
    store
        .save(job_id, names::CURRENT_SCHEMA, &serialized)
        .await
        .map_err(AppError::storage)?;

    let mut removed_ids: Vec<String> = removals.into_iter().collect();
    removed_ids.sort();

    info!(
        "adjusted schema for job {job_id}: applied={applied} removed={} sections={} groups={}",
        removed_ids.len(),
        merged.sections.len(),
        merged.groups.len()
    );

    Ok(AdjustOutcome {
        schema: merged,
        applied,
        removed_ids,
        warnings,
    })
}

/// Loads the job's current schema (falling back to the uploaded base) as a
/// normalized document.
pub async fn load_current_schema(
    store: &dyn ArtifactStore,
    job_id: &str,
) -> Result<Schema, AppError> {
    let raw = match store
        .load(job_id, names::CURRENT_SCHEMA)
        .await
        .map_err(AppError::storage)?
    {
        Some(raw) => raw,
        None => store
            .load(job_id, names::SCHEMA_BASE)
            .await
            .map_err(AppError::storage)?
            .ok_or_else(|| AppError::NotFound(format!("no schema exists for job {job_id}")))?,
    };

    let doc: Value = serde_json::from_str(&raw)
        .map_err(|e| AppError::Storage(format!("stored schema for job {job_id} is corrupt: {e}")))?;
    Ok(normalize_schema(&doc))
}

/// Calls the producer and returns the normalized candidate, or `None` when
/// anything about the call or its output is unusable. The raw output is
/// persisted verbatim whenever the call itself succeeded.
async fn propose_candidate(
    store: &dyn ArtifactStore,
    producer: &dyn SchemaProducer,
    job_id: &str,
    base: &Schema,
    instructions: &str,
    producer_timeout: Duration,
    warnings: &mut Vec<String>,
) -> Result<Option<Schema>, AppError> {
    let raw = match tokio::time::timeout(producer_timeout, producer.propose(base, instructions))
        .await
    {
        Err(_) => {
            warn!("producer timed out after {producer_timeout:?} for job {job_id}");
            warnings.push("producer timed out; schema left unchanged".to_string());
            return Ok(None);
        }
        Ok(Err(e)) => {
            warn!("producer failed for job {job_id}: {e}");
            warnings.push(format!("producer failed: {e}; schema left unchanged"));
            return Ok(None);
        }
        Ok(Ok(raw)) => raw,
    };

    store
        .save(job_id, names::CANDIDATE_SCHEMA, &raw)
        .await
        .map_err(AppError::storage)?;

    let doc: Value = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("producer output for job {job_id} is not valid JSON: {e}");
            warnings.push(format!(
                "producer output was not parseable; schema left unchanged ({e})"
            ));
            return Ok(None);
        }
    };

    let report = validate_schema(&doc);
    if !report.ok {
        warn!(
            "producer output for job {job_id} failed validation: {:?}",
            report.errors
        );
        warnings.push(format!(
            "producer output failed validation with {} error(s); schema left unchanged",
            report.errors.len()
        ));
        return Ok(None);
    }
    warnings.extend(report.warnings.into_iter().map(|w| w.message));

    Ok(Some(normalize_schema(&doc)))
}

/// Rebuilds the merged-requirements snapshot from the append-only log:
/// timestamps stripped, exact duplicate lines dropped, first-seen order
/// preserved.
pub async fn rebuild_merged_requirements(
    store: &dyn ArtifactStore,
    job_id: &str,
) -> Result<String, AppError> {
    let log = store
        .load(job_id, names::REQUIREMENTS_LOG)
        .await
        .map_err(AppError::storage)?
        .unwrap_or_default();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in log.lines() {
        let text = strip_timestamp(line).trim();
        if text.is_empty() {
            continue;
        }
        if seen.insert(text) {
            lines.push(text);
        }
    }

    let merged = lines.join("\n");
    store
        .save(job_id, names::REQUIREMENTS_MERGED, &merged)
        .await
        .map_err(AppError::storage)?;
    Ok(merged)
}

/// Drops the `[rfc3339-timestamp] ` prefix a log line carries.
fn strip_timestamp(line: &str) -> &str {
    if line.starts_with('[') {
        if let Some(end) = line.find("] ") {
            return &line[end + 2..];
        }
    }
    line
}

/// Instructions are logged one per line; embedded newlines would corrupt
/// the append-only format.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::artifacts::memory::MemoryArtifactStore;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct ScriptedProducer(String);

    #[async_trait]
    impl SchemaProducer for ScriptedProducer {
        async fn propose(&self, _base: &Schema, _instructions: &str) -> Result<String, AppError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProducer;

    #[async_trait]
    impl SchemaProducer for FailingProducer {
        async fn propose(&self, _base: &Schema, _instructions: &str) -> Result<String, AppError> {
            Err(AppError::Producer("connection reset".to_string()))
        }
    }

    struct SlowProducer;

    #[async_trait]
    impl SchemaProducer for SlowProducer {
        async fn propose(&self, _base: &Schema, _instructions: &str) -> Result<String, AppError> {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok("{}".to_string())
        }
    }

    fn base_json() -> String {
        json!({
            "version": "1",
            "groups": [{"id": "exp", "title": "Experience"}],
            "sections": [
                {"id": "summary", "title": "Summary"},
                {"id": "exp", "title": "Experience", "isGroup": true},
                {"id": "exp1", "title": "Job A", "parentId": "exp"}
            ]
        })
        .to_string()
    }

    async fn seeded_store() -> MemoryArtifactStore {
        let store = MemoryArtifactStore::new();
        store
            .save("job-1", names::SCHEMA_BASE, &base_json())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_adjust_applies_candidate_and_honors_removal() {
        let store = seeded_store().await;
        let candidate = json!({
            "version": "1",
            "groups": [{"id": "exp", "title": "Experience"}],
            "sections": [
                {"id": "exp", "title": "Experience", "isGroup": true},
                {"id": "exp1", "title": "Job A", "parentId": "exp"},
                {"id": "exp2", "title": "Job B", "parentId": "exp"}
            ]
        });
        let producer = ScriptedProducer(candidate.to_string());

        let outcome = adjust_schema(&store, &producer, "job-1", "remove summary", TIMEOUT, &[])
            .await
            .unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.removed_ids, vec!["summary"]);
        let ids: Vec<&str> = outcome
            .schema
            .sections
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["exp", "exp1", "exp2"]);

        // Committed state matches the response.
        let persisted = store
            .load("job-1", names::CURRENT_SCHEMA)
            .await
            .unwrap()
            .unwrap();
        assert!(persisted.contains("exp2"));
        assert!(!persisted.contains("summary"));
    }

    #[tokio::test]
    async fn test_producer_failure_degrades_to_noop() {
        let store = seeded_store().await;

        let outcome = adjust_schema(
            &store,
            &FailingProducer,
            "job-1",
            "remove summary",
            TIMEOUT,
            &[],
        )
        .await
        .unwrap();

        assert!(!outcome.applied);
        assert!(outcome.removed_ids.is_empty());
        assert!(outcome.warnings.iter().any(|w| w.contains("producer failed")));
        // The base survives untouched, summary included.
        assert!(outcome.schema.sections.iter().any(|s| s.id == "summary"));
    }

    #[tokio::test]
    async fn test_unparseable_producer_output_degrades_to_noop() {
        let store = seeded_store().await;
        let producer = ScriptedProducer("Sure! Here is the schema you asked for.".to_string());

        let outcome = adjust_schema(&store, &producer, "job-1", "tighten it up", TIMEOUT, &[])
            .await
            .unwrap();

        assert!(!outcome.applied);
        assert_eq!(outcome.schema.sections.len(), 3);
        // The raw output is still persisted for attribution.
        let raw = store
            .load("job-1", names::CANDIDATE_SCHEMA)
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains("Sure!"));
    }

    #[tokio::test]
    async fn test_structurally_invalid_candidate_degrades_to_noop() {
        let store = seeded_store().await;
        // Duplicate section ids — a blocking validation error.
        let candidate = json!({
            "groups": [],
            "sections": [
                {"id": "summary", "title": "One"},
                {"id": "summary", "title": "Two"}
            ]
        });
        let producer = ScriptedProducer(candidate.to_string());

        let outcome = adjust_schema(&store, &producer, "job-1", "dedupe this", TIMEOUT, &[])
            .await
            .unwrap();

        assert!(!outcome.applied);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("failed validation")));
        assert_eq!(outcome.schema.sections.len(), 3);
    }

    #[tokio::test]
    async fn test_producer_timeout_degrades_to_noop() {
        let store = seeded_store().await;

        let outcome = adjust_schema(
            &store,
            &SlowProducer,
            "job-1",
            "anything",
            Duration::from_millis(50),
            &[],
        )
        .await
        .unwrap();

        assert!(!outcome.applied);
        assert!(outcome.warnings.iter().any(|w| w.contains("timed out")));
    }

    #[tokio::test]
    async fn test_missing_schema_is_not_found() {
        let store = MemoryArtifactStore::new();
        let producer = ScriptedProducer("{}".to_string());

        let err = adjust_schema(&store, &producer, "job-9", "whatever", TIMEOUT, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_requirements_log_and_merged_snapshot() {
        let store = seeded_store().await;
        let producer = ScriptedProducer(base_json());

        adjust_schema(&store, &producer, "job-1", "keep it short", TIMEOUT, &[])
            .await
            .unwrap();
        adjust_schema(&store, &producer, "job-1", "keep it short", TIMEOUT, &[])
            .await
            .unwrap();
        adjust_schema(&store, &producer, "job-1", "use formal tone", TIMEOUT, &[])
            .await
            .unwrap();

        let log = store
            .load("job-1", names::REQUIREMENTS_LOG)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.lines().count(), 3);

        let merged = store
            .load("job-1", names::REQUIREMENTS_MERGED)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(merged, "keep it short\nuse formal tone");
    }

    #[tokio::test]
    async fn test_repeated_adjust_builds_on_committed_state() {
        let store = seeded_store().await;
        let with_edu = json!({
            "groups": [{"id": "exp", "title": "Experience"}],
            "sections": [
                {"id": "summary", "title": "Summary"},
                {"id": "exp", "title": "Experience", "isGroup": true},
                {"id": "exp1", "title": "Job A", "parentId": "exp"},
                {"id": "edu", "title": "Education"}
            ]
        });

        adjust_schema(
            &store,
            &ScriptedProducer(with_edu.to_string()),
            "job-1",
            "add an education section",
            TIMEOUT,
            &[],
        )
        .await
        .unwrap();

        // Second edit starts from the committed state: edu must be present
        // in its base and survive an unrelated no-op candidate.
        let outcome = adjust_schema(
            &store,
            &FailingProducer,
            "job-1",
            "something else",
            TIMEOUT,
            &[],
        )
        .await
        .unwrap();
        assert!(outcome.schema.sections.iter().any(|s| s.id == "edu"));
    }
}
