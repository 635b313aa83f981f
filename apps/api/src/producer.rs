//! Producer boundary — the external text-generation system that proposes
//! schema edits.
//!
//! The producer is opaque and unreliable: it takes the base schema plus
//! free-form instructions and returns a serialized schema-shaped document
//! that may be malformed. Everything downstream (normalize, validate,
//! merge, preservation assert) treats its output as untrusted. The trait
//! keeps the seam swappable; tests drive the pipeline with stubs.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::prompts::{SCHEMA_ADJUST_PROMPT_TEMPLATE, SCHEMA_ADJUST_SYSTEM};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::schema::models::Schema;

/// Carried in `AppState` as `Arc<dyn SchemaProducer>`.
#[async_trait]
pub trait SchemaProducer: Send + Sync {
    /// Proposes an edited schema document for `base` under `instructions`.
    /// Returns the raw serialized document — callers parse and validate it
    /// themselves so the verbatim output can be persisted for attribution.
    async fn propose(&self, base: &Schema, instructions: &str) -> Result<String, AppError>;
}

/// The real producer: one Claude call per edit.
pub struct LlmSchemaProducer {
    llm: LlmClient,
}

impl LlmSchemaProducer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SchemaProducer for LlmSchemaProducer {
    async fn propose(&self, base: &Schema, instructions: &str) -> Result<String, AppError> {
        let base_json = serde_json::to_string_pretty(base)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("base schema serialization: {e}")))?;
        let prompt = SCHEMA_ADJUST_PROMPT_TEMPLATE
            .replace("{base_schema}", &base_json)
            .replace("{instructions}", instructions);

        let response = self
            .llm
            .call(&prompt, SCHEMA_ADJUST_SYSTEM)
            .await
            .map_err(|e| AppError::Producer(e.to_string()))?;

        let text = response
            .text()
            .ok_or(LlmError::EmptyContent)
            .map_err(|e| AppError::Producer(e.to_string()))?;

        Ok(strip_json_fences(text).to_string())
    }
}
