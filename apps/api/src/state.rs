use std::sync::Arc;

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::producer::SchemaProducer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Per-job artifact store. Blob-backed in deployments, filesystem in
    /// local development, in-memory in tests.
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Pluggable schema producer. Default: `LlmSchemaProducer`; tests swap
    /// in stubs.
    pub producer: Arc<dyn SchemaProducer>,
    pub config: Config,
}
