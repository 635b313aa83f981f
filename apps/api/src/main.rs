mod artifacts;
mod config;
mod errors;
mod llm_client;
mod producer;
mod routes;
mod schema;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifacts::{blob::BlobArtifactStore, fs::FsArtifactStore, ArtifactStore};
use crate::config::{Config, S3Config};
use crate::llm_client::LlmClient;
use crate::producer::LlmSchemaProducer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Schema API v{}", env!("CARGO_PKG_VERSION"));

    // Artifact store: blob-backed when S3 is configured, local filesystem
    // otherwise.
    let artifacts: Arc<dyn ArtifactStore> = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("Artifact store: s3://{}", s3.bucket);
            Arc::new(BlobArtifactStore::new(client, s3.bucket.clone()))
        }
        None => {
            info!("Artifact store: {}", config.artifacts_dir);
            Arc::new(FsArtifactStore::new(config.artifacts_dir.clone()))
        }
    };

    // Schema producer behind the LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    let producer = Arc::new(LlmSchemaProducer::new(llm));
    info!("Schema producer initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        artifacts,
        producer,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(s3: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &s3.access_key_id,
        &s3.secret_access_key,
        None,
        None,
        "cv-schema-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&s3.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
