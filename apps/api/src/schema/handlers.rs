use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::artifacts::names;
use crate::errors::AppError;
use crate::schema::adjust::{adjust_schema, load_current_schema, AdjustOutcome};
use crate::schema::baseline::build_baseline;
use crate::schema::dedupe::dedupe_sections;
use crate::schema::materialize::materialize_sections;
use crate::schema::models::{Schema, UiSection};
use crate::schema::normalize::normalize_schema;
use crate::schema::validate::{validate_schema, ValidationReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub instructions: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: Schema,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsRequest {
    #[serde(default)]
    pub prior_sections: Vec<UiSection>,
}

#[derive(Debug, Serialize)]
pub struct SectionsResponse {
    pub sections: Vec<UiSection>,
}

#[derive(Debug, Deserialize)]
pub struct BaselineRequest {
    pub sections: Vec<UiSection>,
}

#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
    pub requirements: String,
}

/// POST /api/v1/schema/validate
///
/// Total: any JSON body yields a structured report, never an error status.
pub async fn handle_validate(Json(doc): Json<Value>) -> Json<ValidationReport> {
    Json(validate_schema(&doc))
}

/// GET /api/v1/schema/:job_id
pub async fn handle_get_schema(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Schema>, AppError> {
    let schema = load_current_schema(state.artifacts.as_ref(), &job_id.to_string()).await?;
    Ok(Json(schema))
}

/// PUT /api/v1/schema/:job_id
///
/// Uploads a base schema. Fail-closed: a document with blocking errors is
/// rejected wholesale and nothing is persisted.
pub async fn handle_put_schema(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(doc): Json<Value>,
) -> Result<Json<SchemaResponse>, AppError> {
    let report = validate_schema(&doc);
    if !report.ok {
        return Err(AppError::SchemaRejected(
            report.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    let schema = normalize_schema(&doc);
    let serialized = serde_json::to_string_pretty(&schema)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("schema serialization: {e}")))?;

    let job_id = job_id.to_string();
    let store = state.artifacts.as_ref();
    store
        .save(&job_id, names::SCHEMA_BASE, &serialized)
        .await
        .map_err(AppError::storage)?;
    store
        .save(&job_id, names::CURRENT_SCHEMA, &serialized)
        .await
        .map_err(AppError::storage)?;

    Ok(Json(SchemaResponse {
        schema,
        warnings: report.warnings.into_iter().map(|w| w.message).collect(),
    }))
}

/// POST /api/v1/schema/:job_id/adjust
pub async fn handle_adjust(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<AdjustRequest>,
) -> Result<Json<AdjustOutcome>, AppError> {
    if req.instructions.trim().is_empty() {
        return Err(AppError::Validation("instructions must not be empty".to_string()));
    }

    let outcome = adjust_schema(
        state.artifacts.as_ref(),
        state.producer.as_ref(),
        &job_id.to_string(),
        &req.instructions,
        Duration::from_secs(state.config.producer_timeout_s),
        &state.config.removal_keywords_extra,
    )
    .await?;

    Ok(Json(outcome))
}

/// POST /api/v1/schema/:job_id/sections
///
/// The route-level apply helper: materializes the current schema against
/// the caller's prior tree and collapses duplicate ids.
pub async fn handle_sections(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<SectionsRequest>,
) -> Result<Json<SectionsResponse>, AppError> {
    let schema = load_current_schema(state.artifacts.as_ref(), &job_id.to_string()).await?;
    let sections = dedupe_sections(materialize_sections(&schema, &req.prior_sections));
    Ok(Json(SectionsResponse { sections }))
}

/// POST /api/v1/schema/:job_id/baseline
///
/// Seeds a schema from an existing UI tree when no schema exists yet.
pub async fn handle_baseline(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<BaselineRequest>,
) -> Result<Json<SchemaResponse>, AppError> {
    let schema = build_baseline(&req.sections);

    let doc = serde_json::to_value(&schema)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("baseline serialization: {e}")))?;
    let report = validate_schema(&doc);
    if !report.ok {
        // Duplicate ids in the input tree surface here.
        return Err(AppError::SchemaRejected(
            report.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    let serialized = serde_json::to_string_pretty(&schema)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("baseline serialization: {e}")))?;
    let job_id = job_id.to_string();
    let store = state.artifacts.as_ref();
    store
        .save(&job_id, names::SCHEMA_BASE, &serialized)
        .await
        .map_err(AppError::storage)?;
    store
        .save(&job_id, names::CURRENT_SCHEMA, &serialized)
        .await
        .map_err(AppError::storage)?;

    Ok(Json(SchemaResponse {
        schema,
        warnings: report.warnings.into_iter().map(|w| w.message).collect(),
    }))
}

/// GET /api/v1/schema/:job_id/requirements
pub async fn handle_requirements(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<RequirementsResponse>, AppError> {
    let requirements = state
        .artifacts
        .load(&job_id.to_string(), names::REQUIREMENTS_MERGED)
        .await
        .map_err(AppError::storage)?
        .unwrap_or_default();
    Ok(Json(RequirementsResponse { requirements }))
}
