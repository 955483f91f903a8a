//! REST API handlers.
//!
//! Generation goes through the `Orchestrator`; everything else reads the
//! `StateStore` directly.

use appforge_core::{Deployment, DeploymentSummary, GenerationMethod};
use appforge_orchestrator::GenerateRequest;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{ApiError, ApiState};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const ARTIFACT_CACHE_CONTROL: &str = "public, max-age=3600";
const DEFAULT_PAGE_LIMIT: usize = 20;
const MAX_PAGE_LIMIT: usize = 100;

// ── Generation ─────────────────────────────────────────────────

/// POST /generate request body.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub id: String,
    pub url: String,
    pub method: GenerationMethod,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub generation_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<Deployment> for GenerateResponse {
    fn from(d: Deployment) -> Self {
        Self {
            success: true,
            id: d.id,
            url: d.url,
            method: d.method,
            provider: d.provider,
            model: d.model,
            generation_duration_ms: d.generation_duration_ms,
            timestamp: d.created_at,
        }
    }
}

/// POST /generate
pub async fn generate(
    State(state): State<ApiState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let prompt = body
        .prompt
        .ok_or_else(|| ApiError::BadRequest("prompt is required".to_string()))?;

    // Dropping this handler (client disconnect) cancels in-flight attempts.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request = GenerateRequest {
        prompt,
        provider: body.provider,
        model: body.model,
    };
    let deployment = state.orchestrator.generate_with_cancel(request, &cancel).await?;
    Ok(Json(deployment.into()))
}

// ── Deployments ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

fn wants_json(query: &FormatQuery, headers: &HeaderMap) -> bool {
    if query.format.as_deref() == Some("json") {
        return true;
    }
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn load(state: &ApiState, id: &str) -> Result<Deployment, ApiError> {
    state
        .store
        .get_deployment(id)?
        .ok_or_else(|| ApiError::NotFound("deployment not found".to_string()))
}

fn artifact_response(deployment: Deployment) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HTML_CONTENT_TYPE),
            (header::CACHE_CONTROL, ARTIFACT_CACHE_CONTROL),
        ],
        deployment.artifact,
    )
        .into_response()
}

/// GET /deployments/{id}
pub async fn get_deployment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let deployment = load(&state, &id)?;
    if wants_json(&query, &headers) {
        let summary = DeploymentSummary::from_deployment(&deployment, state.preview_chars);
        return Ok(Json(summary).into_response());
    }
    debug!(%id, bytes = deployment.artifact.len(), "serving artifact");
    Ok(artifact_response(deployment))
}

/// GET /deployments/{id}/raw
pub async fn get_raw_artifact(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(artifact_response(load(&state, &id)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub items: Vec<DeploymentSummary>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// GET /deployments?limit=&offset=
pub async fn list_deployments(
    State(state): State<ApiState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let index = state.store.index()?;
    let total = index.len();
    let mut items = Vec::with_capacity(limit);
    for id in index.page(offset, limit) {
        match state.store.get_deployment(&id)? {
            Some(d) => items.push(DeploymentSummary::from_deployment(&d, state.preview_chars)),
            None => warn!(%id, "indexed deployment has no record"),
        }
    }

    Ok(Json(ListResponse {
        items,
        total,
        limit,
        offset,
        has_more: offset.saturating_add(limit) < total,
    }))
}

// ── Analytics & service info ───────────────────────────────────

/// GET /analytics
pub async fn analytics(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.analytics.summary()?))
}

/// GET /providers
pub async fn providers(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.orchestrator.catalog().describe())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let body = appforge_analytics::render_prometheus(&state.analytics.summary()?);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
