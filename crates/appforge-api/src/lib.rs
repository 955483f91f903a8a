//! appforge-api — REST API for AppForge.
//!
//! Provides axum route handlers for generating applications, retrieving
//! deployed artifacts, listing deployments, and reading analytics.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/generate` | Generate and deploy an application |
//! | GET | `/deployments` | Paginated deployment listing |
//! | GET | `/deployments/{id}` | Artifact (HTML) or metadata (JSON), content negotiated |
//! | GET | `/deployments/{id}/raw` | Artifact body |
//! | GET | `/analytics` | Aggregate counters |
//! | GET | `/providers` | Configured providers |
//! | GET | `/health` | Liveness |
//! | GET | `/metrics` | Prometheus exposition |

pub mod error;
pub mod handlers;

use appforge_analytics::AnalyticsAggregator;
use appforge_orchestrator::Orchestrator;
use appforge_state::StateStore;
use axum::Router;
use axum::routing::{get, post};

pub use error::ApiError;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Orchestrator,
    pub store: StateStore,
    pub analytics: AnalyticsAggregator,
    /// Characters of artifact included in metadata previews.
    pub preview_chars: usize,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/generate", post(handlers::generate))
        .route("/deployments", get(handlers::list_deployments))
        .route("/deployments/{id}", get(handlers::get_deployment))
        .route("/deployments/{id}/raw", get(handlers::get_raw_artifact))
        .route("/analytics", get(handlers::analytics))
        .route("/providers", get(handlers::providers))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
}
