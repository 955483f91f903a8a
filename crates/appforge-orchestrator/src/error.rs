//! Errors surfaced by a generation request.

use appforge_state::StateError;
use thiserror::Error;

/// Why a generation produced no deployment.
///
/// Provider failures never appear here: they are logged and the chain moves
/// on, ending in the template fallback.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The request itself is unusable. Nothing was attempted or stored.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The deployment could not be stored.
    #[error("failed to persist deployment: {0}")]
    Persistence(#[from] StateError),

    /// The caller went away before the deployment was stored.
    #[error("generation cancelled")]
    Cancelled,
}
