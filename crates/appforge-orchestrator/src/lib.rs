//! appforge-orchestrator — turns a prompt into a persisted deployment.
//!
//! The [`Orchestrator`] walks the provider chain one attempt at a time,
//! accepts the first output that passes the validator, falls back to the
//! local template library when every provider fails, then persists the
//! deployment and records analytics.
//!
//! ```text
//! prompt ─► enhance ─► [provider₁ ─► validate] ─► … ─► [providerₙ ─► validate]
//!                                 │ accepted                      │ exhausted
//!                                 ▼                               ▼
//!                         Deployment(<name>-ai)       templates::fallback(prompt)
//!                                 └───────────► create_deployment ◄┘
//!                                                       │
//!                                               record_event (best-effort)
//! ```

pub mod error;
pub mod orchestrator;
pub mod prompt;

pub use error::GenerateError;
pub use orchestrator::{GenerateRequest, Orchestrator};
