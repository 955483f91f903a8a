//! appforge-state — embedded deployment registry for AppForge.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for deployments, the bounded most-recent-first index, and the
//! analytics counters.
//!
//! # Architecture
//!
//! Everything lives in one `kv` table with `&str` keys and JSON-serialized
//! `&[u8]` values:
//!
//! | Key | Value |
//! |---|---|
//! | `deployment:{id}` | [`Deployment`](appforge_core::Deployment) |
//! | `deployment:list` | id array, newest first |
//! | `analytics:summary` | [`AnalyticsSummary`](appforge_core::AnalyticsSummary) |
//!
//! The id `list` is reserved so a deployment key never aliases the index.
//!
//! redb write transactions are exclusive, so every multi-key update made
//! inside one is atomic with respect to other writers.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::StateStore;
