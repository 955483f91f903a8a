//! Shared types used across AppForge crates.
//!
//! A [`Deployment`] is the immutable record of one generation outcome. The
//! registry keeps deployments alongside a bounded [`DeploymentIndex`], and
//! the analytics aggregator owns a single [`AnalyticsSummary`].

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier of a deployment.
pub type DeploymentId = String;

/// Provider key under which template fallbacks are counted.
pub const TEMPLATE_PROVIDER_KEY: &str = "template";

const TEMPLATE_FALLBACK: &str = "template-fallback";
const PROVIDER_SUFFIX: &str = "-ai";

// ── Generation method ─────────────────────────────────────────────

/// How the artifact of a deployment was produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GenerationMethod {
    /// Produced by the named provider and accepted by the validator.
    Provider(String),
    /// Produced locally by the template library.
    TemplateFallback,
}

impl GenerationMethod {
    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationMethod::TemplateFallback)
    }
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMethod::Provider(name) => write!(f, "{name}{PROVIDER_SUFFIX}"),
            GenerationMethod::TemplateFallback => f.write_str(TEMPLATE_FALLBACK),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown generation method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for GenerationMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == TEMPLATE_FALLBACK {
            return Ok(GenerationMethod::TemplateFallback);
        }
        match s.strip_suffix(PROVIDER_SUFFIX) {
            Some(name) if !name.is_empty() => Ok(GenerationMethod::Provider(name.to_string())),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl From<GenerationMethod> for String {
    fn from(method: GenerationMethod) -> Self {
        method.to_string()
    }
}

impl TryFrom<String> for GenerationMethod {
    type Error = UnknownMethod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ── Deployment ────────────────────────────────────────────────────

/// One persisted generation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: DeploymentId,
    /// The original request, verbatim.
    pub prompt: String,
    /// Generated document body. Always passed the validator before storage.
    pub artifact: String,
    pub method: GenerationMethod,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Wall-clock time of the whole orchestration.
    pub generation_duration_ms: u64,
    pub created_at: DateTime<Utc>,
    /// Retrieval address for this deployment.
    pub url: String,
}

/// Generate a fresh deployment id: hex millisecond timestamp plus a random suffix.
pub fn new_deployment_id() -> DeploymentId {
    let millis = Utc::now().timestamp_millis().max(0);
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis:x}-{}", &random[..12])
}

/// Build the retrieval URL of a deployment under the given public base URL.
pub fn deployment_url(base_url: &str, id: &str) -> String {
    format!("{}/deployments/{id}", base_url.trim_end_matches('/'))
}

/// A deployment without its full artifact body, used in listings and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub id: DeploymentId,
    pub url: String,
    pub prompt: String,
    pub method: GenerationMethod,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub generation_duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub artifact_preview: String,
    pub artifact_bytes: usize,
}

impl DeploymentSummary {
    /// Summarize a deployment, keeping at most `preview_chars` characters of the artifact.
    pub fn from_deployment(deployment: &Deployment, preview_chars: usize) -> Self {
        let preview = match deployment.artifact.char_indices().nth(preview_chars) {
            Some((cut, _)) => deployment.artifact[..cut].to_string(),
            None => deployment.artifact.clone(),
        };
        Self {
            id: deployment.id.clone(),
            url: deployment.url.clone(),
            prompt: deployment.prompt.clone(),
            method: deployment.method.clone(),
            provider: deployment.provider.clone(),
            model: deployment.model.clone(),
            generation_duration_ms: deployment.generation_duration_ms,
            created_at: deployment.created_at,
            artifact_preview: preview,
            artifact_bytes: deployment.artifact.len(),
        }
    }
}

// ── Index ─────────────────────────────────────────────────────────

/// Most-recent-first list of deployment ids, bounded by `capacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentIndex {
    ids: VecDeque<DeploymentId>,
    capacity: usize,
}

impl DeploymentIndex {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild an index from stored ids (newest first), dropping anything past capacity.
    pub fn from_ids(ids: impl IntoIterator<Item = DeploymentId>, capacity: usize) -> Self {
        let mut index = Self::new(capacity);
        index.ids.extend(ids.into_iter().take(index.capacity));
        index
    }

    /// Insert at the head. Returns the ids evicted from the tail, oldest last.
    pub fn push_front(&mut self, id: DeploymentId) -> Vec<DeploymentId> {
        self.ids.push_front(id);
        let mut evicted = Vec::new();
        while self.ids.len() > self.capacity {
            if let Some(old) = self.ids.pop_back() {
                evicted.push(old);
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeploymentId> {
        self.ids.iter()
    }

    /// Ids in the window `[offset, offset + limit)`.
    pub fn page(&self, offset: usize, limit: usize) -> Vec<DeploymentId> {
        self.ids.iter().skip(offset).take(limit).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<DeploymentId> {
        self.ids.iter().cloned().collect()
    }
}

// ── Analytics ─────────────────────────────────────────────────────

/// Aggregate counters over all deployments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_deployments: u64,
    pub total_generation_time_ms: u64,
    pub average_generation_time_ms: f64,
    pub counts_by_provider: BTreeMap<String, u64>,
    pub counts_by_method: BTreeMap<String, u64>,
    pub last_update: Option<DateTime<Utc>>,
}

impl AnalyticsSummary {
    /// Count one deployment. `provider` is `None` for template fallbacks.
    pub fn apply(
        &mut self,
        provider: Option<&str>,
        method: &GenerationMethod,
        duration_ms: u64,
        now: DateTime<Utc>,
    ) {
        self.total_deployments += 1;
        self.total_generation_time_ms = self.total_generation_time_ms.saturating_add(duration_ms);
        self.average_generation_time_ms =
            self.total_generation_time_ms as f64 / self.total_deployments as f64;
        let provider_key = provider.unwrap_or(TEMPLATE_PROVIDER_KEY).to_string();
        *self.counts_by_provider.entry(provider_key).or_insert(0) += 1;
        *self.counts_by_method.entry(method.to_string()).or_insert(0) += 1;
        self.last_update = Some(now);
    }
}
