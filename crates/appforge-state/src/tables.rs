//! redb table definition and key layout for the registry.

use redb::TableDefinition;

/// Single key/value table holding every registry record.
pub const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Key of the most-recent-first deployment id list.
pub const DEPLOYMENT_LIST_KEY: &str = "deployment:list";

/// Key of the aggregate analytics record.
pub const ANALYTICS_SUMMARY_KEY: &str = "analytics:summary";

/// Id suffix taken by the index key; no deployment may use it.
pub const RESERVED_DEPLOYMENT_ID: &str = "list";

/// Key of one deployment record.
pub fn deployment_key(id: &str) -> String {
    format!("deployment:{id}")
}

/// Whether `id` would address a non-deployment record.
pub fn is_reserved_id(id: &str) -> bool {
    id == RESERVED_DEPLOYMENT_ID
}
