use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Unresolved uniqueness conflicts surfaced by import preparation.
///
/// Computed without persisting anything, so preparing the same archive twice
/// against an unchanged destination yields an identical report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    /// Project key proposed by the archive
    pub project_key: String,
    /// Whether the destination already holds a project under that key
    pub key_conflict: bool,
    /// Distinct user logins referenced by the archive, in first-seen order
    pub source_logins: Vec<String>,
    /// Logins known to the destination user directory
    pub destination_logins: Vec<String>,
    /// Best-effort pairing of source to destination logins; overridable per
    /// login before commit
    pub default_login_mapping: IndexMap<String, String>,
}

/// Whether a proposed project key collides with an existing one
pub fn key_conflict(proposed_key: &str, existing_keys: &[String]) -> bool {
    existing_keys.iter().any(|key| key == proposed_key)
}

/// Pair source logins with destination logins positionally, by list order.
/// Source logins beyond the destination list overflow onto the first
/// destination login; with no destination logins the mapping is empty and
/// commit falls back to the requesting user.
pub fn default_login_mapping(
    source_logins: &[String],
    destination_logins: &[String],
) -> IndexMap<String, String> {
    let mut mapping = IndexMap::new();
    let Some(first_destination) = destination_logins.first() else {
        return mapping;
    };

    for (index, source) in source_logins.iter().enumerate() {
        let destination = destination_logins
            .get(index)
            .unwrap_or(first_destination);
        mapping.insert(source.clone(), destination.clone());
    }
    mapping
}
