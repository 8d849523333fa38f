use serde::{Deserialize, Serialize};

/// Metadata record for one serialized model; the binary payload and its
/// requirements manifest live in the artifact store under the same id
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub language_version: Option<String>,
}
