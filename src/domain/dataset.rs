use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared role of a dataset column in model inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Category,
    Numeric,
    Text,
}

/// Metadata record for one tabular dataset; the compressed payload lives in
/// the artifact store under the same id
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// Keyed by column name; insertion order is preserved so serialized
    /// metadata stays diff-friendly
    #[serde(default)]
    pub feature_types: IndexMap<String, FeatureType>,
    #[serde(default)]
    pub column_types: IndexMap<String, String>,
    #[serde(default)]
    pub target: Option<String>,
}
