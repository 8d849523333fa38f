use serde::{Deserialize, Serialize};

/// One test suite bound to a model and up to two datasets. Tests are
/// exclusively owned and exported inline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub model_id: i64,
    #[serde(default)]
    pub reference_dataset_id: Option<i64>,
    #[serde(default)]
    pub actual_dataset_id: Option<i64>,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub test_type: Option<String>,
}
