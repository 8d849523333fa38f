//! Persistence collaborators consumed by the portability engine
//!
//! The relational engine itself is out of scope; the coordinators only rely
//! on the narrow contracts below. Every save is individually atomic — there
//! is no cross-save transaction, which is why import order matters.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Dataset, Feedback, FeedbackReply, ModelArtifact, Project, TestCase, TestSuite};

pub use memory::InMemoryStore;

/// Persistence backend failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("persistence failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity persistence used by the export and import coordinators.
///
/// Models and datasets are inserted under ids assigned by the artifact
/// store; all other entities receive their destination id from the backend
/// on save.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn save_project(&self, project: Project) -> StoreResult<Project>;
    async fn get_project(&self, id: i64) -> StoreResult<Project>;
    async fn find_project_by_key(&self, key: &str) -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: i64) -> StoreResult<()>;

    async fn insert_model(&self, project_id: i64, model: ModelArtifact) -> StoreResult<ModelArtifact>;
    async fn models_of(&self, project_id: i64) -> StoreResult<Vec<ModelArtifact>>;
    async fn delete_model(&self, project_id: i64, id: i64) -> StoreResult<()>;

    async fn insert_dataset(&self, project_id: i64, dataset: Dataset) -> StoreResult<Dataset>;
    async fn datasets_of(&self, project_id: i64) -> StoreResult<Vec<Dataset>>;
    async fn delete_dataset(&self, project_id: i64, id: i64) -> StoreResult<()>;

    async fn save_feedback(&self, project_id: i64, feedback: Feedback) -> StoreResult<Feedback>;
    async fn save_reply(&self, feedback_id: i64, reply: FeedbackReply) -> StoreResult<FeedbackReply>;
    async fn feedbacks_of(&self, project_id: i64) -> StoreResult<Vec<Feedback>>;

    async fn save_test_suite(&self, project_id: i64, suite: TestSuite) -> StoreResult<TestSuite>;
    async fn save_test(&self, suite_id: i64, test: TestCase) -> StoreResult<TestCase>;
    async fn test_suites_of(&self, project_id: i64) -> StoreResult<Vec<TestSuite>>;
}

/// Destination user lookup, used to validate login mappings before commit
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn logins(&self) -> StoreResult<Vec<String>>;
    async fn exists(&self, login: &str) -> StoreResult<bool>;
}
