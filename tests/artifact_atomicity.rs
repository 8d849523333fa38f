use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use modelbench::domain::{
    Dataset, Feedback, FeedbackReply, ModelArtifact, Project, TestCase, TestSuite,
};
use modelbench::services::ImportResolutions;
use modelbench::storage::Locations;
use modelbench::store::{InMemoryStore, MetadataStore, StoreError, StoreResult, UserDirectory};
use modelbench::PortabilityContext;

/// Delegating store that rejects dataset inserts on demand, standing in for
/// a persistence backend that fails mid-import
struct FlakyStore {
    inner: Arc<InMemoryStore>,
    reject_dataset_inserts: AtomicBool,
}

impl FlakyStore {
    fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            reject_dataset_inserts: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl MetadataStore for FlakyStore {
    async fn save_project(&self, project: Project) -> StoreResult<Project> {
        self.inner.save_project(project).await
    }

    async fn get_project(&self, id: i64) -> StoreResult<Project> {
        self.inner.get_project(id).await
    }

    async fn find_project_by_key(&self, key: &str) -> StoreResult<Option<Project>> {
        self.inner.find_project_by_key(key).await
    }

    async fn delete_project(&self, id: i64) -> StoreResult<()> {
        self.inner.delete_project(id).await
    }

    async fn insert_model(&self, project_id: i64, model: ModelArtifact) -> StoreResult<ModelArtifact> {
        self.inner.insert_model(project_id, model).await
    }

    async fn models_of(&self, project_id: i64) -> StoreResult<Vec<ModelArtifact>> {
        self.inner.models_of(project_id).await
    }

    async fn delete_model(&self, project_id: i64, id: i64) -> StoreResult<()> {
        self.inner.delete_model(project_id, id).await
    }

    async fn insert_dataset(&self, project_id: i64, dataset: Dataset) -> StoreResult<Dataset> {
        if self.reject_dataset_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("dataset row insert rejected".to_string()));
        }
        self.inner.insert_dataset(project_id, dataset).await
    }

    async fn datasets_of(&self, project_id: i64) -> StoreResult<Vec<Dataset>> {
        self.inner.datasets_of(project_id).await
    }

    async fn delete_dataset(&self, project_id: i64, id: i64) -> StoreResult<()> {
        self.inner.delete_dataset(project_id, id).await
    }

    async fn save_feedback(&self, project_id: i64, feedback: Feedback) -> StoreResult<Feedback> {
        self.inner.save_feedback(project_id, feedback).await
    }

    async fn save_reply(&self, feedback_id: i64, reply: FeedbackReply) -> StoreResult<FeedbackReply> {
        self.inner.save_reply(feedback_id, reply).await
    }

    async fn feedbacks_of(&self, project_id: i64) -> StoreResult<Vec<Feedback>> {
        self.inner.feedbacks_of(project_id).await
    }

    async fn save_test_suite(&self, project_id: i64, suite: TestSuite) -> StoreResult<TestSuite> {
        self.inner.save_test_suite(project_id, suite).await
    }

    async fn save_test(&self, suite_id: i64, test: TestCase) -> StoreResult<TestCase> {
        self.inner.save_test(suite_id, test).await
    }

    async fn test_suites_of(&self, project_id: i64) -> StoreResult<Vec<TestSuite>> {
        self.inner.test_suites_of(project_id).await
    }
}

#[async_trait]
impl UserDirectory for FlakyStore {
    async fn logins(&self) -> StoreResult<Vec<String>> {
        self.inner.logins().await
    }

    async fn exists(&self, login: &str) -> StoreResult<bool> {
        self.inner.exists(login).await
    }
}

#[tokio::test]
async fn failed_dataset_persist_leaves_no_half_imported_artifact() -> Result<()> {
    let root = tempfile::tempdir()?;
    let inner = Arc::new(InMemoryStore::with_users(["dana"]));
    let flaky = Arc::new(FlakyStore::new(inner.clone()));
    let locations = Locations::new(root.path());
    let ctx = PortabilityContext::new(flaky.clone(), flaky.clone(), locations.clone());

    let project = ctx
        .project_service()
        .create(Project::new("credit_scoring", "Credit Scoring", "dana"))
        .await?;
    ctx.upload_service()
        .upload_dataset(
            project.id,
            &project.key,
            Dataset {
                id: 0,
                name: "german credit".to_string(),
                feature_types: IndexMap::new(),
                column_types: IndexMap::new(),
                target: None,
            },
            b"compressed-rows",
        )
        .await?;
    let archive = ctx.export_project(project.id).await?;

    flaky.reject_dataset_inserts.store(true, Ordering::SeqCst);

    let prepared = ctx.prepare_import(&archive.bytes).await?;
    let resolutions = ImportResolutions {
        project_key: Some("credit_scoring_copy".to_string()),
        login_mapping: prepared.report.default_login_mapping.clone(),
    };
    let err = ctx.commit_import(prepared, resolutions, "dana").await.unwrap_err();
    assert_eq!(err.code(), "STORAGE_ERROR");
    assert!(
        err.to_string().contains("dataset #1"),
        "failure must name the entity kind and index, got: {}",
        err
    );

    // the project row itself stays (no automatic rollback), but the failed
    // dataset must be gone from both metadata and artifact storage
    let partial = inner
        .find_project_by_key("credit_scoring_copy")
        .await?
        .expect("partially imported project row remains");
    assert!(inner.datasets_of(partial.id).await?.is_empty());

    let dataset_dir = locations.project_home("credit_scoring_copy").join("datasets");
    let leftover: Vec<_> = match fs::read_dir(&dataset_dir) {
        Ok(entries) => entries.collect::<std::io::Result<Vec<_>>>()?,
        Err(_) => Vec::new(),
    };
    assert!(
        leftover.is_empty(),
        "no orphaned payload may remain after compensation"
    );

    Ok(())
}
