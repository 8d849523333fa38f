use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{Dataset, Feedback, FeedbackReply, ModelArtifact, Project, TestCase, TestSuite};

use super::{MetadataStore, StoreError, StoreResult, UserDirectory};

#[derive(Default)]
struct Tables {
    next_project_id: i64,
    next_feedback_id: i64,
    next_reply_id: i64,
    next_suite_id: i64,
    next_test_id: i64,
    projects: HashMap<i64, Project>,
    models: HashMap<i64, Vec<ModelArtifact>>,
    datasets: HashMap<i64, Vec<Dataset>>,
    feedbacks: Vec<(i64, Feedback)>,
    suites: Vec<(i64, TestSuite)>,
    users: Vec<String>,
}

/// Reference `MetadataStore`/`UserDirectory` backed by in-process tables.
///
/// Used by the integration tests and by embedders that do not bring their
/// own persistence engine.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, S>(logins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut tables = store.tables.write().expect("store lock poisoned");
            tables.users = logins.into_iter().map(Into::into).collect();
        }
        store
    }

    pub fn add_user(&self, login: impl Into<String>) {
        let mut tables = self.tables.write().expect("store lock poisoned");
        tables.users.push(login.into());
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().expect("store lock poisoned")
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().expect("store lock poisoned")
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn save_project(&self, mut project: Project) -> StoreResult<Project> {
        let mut tables = self.write();
        tables.next_project_id += 1;
        project.id = tables.next_project_id;
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: i64) -> StoreResult<Project> {
        self.read()
            .projects
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "project",
                id,
            })
    }

    async fn find_project_by_key(&self, key: &str) -> StoreResult<Option<Project>> {
        Ok(self
            .read()
            .projects
            .values()
            .find(|p| p.key == key)
            .cloned())
    }

    async fn delete_project(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.write();
        if tables.projects.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: "project",
                id,
            });
        }
        tables.models.remove(&id);
        tables.datasets.remove(&id);
        tables.feedbacks.retain(|(project_id, _)| *project_id != id);
        tables.suites.retain(|(project_id, _)| *project_id != id);
        Ok(())
    }

    async fn insert_model(&self, project_id: i64, model: ModelArtifact) -> StoreResult<ModelArtifact> {
        let mut tables = self.write();
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound {
                entity: "project",
                id: project_id,
            });
        }
        let models = tables.models.entry(project_id).or_default();
        if models.iter().any(|m| m.id == model.id) {
            return Err(StoreError::Backend(format!(
                "model id {} already exists in project {}",
                model.id, project_id
            )));
        }
        models.push(model.clone());
        Ok(model)
    }

    async fn models_of(&self, project_id: i64) -> StoreResult<Vec<ModelArtifact>> {
        Ok(self.read().models.get(&project_id).cloned().unwrap_or_default())
    }

    async fn delete_model(&self, project_id: i64, id: i64) -> StoreResult<()> {
        let mut tables = self.write();
        if let Some(models) = tables.models.get_mut(&project_id) {
            models.retain(|m| m.id != id);
        }
        Ok(())
    }

    async fn insert_dataset(&self, project_id: i64, dataset: Dataset) -> StoreResult<Dataset> {
        let mut tables = self.write();
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound {
                entity: "project",
                id: project_id,
            });
        }
        let datasets = tables.datasets.entry(project_id).or_default();
        if datasets.iter().any(|d| d.id == dataset.id) {
            return Err(StoreError::Backend(format!(
                "dataset id {} already exists in project {}",
                dataset.id, project_id
            )));
        }
        datasets.push(dataset.clone());
        Ok(dataset)
    }

    async fn datasets_of(&self, project_id: i64) -> StoreResult<Vec<Dataset>> {
        Ok(self
            .read()
            .datasets
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_dataset(&self, project_id: i64, id: i64) -> StoreResult<()> {
        let mut tables = self.write();
        if let Some(datasets) = tables.datasets.get_mut(&project_id) {
            datasets.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn save_feedback(&self, project_id: i64, mut feedback: Feedback) -> StoreResult<Feedback> {
        let mut tables = self.write();
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound {
                entity: "project",
                id: project_id,
            });
        }
        tables.next_feedback_id += 1;
        feedback.id = tables.next_feedback_id;
        feedback.replies = Vec::new();
        tables.feedbacks.push((project_id, feedback.clone()));
        Ok(feedback)
    }

    async fn save_reply(&self, feedback_id: i64, mut reply: FeedbackReply) -> StoreResult<FeedbackReply> {
        let mut tables = self.write();
        tables.next_reply_id += 1;
        reply.id = tables.next_reply_id;
        let parent = tables
            .feedbacks
            .iter_mut()
            .find(|(_, f)| f.id == feedback_id)
            .ok_or(StoreError::NotFound {
                entity: "feedback",
                id: feedback_id,
            })?;
        parent.1.replies.push(reply.clone());
        Ok(reply)
    }

    async fn feedbacks_of(&self, project_id: i64) -> StoreResult<Vec<Feedback>> {
        Ok(self
            .read()
            .feedbacks
            .iter()
            .filter(|(owner, _)| *owner == project_id)
            .map(|(_, f)| f.clone())
            .collect())
    }

    async fn save_test_suite(&self, project_id: i64, mut suite: TestSuite) -> StoreResult<TestSuite> {
        let mut tables = self.write();
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound {
                entity: "project",
                id: project_id,
            });
        }
        tables.next_suite_id += 1;
        suite.id = tables.next_suite_id;
        suite.tests = Vec::new();
        tables.suites.push((project_id, suite.clone()));
        Ok(suite)
    }

    async fn save_test(&self, suite_id: i64, mut test: TestCase) -> StoreResult<TestCase> {
        let mut tables = self.write();
        tables.next_test_id += 1;
        test.id = tables.next_test_id;
        let parent = tables
            .suites
            .iter_mut()
            .find(|(_, s)| s.id == suite_id)
            .ok_or(StoreError::NotFound {
                entity: "test suite",
                id: suite_id,
            })?;
        parent.1.tests.push(test.clone());
        Ok(test)
    }

    async fn test_suites_of(&self, project_id: i64) -> StoreResult<Vec<TestSuite>> {
        Ok(self
            .read()
            .suites
            .iter()
            .filter(|(owner, _)| *owner == project_id)
            .map(|(_, s)| s.clone())
            .collect())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn logins(&self) -> StoreResult<Vec<String>> {
        Ok(self.read().users.clone())
    }

    async fn exists(&self, login: &str) -> StoreResult<bool> {
        Ok(self.read().users.iter().any(|l| l == login))
    }
}
