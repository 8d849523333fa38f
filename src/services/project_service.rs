use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::domain::Project;
use crate::errors::{PortabilityError, PortabilityResult};
use crate::storage::FileArtifactStore;
use crate::store::MetadataStore;

static PROJECT_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z\d_]+$").expect("project key pattern is valid"));

pub fn is_project_key_valid(project_key: &str) -> bool {
    PROJECT_KEY_PATTERN.is_match(project_key)
}

pub fn validate_project_key(project_key: &str) -> PortabilityResult<()> {
    if !is_project_key_valid(project_key) {
        return Err(PortabilityError::InvalidKey(project_key.to_string()));
    }
    Ok(())
}

/// Project lifecycle operations shared by the export and import paths
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn MetadataStore>,
    artifacts: FileArtifactStore,
}

impl ProjectService {
    pub fn new(store: Arc<dyn MetadataStore>, artifacts: FileArtifactStore) -> Self {
        Self { store, artifacts }
    }

    /// Create a project under a validated, unused key
    pub async fn create(&self, project: Project) -> PortabilityResult<Project> {
        validate_project_key(&project.key)?;
        if self.store.find_project_by_key(&project.key).await?.is_some() {
            return Err(PortabilityError::KeyConflict(project.key));
        }
        let saved = self.store.save_project(project).await?;
        info!("created project {} ({})", saved.key, saved.id);
        Ok(saved)
    }

    pub async fn get(&self, project_id: i64) -> PortabilityResult<Project> {
        Ok(self.store.get_project(project_id).await?)
    }

    pub async fn find_by_key(&self, project_key: &str) -> PortabilityResult<Option<Project>> {
        Ok(self.store.find_project_by_key(project_key).await?)
    }

    /// Delete a project's metadata and its artifact tree
    pub async fn delete(&self, project_id: i64) -> PortabilityResult<()> {
        let project = self.store.get_project(project_id).await?;
        self.store.delete_project(project_id).await?;
        self.artifacts.delete_project(&project.key)?;
        info!("deleted project {} ({})", project.key, project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pattern() {
        assert!(is_project_key_valid("fraud_model"));
        assert!(is_project_key_valid("fraud_model_2"));
        assert!(is_project_key_valid("a1"));
        assert!(!is_project_key_valid("Fraud"));
        assert!(!is_project_key_valid("fraud-model"));
        assert!(!is_project_key_valid("fraud model"));
        assert!(!is_project_key_valid(""));
    }
}
