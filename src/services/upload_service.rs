use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Dataset, ModelArtifact};
use crate::errors::{PortabilityError, PortabilityResult};
use crate::storage::{ArtifactKind, FileArtifactStore};
use crate::store::MetadataStore;

/// Couples binary artifact storage with metadata persistence so a model or
/// dataset is never half-imported: either the payload and its metadata
/// record both land, or neither survives.
///
/// Payloads go in first because the artifact store is the id authority; a
/// failed metadata save is compensated by removing the just-written files.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn MetadataStore>,
    artifacts: FileArtifactStore,
}

impl UploadService {
    pub fn new(store: Arc<dyn MetadataStore>, artifacts: FileArtifactStore) -> Self {
        Self { store, artifacts }
    }

    pub async fn upload_model(
        &self,
        project_id: i64,
        project_key: &str,
        mut model: ModelArtifact,
        payload: &[u8],
        requirements: &[u8],
    ) -> PortabilityResult<ModelArtifact> {
        let id = self
            .artifacts
            .store(project_key, ArtifactKind::Model, payload)
            .map_err(|e| PortabilityError::Upload(e.to_string()))?;

        if let Err(err) = self
            .artifacts
            .put(project_key, ArtifactKind::ModelRequirements, id, requirements)
        {
            self.discard_model_files(project_key, id);
            return Err(PortabilityError::Upload(err.to_string()));
        }

        model.id = id;
        match self.store.insert_model(project_id, model).await {
            Ok(saved) => {
                debug!("uploaded model {} as {}", saved.name, saved.id);
                Ok(saved)
            }
            Err(err) => {
                self.discard_model_files(project_key, id);
                Err(err.into())
            }
        }
    }

    pub async fn upload_dataset(
        &self,
        project_id: i64,
        project_key: &str,
        mut dataset: Dataset,
        payload: &[u8],
    ) -> PortabilityResult<Dataset> {
        let id = self
            .artifacts
            .store(project_key, ArtifactKind::Dataset, payload)
            .map_err(|e| PortabilityError::Upload(e.to_string()))?;

        dataset.id = id;
        match self.store.insert_dataset(project_id, dataset).await {
            Ok(saved) => {
                debug!("uploaded dataset {} as {}", saved.name, saved.id);
                Ok(saved)
            }
            Err(err) => {
                if let Err(cleanup) = self.artifacts.remove(project_key, ArtifactKind::Dataset, id) {
                    warn!("failed to remove orphaned dataset payload {}: {}", id, cleanup);
                }
                Err(err.into())
            }
        }
    }

    fn discard_model_files(&self, project_key: &str, id: i64) {
        for kind in [ArtifactKind::Model, ArtifactKind::ModelRequirements] {
            if let Err(cleanup) = self.artifacts.remove(project_key, kind, id) {
                warn!("failed to remove orphaned model payload {}: {}", id, cleanup);
            }
        }
    }
}
