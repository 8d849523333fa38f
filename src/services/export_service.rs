use std::sync::Arc;

use tracing::info;

use crate::archive;
use crate::codec;
use crate::domain::EntityKind;
use crate::errors::PortabilityResult;
use crate::storage::{FileArtifactStore, Locations};
use crate::store::MetadataStore;

/// One packed project archive, ready to hand to the caller
#[derive(Clone, Debug)]
pub struct ProjectArchive {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Serializes one project and everything it owns into a portable archive.
///
/// Export never mutates persisted state; its only side effect is transient
/// disk usage in the operation working directory, which is removed on every
/// exit path.
#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn MetadataStore>,
    artifacts: FileArtifactStore,
    locations: Arc<Locations>,
}

impl ExportService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        artifacts: FileArtifactStore,
        locations: Arc<Locations>,
    ) -> Self {
        Self {
            store,
            artifacts,
            locations,
        }
    }

    pub async fn export(&self, project_id: i64) -> PortabilityResult<ProjectArchive> {
        let project = self.store.get_project(project_id).await?;
        let models = self.store.models_of(project_id).await?;
        let datasets = self.store.datasets_of(project_id).await?;
        let feedbacks = self.store.feedbacks_of(project_id).await?;
        let suites = self.store.test_suites_of(project_id).await?;

        let workdir = self.locations.operation_dir()?;
        let dir = workdir.path();

        codec::write_record(&Locations::metadata_path(dir, EntityKind::Project), &project)?;
        codec::write_collection(&Locations::metadata_path(dir, EntityKind::Model), &models)?;
        codec::write_collection(&Locations::metadata_path(dir, EntityKind::Dataset), &datasets)?;
        codec::write_collection(&Locations::metadata_path(dir, EntityKind::Feedback), &feedbacks)?;
        codec::write_collection(&Locations::metadata_path(dir, EntityKind::TestSuite), &suites)?;

        self.artifacts.copy_project_tree(&project.key, dir)?;

        let bytes = archive::pack_directory(dir)?;
        info!(
            "exported project {} ({} models, {} datasets, {} feedbacks, {} suites, {} bytes)",
            project.key,
            models.len(),
            datasets.len(),
            feedbacks.len(),
            suites.len(),
            bytes.len()
        );

        Ok(ProjectArchive {
            filename: format!("{}.zip", project.key),
            bytes,
        })
    }
}
