use std::sync::Arc;

use crate::errors::PortabilityResult;
use crate::services::{
    ExportService, ImportResolutions, ImportService, PreparedImport, ProjectArchive,
    ProjectService, UploadService,
};
use crate::storage::{FileArtifactStore, Locations};
use crate::store::{MetadataStore, UserDirectory};

/// Wires the persistence collaborators and storage layout into the
/// portability services and exposes the upward-facing contract: one-shot
/// export plus two-phase prepare/commit import.
#[derive(Clone)]
pub struct PortabilityContext {
    locations: Arc<Locations>,
    artifacts: FileArtifactStore,
    projects: ProjectService,
    uploads: UploadService,
    exports: ExportService,
    imports: ImportService,
}

impl PortabilityContext {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        users: Arc<dyn UserDirectory>,
        locations: Locations,
    ) -> Self {
        let locations = Arc::new(locations);
        let artifacts = FileArtifactStore::new(locations.clone());
        let projects = ProjectService::new(store.clone(), artifacts.clone());
        let uploads = UploadService::new(store.clone(), artifacts.clone());
        let exports = ExportService::new(store.clone(), artifacts.clone(), locations.clone());
        let imports = ImportService::new(store, users, artifacts.clone(), locations.clone());
        Self {
            locations,
            artifacts,
            projects,
            uploads,
            exports,
            imports,
        }
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn project_service(&self) -> &ProjectService {
        &self.projects
    }

    pub fn upload_service(&self) -> &UploadService {
        &self.uploads
    }

    pub fn artifact_store(&self) -> &FileArtifactStore {
        &self.artifacts
    }

    /// Serialize one project into a self-contained archive
    pub async fn export_project(&self, project_id: i64) -> PortabilityResult<ProjectArchive> {
        self.exports.export(project_id).await
    }

    /// Unpack an archive and surface the conflicts a commit would face
    pub async fn prepare_import(&self, archive_bytes: &[u8]) -> PortabilityResult<PreparedImport> {
        self.imports.prepare(archive_bytes).await
    }

    /// Persist a prepared archive under the resolved key and login mapping
    pub async fn commit_import(
        &self,
        prepared: PreparedImport,
        resolutions: ImportResolutions,
        requesting_user: &str,
    ) -> PortabilityResult<i64> {
        self.imports.commit(prepared, resolutions, requesting_user).await
    }

    /// Delete a project's metadata and artifact tree
    pub async fn delete_project(&self, project_id: i64) -> PortabilityResult<()> {
        self.projects.delete(project_id).await
    }
}
