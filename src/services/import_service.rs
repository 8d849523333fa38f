use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::archive;
use crate::codec;
use crate::domain::{Dataset, EntityKind, Feedback, ModelArtifact, Project, TestSuite};
use crate::errors::{PortabilityError, PortabilityResult};
use crate::storage::{ArtifactKind, FileArtifactStore, Locations, WorkDir};
use crate::store::{MetadataStore, UserDirectory};

use super::conflicts::{default_login_mapping, ConflictReport};
use super::id_remapper::IdRemapper;
use super::project_service::{validate_project_key, ProjectService};
use super::upload_service::UploadService;

/// Parsed metadata of one archive, in dependency order
#[derive(Debug)]
struct ProjectBundle {
    project: Project,
    models: Vec<ModelArtifact>,
    datasets: Vec<Dataset>,
    feedbacks: Vec<Feedback>,
    suites: Vec<TestSuite>,
}

/// Output of import preparation: the conflict report plus the unpacked,
/// validated archive. Dropping it abandons the import and removes the
/// working directory.
#[derive(Debug)]
pub struct PreparedImport {
    pub report: ConflictReport,
    bundle: ProjectBundle,
    workdir: WorkDir,
}

/// Caller-supplied conflict resolutions for commit
#[derive(Clone, Debug, Default)]
pub struct ImportResolutions {
    /// Replacement project key; `None` keeps the archive's key
    pub project_key: Option<String>,
    /// Login mapping applied at commit. Callers usually start from the
    /// report's default mapping and override individual logins; source
    /// logins left unmapped fall back to the requesting user.
    pub login_mapping: IndexMap<String, String>,
}

/// Materializes one project from an archive in two phases: `prepare`
/// surfaces conflicts without persisting anything, `commit` persists the
/// graph in dependency order under destination-assigned identifiers.
#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn MetadataStore>,
    users: Arc<dyn UserDirectory>,
    locations: Arc<Locations>,
    projects: ProjectService,
    uploads: UploadService,
}

impl ImportService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        users: Arc<dyn UserDirectory>,
        artifacts: FileArtifactStore,
        locations: Arc<Locations>,
    ) -> Self {
        let projects = ProjectService::new(store.clone(), artifacts.clone());
        let uploads = UploadService::new(store.clone(), artifacts);
        Self {
            store,
            users,
            locations,
            projects,
            uploads,
        }
    }

    /// Unpack and validate an archive, and report the conflicts a commit
    /// would have to resolve. Persists nothing.
    pub async fn prepare(&self, archive_bytes: &[u8]) -> PortabilityResult<PreparedImport> {
        let workdir = self.locations.operation_dir()?;
        archive::unpack(archive_bytes, workdir.path())?;

        let bundle = read_bundle(workdir.path())?;
        verify_referential_closure(&bundle)?;

        let key_conflict = self
            .store
            .find_project_by_key(&bundle.project.key)
            .await?
            .is_some();
        let source_logins = collect_source_logins(&bundle);
        let destination_logins = self.users.logins().await?;
        let default_mapping = default_login_mapping(&source_logins, &destination_logins);

        info!(
            "prepared import of project {} ({} models, {} datasets), key conflict: {}",
            bundle.project.key,
            bundle.models.len(),
            bundle.datasets.len(),
            key_conflict
        );

        Ok(PreparedImport {
            report: ConflictReport {
                project_key: bundle.project.key.clone(),
                key_conflict,
                source_logins,
                destination_logins,
                default_login_mapping: default_mapping,
            },
            bundle,
            workdir,
        })
    }

    /// Persist the prepared archive. Entities are saved in strict dependency
    /// order — project, models, datasets, feedbacks, test suites — so every
    /// reference can be rewritten through ids recorded by earlier saves.
    ///
    /// There is no automatic rollback of rows committed before a failure;
    /// the error names the entity kind and position so the operator can
    /// decide whether to delete the partial project and retry. The working
    /// directory is removed on every exit path.
    pub async fn commit(
        &self,
        prepared: PreparedImport,
        resolutions: ImportResolutions,
        requesting_user: &str,
    ) -> PortabilityResult<i64> {
        let PreparedImport {
            report,
            bundle,
            workdir,
        } = prepared;

        let project_key = resolutions
            .project_key
            .unwrap_or_else(|| report.project_key.clone());
        validate_project_key(&project_key)?;
        if self.store.find_project_by_key(&project_key).await?.is_some() {
            return Err(PortabilityError::KeyConflict(project_key));
        }

        let login_mapping = resolutions.login_mapping;
        self.validate_logins(&login_mapping, requesting_user).await?;
        let resolve_login = |login: &str| -> String {
            login_mapping
                .get(login)
                .cloned()
                .unwrap_or_else(|| requesting_user.to_string())
        };

        let mut remapper = IdRemapper::new();

        let mut project = Project::new(
            project_key.clone(),
            bundle.project.name.clone(),
            resolve_login(&bundle.project.owner_login),
        );
        project.description = bundle.project.description.clone();
        project.created_at = Utc::now();
        let mut guests: Vec<String> = bundle
            .project
            .guest_logins
            .iter()
            .map(|login| resolve_login(login))
            .collect();
        guests.sort();
        guests.dedup();
        guests.retain(|login| login != &project.owner_login);
        project.guest_logins = guests;

        let project = self.projects.create(project).await?;
        remapper.record(EntityKind::Project, bundle.project.id, project.id)?;

        for (index, model) in bundle.models.iter().enumerate() {
            let payload = read_artifact(workdir.path(), ArtifactKind::Model, model.id)
                .map_err(|e| annotate(EntityKind::Model, index, e))?;
            let requirements = read_artifact(workdir.path(), ArtifactKind::ModelRequirements, model.id)
                .map_err(|e| annotate(EntityKind::Model, index, e))?;
            let saved = self
                .uploads
                .upload_model(project.id, &project_key, model.clone(), &payload, &requirements)
                .await
                .map_err(|e| annotate(EntityKind::Model, index, e))?;
            remapper.record(EntityKind::Model, model.id, saved.id)?;
            debug!("imported model {} -> {}", model.id, saved.id);
        }

        for (index, dataset) in bundle.datasets.iter().enumerate() {
            let payload = read_artifact(workdir.path(), ArtifactKind::Dataset, dataset.id)
                .map_err(|e| annotate(EntityKind::Dataset, index, e))?;
            let saved = self
                .uploads
                .upload_dataset(project.id, &project_key, dataset.clone(), &payload)
                .await
                .map_err(|e| annotate(EntityKind::Dataset, index, e))?;
            remapper.record(EntityKind::Dataset, dataset.id, saved.id)?;
            debug!("imported dataset {} -> {}", dataset.id, saved.id);
        }

        for (index, feedback) in bundle.feedbacks.iter().enumerate() {
            let mut record = feedback.clone();
            record.model_id = remapper.resolve(EntityKind::Model, feedback.model_id)?;
            record.dataset_id = remapper.resolve(EntityKind::Dataset, feedback.dataset_id)?;
            record.user_login = resolve_login(&feedback.user_login);
            let saved = self
                .store
                .save_feedback(project.id, record)
                .await
                .map_err(|e| annotate(EntityKind::Feedback, index, e.into()))?;
            remapper.record(EntityKind::Feedback, feedback.id, saved.id)?;

            for (reply_index, reply) in feedback.replies.iter().enumerate() {
                let mut record = reply.clone();
                record.reply_to_reply =
                    remapper.resolve_opt(EntityKind::FeedbackReply, reply.reply_to_reply)?;
                record.user_login = resolve_login(&reply.user_login);
                let saved_reply = self
                    .store
                    .save_reply(saved.id, record)
                    .await
                    .map_err(|e| annotate(EntityKind::FeedbackReply, reply_index, e.into()))?;
                remapper.record(EntityKind::FeedbackReply, reply.id, saved_reply.id)?;
            }
        }

        for (index, suite) in bundle.suites.iter().enumerate() {
            let mut record = suite.clone();
            record.model_id = remapper.resolve(EntityKind::Model, suite.model_id)?;
            record.reference_dataset_id =
                remapper.resolve_opt(EntityKind::Dataset, suite.reference_dataset_id)?;
            record.actual_dataset_id =
                remapper.resolve_opt(EntityKind::Dataset, suite.actual_dataset_id)?;
            let saved = self
                .store
                .save_test_suite(project.id, record)
                .await
                .map_err(|e| annotate(EntityKind::TestSuite, index, e.into()))?;
            remapper.record(EntityKind::TestSuite, suite.id, saved.id)?;

            for (test_index, test) in suite.tests.iter().enumerate() {
                let saved_test = self
                    .store
                    .save_test(saved.id, test.clone())
                    .await
                    .map_err(|e| annotate(EntityKind::Test, test_index, e.into()))?;
                remapper.record(EntityKind::Test, test.id, saved_test.id)?;
            }
        }

        info!(
            "imported project {} as {} ({} ids remapped)",
            report.project_key,
            project.key,
            remapper.len()
        );

        Ok(project.id)
    }

    async fn validate_logins(
        &self,
        mapping: &IndexMap<String, String>,
        requesting_user: &str,
    ) -> PortabilityResult<()> {
        let mut checked: HashSet<&str> = HashSet::new();
        for destination in mapping
            .values()
            .map(String::as_str)
            .chain(std::iter::once(requesting_user))
        {
            if !checked.insert(destination) {
                continue;
            }
            if !self.users.exists(destination).await? {
                return Err(PortabilityError::not_found("user", destination));
            }
        }
        Ok(())
    }
}

/// Keep the taxonomy intact but name the failing entity kind and position
/// for storage and upload failures
fn annotate(kind: EntityKind, index: usize, err: PortabilityError) -> PortabilityError {
    match err {
        PortabilityError::Storage(message) => {
            PortabilityError::Storage(format!("{} #{}: {}", kind, index + 1, message))
        }
        PortabilityError::Upload(message) => {
            PortabilityError::Upload(format!("{} #{}: {}", kind, index + 1, message))
        }
        other => other,
    }
}

fn read_bundle(dir: &Path) -> PortabilityResult<ProjectBundle> {
    let project: Project = codec::read_record(&Locations::metadata_path(dir, EntityKind::Project))?;
    let models = codec::read_collection(&Locations::metadata_path(dir, EntityKind::Model))?;
    let datasets = codec::read_collection(&Locations::metadata_path(dir, EntityKind::Dataset))?;
    let feedbacks = codec::read_collection(&Locations::metadata_path(dir, EntityKind::Feedback))?;
    let suites = codec::read_collection(&Locations::metadata_path(dir, EntityKind::TestSuite))?;
    Ok(ProjectBundle {
        project,
        models,
        datasets,
        feedbacks,
        suites,
    })
}

fn read_artifact(dir: &Path, kind: ArtifactKind, source_id: i64) -> PortabilityResult<Vec<u8>> {
    let path = dir.join(kind.relative_path(source_id));
    match fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(PortabilityError::Storage(
            format!("payload {} missing from archive", kind.file_name(source_id)),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Every reference inside the archive must resolve to an entity the archive
/// also contains; source ids must be unique per kind
fn verify_referential_closure(bundle: &ProjectBundle) -> PortabilityResult<()> {
    let mut model_ids = HashSet::new();
    for model in &bundle.models {
        if !model_ids.insert(model.id) {
            return Err(PortabilityError::Schema(format!(
                "duplicate model id {} in models.yaml",
                model.id
            )));
        }
    }
    let mut dataset_ids = HashSet::new();
    for dataset in &bundle.datasets {
        if !dataset_ids.insert(dataset.id) {
            return Err(PortabilityError::Schema(format!(
                "duplicate dataset id {} in datasets.yaml",
                dataset.id
            )));
        }
    }

    for feedback in &bundle.feedbacks {
        if !model_ids.contains(&feedback.model_id) {
            return Err(PortabilityError::ReferentialIntegrity {
                kind: EntityKind::Model,
                source_id: feedback.model_id,
            });
        }
        if !dataset_ids.contains(&feedback.dataset_id) {
            return Err(PortabilityError::ReferentialIntegrity {
                kind: EntityKind::Dataset,
                source_id: feedback.dataset_id,
            });
        }
        let mut seen_replies = HashSet::new();
        for reply in &feedback.replies {
            if let Some(parent) = reply.reply_to_reply {
                if !seen_replies.contains(&parent) {
                    return Err(PortabilityError::ReferentialIntegrity {
                        kind: EntityKind::FeedbackReply,
                        source_id: parent,
                    });
                }
            }
            seen_replies.insert(reply.id);
        }
    }

    for suite in &bundle.suites {
        if !model_ids.contains(&suite.model_id) {
            return Err(PortabilityError::ReferentialIntegrity {
                kind: EntityKind::Model,
                source_id: suite.model_id,
            });
        }
        for dataset_ref in [suite.reference_dataset_id, suite.actual_dataset_id]
            .into_iter()
            .flatten()
        {
            if !dataset_ids.contains(&dataset_ref) {
                return Err(PortabilityError::ReferentialIntegrity {
                    kind: EntityKind::Dataset,
                    source_id: dataset_ref,
                });
            }
        }
    }

    Ok(())
}

fn collect_source_logins(bundle: &ProjectBundle) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut logins = Vec::new();
    let mut push = |login: &str| {
        if seen.insert(login.to_string()) {
            logins.push(login.to_string());
        }
    };

    push(&bundle.project.owner_login);
    for guest in &bundle.project.guest_logins {
        push(guest);
    }
    for feedback in &bundle.feedbacks {
        push(&feedback.user_login);
        for reply in &feedback.replies {
            push(&reply.user_login);
        }
    }
    logins
}
