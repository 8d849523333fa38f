use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{PortabilityError, PortabilityResult};

use super::Locations;

/// Payload class stored on disk; determines directory and filename prefix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    ModelRequirements,
    Dataset,
}

impl ArtifactKind {
    pub fn directory(&self) -> &'static str {
        match self {
            ArtifactKind::Model | ArtifactKind::ModelRequirements => "models",
            ArtifactKind::Dataset => "datasets",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Model => "model_",
            ArtifactKind::ModelRequirements => "model-requirements_",
            ArtifactKind::Dataset => "data_",
        }
    }

    pub fn file_name(&self, id: i64) -> String {
        format!("{}{}", self.prefix(), id)
    }

    /// Path relative to a project home or an unpacked archive root
    pub fn relative_path(&self, id: i64) -> PathBuf {
        Path::new(self.directory()).join(self.file_name(id))
    }
}

/// Binary blob storage under a project-scoped directory tree.
///
/// `store` assigns fresh numeric ids; sidecar payloads that share their
/// owner's id go through `put`.
#[derive(Clone)]
pub struct FileArtifactStore {
    locations: Arc<Locations>,
}

impl FileArtifactStore {
    pub fn new(locations: Arc<Locations>) -> Self {
        Self { locations }
    }

    fn kind_dir(&self, project_key: &str, kind: ArtifactKind) -> PathBuf {
        self.locations.project_home(project_key).join(kind.directory())
    }

    /// Store a payload under a freshly assigned id and return that id
    pub fn store(&self, project_key: &str, kind: ArtifactKind, payload: &[u8]) -> PortabilityResult<i64> {
        let dir = self.kind_dir(project_key, kind);
        fs::create_dir_all(&dir)?;
        let id = self.next_id(&dir, kind)?;
        fs::write(dir.join(kind.file_name(id)), payload)?;
        debug!("stored {} artifact {} for project {}", kind.directory(), id, project_key);
        Ok(id)
    }

    /// Store a payload under an id assigned to its owning artifact
    pub fn put(
        &self,
        project_key: &str,
        kind: ArtifactKind,
        id: i64,
        payload: &[u8],
    ) -> PortabilityResult<()> {
        let dir = self.kind_dir(project_key, kind);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(kind.file_name(id)), payload)?;
        Ok(())
    }

    pub fn retrieve(&self, project_key: &str, kind: ArtifactKind, id: i64) -> PortabilityResult<Vec<u8>> {
        let path = self.kind_dir(project_key, kind).join(kind.file_name(id));
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(
                PortabilityError::not_found(format!("{} artifact", kind.directory()), id),
            ),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove one payload; compensation path for failed uploads
    pub fn remove(&self, project_key: &str, kind: ArtifactKind, id: i64) -> PortabilityResult<()> {
        let path = self.kind_dir(project_key, kind).join(kind.file_name(id));
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Recursively delete everything stored for a project
    pub fn delete_project(&self, project_key: &str) -> PortabilityResult<()> {
        let home = self.locations.project_home(project_key);
        if home.exists() {
            fs::remove_dir_all(&home)?;
        }
        Ok(())
    }

    /// Copy the project's artifact tree verbatim into `dest` (export step)
    pub fn copy_project_tree(&self, project_key: &str, dest: &Path) -> PortabilityResult<()> {
        let home = self.locations.project_home(project_key);
        if !home.exists() {
            return Ok(());
        }
        copy_tree(&home, &home, dest)
    }

    fn next_id(&self, dir: &Path, kind: ArtifactKind) -> PortabilityResult<i64> {
        let mut max_id = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(rest) = name.strip_prefix(kind.prefix()) {
                if let Ok(id) = rest.parse::<i64>() {
                    max_id = max_id.max(id);
                }
            }
        }
        Ok(max_id + 1)
    }
}

fn copy_tree(current: &Path, root: &Path, dest: &Path) -> PortabilityResult<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .map_err(|e| PortabilityError::Storage(format!("failed to relativize {:?}: {}", path, e)))?;
        let target = dest.join(rel);
        if path.is_dir() {
            fs::create_dir_all(&target)?;
            copy_tree(&path, root, dest)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}
