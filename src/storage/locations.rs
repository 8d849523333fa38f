use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::EntityKind;
use crate::errors::PortabilityResult;

/// Resolves every path the engine touches under one instance home.
///
/// Layout: `<home>/projects/<project_key>/{models,datasets}/...` for durable
/// artifacts and `<home>/tmp/<stamp>-<uuid>` for operation directories.
#[derive(Clone, Debug)]
pub struct Locations {
    home: PathBuf,
}

impl Locations {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Instance home from `MODELBENCH_HOME`, falling back to a directory
    /// under the system temp dir
    pub fn from_env() -> Self {
        let home = std::env::var_os("MODELBENCH_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("modelbench-home"));
        Self::new(home)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn project_home(&self, project_key: &str) -> PathBuf {
        self.home.join("projects").join(project_key)
    }

    pub fn metadata_path(dir: &Path, kind: EntityKind) -> PathBuf {
        dir.join(kind.metadata_file())
    }

    /// Allocate a uniquely named working directory for one export or import
    /// operation. The stamp plus random suffix keeps concurrent operations
    /// from ever sharing a directory.
    pub fn operation_dir(&self) -> PortabilityResult<WorkDir> {
        let name = format!(
            "{}-{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            Uuid::new_v4().simple()
        );
        WorkDir::create(self.home.join("tmp").join(name))
    }
}

/// Working directory exclusively owned by a single in-flight operation.
///
/// Removed on drop, which covers every exit path including errors and
/// caller-level abandonment.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    fn create(path: PathBuf) -> PortabilityResult<Self> {
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
