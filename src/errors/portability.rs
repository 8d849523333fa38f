use thiserror::Error;

use crate::domain::EntityKind;
use crate::store::StoreError;

/// Errors raised by the export/import pipeline
#[derive(Error, Debug)]
pub enum PortabilityError {
    /// Unknown project or entity id
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// Archive metadata is missing required fields or malformed
    #[error("Invalid archive metadata: {0}")]
    Schema(String),

    /// Destination already holds the proposed project key
    #[error("Project key '{0}' already exists at the destination")]
    KeyConflict(String),

    /// Project key does not match the allowed pattern
    #[error("Project key '{0}' is not valid; keys may contain lower case latin characters, digits and underscores")]
    InvalidKey(String),

    /// Archive references an entity id that is not part of the archive
    #[error("{kind} reference {source_id} is not part of the archive")]
    ReferentialIntegrity { kind: EntityKind, source_id: i64 },

    /// Disk, archive, or persistence I/O failure
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Artifact store rejected a payload
    #[error("Artifact upload failed: {0}")]
    Upload(String),
}

impl PortabilityError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        PortabilityError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True for conflicts the caller can resolve and retry without
    /// re-uploading the archive
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PortabilityError::KeyConflict(_))
    }

    /// True for errors that indicate a corrupt or foreign-format archive;
    /// these abort the whole import and are never retried
    pub fn is_fatal_for_archive(&self) -> bool {
        matches!(
            self,
            PortabilityError::Schema(_) | PortabilityError::ReferentialIntegrity { .. }
        )
    }

    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PortabilityError::NotFound { .. } => "NOT_FOUND",
            PortabilityError::Schema(_) => "SCHEMA_ERROR",
            PortabilityError::KeyConflict(_) => "KEY_CONFLICT",
            PortabilityError::InvalidKey(_) => "INVALID_KEY",
            PortabilityError::ReferentialIntegrity { .. } => "REFERENTIAL_INTEGRITY",
            PortabilityError::Storage(_) => "STORAGE_ERROR",
            PortabilityError::Upload(_) => "UPLOAD_ERROR",
        }
    }
}

impl From<std::io::Error> for PortabilityError {
    fn from(err: std::io::Error) -> Self {
        PortabilityError::Storage(err.to_string())
    }
}

impl From<zip::result::ZipError> for PortabilityError {
    fn from(err: zip::result::ZipError) -> Self {
        PortabilityError::Storage(format!("archive error: {}", err))
    }
}

impl From<serde_yaml::Error> for PortabilityError {
    fn from(err: serde_yaml::Error) -> Self {
        PortabilityError::Schema(err.to_string())
    }
}

impl From<StoreError> for PortabilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => PortabilityError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            },
            StoreError::Backend(message) => PortabilityError::Storage(message),
        }
    }
}
