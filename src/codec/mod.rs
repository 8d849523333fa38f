//! YAML metadata codec
//!
//! One structured file per entity kind. Reads are forward-compatible:
//! attributes the current engine does not know are ignored, so archives
//! produced by newer engine versions still parse. A missing or ill-typed
//! required attribute is a schema error carrying the offending file name.
//!
//! Serialization order follows struct declaration order (and insertion order
//! for mappings), so repeated exports of the same project are byte-identical
//! and archives stay diff-friendly.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{PortabilityError, PortabilityResult};

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_source(path: &Path) -> PortabilityResult<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(PortabilityError::Schema(
            format!("missing metadata file {}", file_label(path)),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Serialize one entity record into a structured file
pub fn write_record<T: Serialize>(path: &Path, record: &T) -> PortabilityResult<()> {
    let yaml = serde_yaml::to_string(record)?;
    fs::write(path, yaml)?;
    Ok(())
}

/// Deserialize one entity record, tolerating unknown attributes
pub fn read_record<T: DeserializeOwned>(path: &Path) -> PortabilityResult<T> {
    let content = read_source(path)?;
    serde_yaml::from_str(&content)
        .map_err(|e| PortabilityError::Schema(format!("{}: {}", file_label(path), e)))
}

/// Serialize an ordered collection of entities of one kind
pub fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> PortabilityResult<()> {
    let yaml = serde_yaml::to_string(records)?;
    fs::write(path, yaml)?;
    Ok(())
}

/// Deserialize a collection, tolerating unknown attributes per record
pub fn read_collection<T: DeserializeOwned>(path: &Path) -> PortabilityResult<Vec<T>> {
    let content = read_source(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&content)
        .map_err(|e| PortabilityError::Schema(format!("{}: {}", file_label(path), e)))
}
