//! Instance file layout and binary artifact storage

mod artifact_store;
mod locations;

pub use artifact_store::{ArtifactKind, FileArtifactStore};
pub use locations::{Locations, WorkDir};
