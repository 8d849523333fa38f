//! Portable entity model
//!
//! These are the transient records that travel inside a project archive.
//! They carry source-instance identifiers on export and are re-persisted
//! under destination-assigned identifiers on import; the engine itself keeps
//! no durable state beyond one operation.

mod dataset;
mod entity_kind;
mod feedback;
mod model;
mod project;
mod test_suite;

pub use dataset::{Dataset, FeatureType};
pub use entity_kind::EntityKind;
pub use feedback::{Feedback, FeedbackReply};
pub use model::ModelArtifact;
pub use project::Project;
pub use test_suite::{TestCase, TestSuite};
