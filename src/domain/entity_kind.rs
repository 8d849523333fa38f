use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit of identifier remapping during one import operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Project,
    Model,
    Dataset,
    Feedback,
    FeedbackReply,
    TestSuite,
    Test,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Model => "model",
            EntityKind::Dataset => "dataset",
            EntityKind::Feedback => "feedback",
            EntityKind::FeedbackReply => "feedback reply",
            EntityKind::TestSuite => "test suite",
            EntityKind::Test => "test",
        }
    }

    /// Metadata file inside the archive that carries entities of this kind.
    /// Owned kinds (replies, tests) are serialized inline with their parent.
    pub fn metadata_file(&self) -> &'static str {
        match self {
            EntityKind::Project => "project.yaml",
            EntityKind::Model => "models.yaml",
            EntityKind::Dataset => "datasets.yaml",
            EntityKind::Feedback | EntityKind::FeedbackReply => "feedbacks.yaml",
            EntityKind::TestSuite | EntityKind::Test => "test_suites.yaml",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
