use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use indexmap::IndexMap;
use modelbench::archive::pack_directory;
use modelbench::codec;
use modelbench::domain::{Dataset, Feedback, ModelArtifact, Project, TestSuite};
use modelbench::services::ImportResolutions;
use modelbench::storage::Locations;
use modelbench::store::InMemoryStore;
use modelbench::PortabilityContext;

fn context(root: &Path) -> PortabilityContext {
    let store = Arc::new(InMemoryStore::with_users(["dana"]));
    PortabilityContext::new(store.clone(), store, Locations::new(root))
}

fn sample_project() -> Project {
    let mut project = Project::new("credit_scoring", "Credit Scoring", "alice");
    project.id = 1;
    project
}

fn sample_model(id: i64) -> ModelArtifact {
    ModelArtifact {
        id,
        name: format!("model-{}", id),
        language: "PYTHON".to_string(),
        language_version: None,
    }
}

fn sample_dataset(id: i64) -> Dataset {
    Dataset {
        id,
        name: format!("dataset-{}", id),
        feature_types: IndexMap::new(),
        column_types: IndexMap::new(),
        target: None,
    }
}

fn write_base_metadata(dir: &Path) -> Result<()> {
    codec::write_record(&dir.join("project.yaml"), &sample_project())?;
    codec::write_collection(&dir.join("models.yaml"), &[sample_model(1)])?;
    codec::write_collection(&dir.join("datasets.yaml"), &[sample_dataset(1)])?;
    codec::write_collection::<Feedback>(&dir.join("feedbacks.yaml"), &[])?;
    codec::write_collection::<TestSuite>(&dir.join("test_suites.yaml"), &[])?;
    Ok(())
}

#[tokio::test]
async fn feedback_referencing_absent_model_fails_prepare() -> Result<()> {
    let root = tempfile::tempdir()?;
    let ctx = context(root.path());

    let staging = tempfile::tempdir()?;
    write_base_metadata(staging.path())?;
    codec::write_collection(
        &staging.path().join("feedbacks.yaml"),
        &[Feedback {
            id: 1,
            model_id: 7,
            dataset_id: 1,
            user_login: "alice".to_string(),
            feedback_type: "general".to_string(),
            feature_name: None,
            feedback_message: "drift on holdout".to_string(),
            created_at: Utc::now(),
            replies: Vec::new(),
        }],
    )?;
    let bytes = pack_directory(staging.path())?;

    let err = ctx.prepare_import(&bytes).await.unwrap_err();
    assert_eq!(err.code(), "REFERENTIAL_INTEGRITY");
    assert!(err.to_string().contains("model reference 7"));
    Ok(())
}

#[tokio::test]
async fn suite_referencing_absent_dataset_fails_prepare() -> Result<()> {
    let root = tempfile::tempdir()?;
    let ctx = context(root.path());

    let staging = tempfile::tempdir()?;
    write_base_metadata(staging.path())?;
    codec::write_collection(
        &staging.path().join("test_suites.yaml"),
        &[TestSuite {
            id: 1,
            name: "gate".to_string(),
            model_id: 1,
            reference_dataset_id: Some(9),
            actual_dataset_id: None,
            tests: Vec::new(),
        }],
    )?;
    let bytes = pack_directory(staging.path())?;

    let err = ctx.prepare_import(&bytes).await.unwrap_err();
    assert_eq!(err.code(), "REFERENTIAL_INTEGRITY");
    Ok(())
}

#[tokio::test]
async fn missing_metadata_file_fails_with_schema_error() -> Result<()> {
    let root = tempfile::tempdir()?;
    let ctx = context(root.path());

    let staging = tempfile::tempdir()?;
    write_base_metadata(staging.path())?;
    fs::remove_file(staging.path().join("models.yaml"))?;
    let bytes = pack_directory(staging.path())?;

    let err = ctx.prepare_import(&bytes).await.unwrap_err();
    assert_eq!(err.code(), "SCHEMA_ERROR");
    assert!(err.to_string().contains("models.yaml"));
    Ok(())
}

#[tokio::test]
async fn duplicate_source_ids_fail_with_schema_error() -> Result<()> {
    let root = tempfile::tempdir()?;
    let ctx = context(root.path());

    let staging = tempfile::tempdir()?;
    write_base_metadata(staging.path())?;
    codec::write_collection(
        &staging.path().join("datasets.yaml"),
        &[sample_dataset(1), sample_dataset(1)],
    )?;
    let bytes = pack_directory(staging.path())?;

    let err = ctx.prepare_import(&bytes).await.unwrap_err();
    assert_eq!(err.code(), "SCHEMA_ERROR");
    assert!(err.to_string().contains("duplicate dataset id"));
    Ok(())
}

#[tokio::test]
async fn missing_payload_fails_commit_naming_the_entity() -> Result<()> {
    let root = tempfile::tempdir()?;
    let ctx = context(root.path());

    // metadata lists a model but the archive carries no binary payload
    let staging = tempfile::tempdir()?;
    write_base_metadata(staging.path())?;
    codec::write_collection::<Dataset>(&staging.path().join("datasets.yaml"), &[])?;
    let bytes = pack_directory(staging.path())?;

    let prepared = ctx.prepare_import(&bytes).await?;
    let resolutions = ImportResolutions {
        project_key: None,
        login_mapping: prepared.report.default_login_mapping.clone(),
    };
    let err = ctx.commit_import(prepared, resolutions, "dana").await.unwrap_err();
    assert_eq!(err.code(), "STORAGE_ERROR");
    assert!(err.to_string().contains("model_1"));
    Ok(())
}

#[tokio::test]
async fn archive_without_project_metadata_is_rejected() -> Result<()> {
    let root = tempfile::tempdir()?;
    let ctx = context(root.path());

    let staging = tempfile::tempdir()?;
    fs::write(staging.path().join("readme.txt"), b"not a project archive")?;
    let bytes = pack_directory(staging.path())?;

    let err = ctx.prepare_import(&bytes).await.unwrap_err();
    assert_eq!(err.code(), "SCHEMA_ERROR");
    Ok(())
}
