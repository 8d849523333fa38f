use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;
use modelbench::domain::Project;
use modelbench::services::ImportResolutions;
use modelbench::storage::Locations;
use modelbench::store::{InMemoryStore, MetadataStore};
use modelbench::PortabilityContext;

async fn seeded_context(
    root: &std::path::Path,
    users: &[&str],
    project_key: &str,
) -> Result<(Arc<InMemoryStore>, PortabilityContext, Vec<u8>)> {
    let store = Arc::new(InMemoryStore::with_users(users.iter().copied()));
    let ctx = PortabilityContext::new(store.clone(), store.clone(), Locations::new(root));

    let mut project = Project::new(project_key, "Fraud Detection", "alice");
    project.guest_logins = vec!["bob".to_string(), "carol".to_string()];
    let project = ctx.project_service().create(project).await?;
    let archive = ctx.export_project(project.id).await?;

    Ok((store, ctx, archive.bytes))
}

#[tokio::test]
async fn key_conflict_is_surfaced_and_resolvable() -> Result<()> {
    let root = tempfile::tempdir()?;
    let (store, ctx, bytes) = seeded_context(root.path(), &["dana"], "fraud_model").await?;

    let prepared = ctx.prepare_import(&bytes).await?;
    assert!(prepared.report.key_conflict);
    assert_eq!(prepared.report.project_key, "fraud_model");

    // committing with the conflicting key unresolved must fail
    let err = ctx
        .commit_import(prepared, ImportResolutions::default(), "dana")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "KEY_CONFLICT");

    // choosing a new key resolves the conflict without re-uploading
    let prepared = ctx.prepare_import(&bytes).await?;
    let resolutions = ImportResolutions {
        project_key: Some("fraud_model_2".to_string()),
        login_mapping: prepared.report.default_login_mapping.clone(),
    };
    let imported_id = ctx.commit_import(prepared, resolutions, "dana").await?;

    let imported = store.get_project(imported_id).await?;
    assert_eq!(imported.key, "fraud_model_2");
    Ok(())
}

#[tokio::test]
async fn prepare_is_idempotent_against_unchanged_destination() -> Result<()> {
    let root = tempfile::tempdir()?;
    let (_store, ctx, bytes) = seeded_context(root.path(), &["dana", "erin"], "fraud_model").await?;

    let first = ctx.prepare_import(&bytes).await?;
    let second = ctx.prepare_import(&bytes).await?;
    assert_eq!(first.report, second.report);
    Ok(())
}

#[tokio::test]
async fn default_mapping_overflows_onto_first_destination_login() -> Result<()> {
    let root = tempfile::tempdir()?;
    let (store, ctx, bytes) = seeded_context(root.path(), &["dana"], "fraud_model").await?;

    let prepared = ctx.prepare_import(&bytes).await?;
    assert_eq!(
        prepared.report.source_logins,
        vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
    );
    for source in &prepared.report.source_logins {
        assert_eq!(
            prepared.report.default_login_mapping.get(source).map(String::as_str),
            Some("dana")
        );
    }

    let resolutions = ImportResolutions {
        project_key: Some("fraud_model_2".to_string()),
        login_mapping: prepared.report.default_login_mapping.clone(),
    };
    let imported_id = ctx.commit_import(prepared, resolutions, "dana").await?;
    let imported = store.get_project(imported_id).await?;
    assert_eq!(imported.owner_login, "dana");
    assert!(
        imported.guest_logins.is_empty(),
        "guests collapsing onto the owner are dropped"
    );
    Ok(())
}

#[tokio::test]
async fn login_overrides_win_over_default_mapping() -> Result<()> {
    let root = tempfile::tempdir()?;
    let (store, ctx, bytes) = seeded_context(root.path(), &["dana", "erin"], "fraud_model").await?;

    let prepared = ctx.prepare_import(&bytes).await?;
    let mut login_mapping = prepared.report.default_login_mapping.clone();
    login_mapping.insert("bob".to_string(), "erin".to_string());
    login_mapping.insert("carol".to_string(), "erin".to_string());
    let resolutions = ImportResolutions {
        project_key: Some("fraud_model_2".to_string()),
        login_mapping,
    };

    let imported_id = ctx.commit_import(prepared, resolutions, "dana").await?;
    let imported = store.get_project(imported_id).await?;
    assert_eq!(imported.owner_login, "dana");
    assert_eq!(imported.guest_logins, vec!["erin".to_string()]);
    Ok(())
}

#[tokio::test]
async fn unmapped_logins_fall_back_to_requesting_user() -> Result<()> {
    let root = tempfile::tempdir()?;
    let (store, ctx, bytes) = seeded_context(root.path(), &["dana"], "fraud_model").await?;

    let prepared = ctx.prepare_import(&bytes).await?;
    let resolutions = ImportResolutions {
        project_key: Some("fraud_model_2".to_string()),
        login_mapping: IndexMap::new(),
    };
    let imported_id = ctx.commit_import(prepared, resolutions, "dana").await?;
    let imported = store.get_project(imported_id).await?;
    assert_eq!(imported.owner_login, "dana");
    Ok(())
}

#[tokio::test]
async fn mapping_onto_unknown_login_is_rejected() -> Result<()> {
    let root = tempfile::tempdir()?;
    let (_store, ctx, bytes) = seeded_context(root.path(), &["dana"], "fraud_model").await?;

    let prepared = ctx.prepare_import(&bytes).await?;
    let mut login_mapping = prepared.report.default_login_mapping.clone();
    login_mapping.insert("bob".to_string(), "nobody".to_string());
    let resolutions = ImportResolutions {
        project_key: Some("fraud_model_2".to_string()),
        login_mapping,
    };

    let err = ctx.commit_import(prepared, resolutions, "dana").await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn invalid_replacement_key_is_rejected() -> Result<()> {
    let root = tempfile::tempdir()?;
    let (_store, ctx, bytes) = seeded_context(root.path(), &["dana"], "fraud_model").await?;

    let prepared = ctx.prepare_import(&bytes).await?;
    let resolutions = ImportResolutions {
        project_key: Some("Fraud Model".to_string()),
        login_mapping: prepared.report.default_login_mapping.clone(),
    };
    let err = ctx.commit_import(prepared, resolutions, "dana").await.unwrap_err();
    assert_eq!(err.code(), "INVALID_KEY");
    Ok(())
}
