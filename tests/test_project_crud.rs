//! Integration tests for project CRUD against the local backend.
//!
//! Tests cover:
//! - Adding projects (append order, unique ids, concurrent adds)
//! - Partial updates with merge semantics
//! - Deleting user-created projects
//! - Authentication and not-found failures leaving the list untouched
//! - Persistence across a reopen of the local database

mod common;

use std::collections::HashSet;

use common::*;

#[tokio::test]
async fn test_add_appends_last() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;
    let before = store.list().projects.len();

    let first = store.add(Some(&admin()), make_draft("First")).await?;
    let second = store.add(Some(&admin()), make_draft("Second")).await?;

    let projects = store.list().projects;
    assert_eq!(projects.len(), before + 2);
    assert_eq!(projects[projects.len() - 2], first);
    assert_eq!(projects[projects.len() - 1], second);
    assert_eq!(second.title, "Second");
    assert_eq!(second.tech_stack, vec!["Rust", "SQLite"]);

    Ok(())
}

#[tokio::test]
async fn test_local_ids_are_unique_timestamps() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;

    let mut ids = Vec::new();
    for n in 0..5 {
        ids.push(store.add(Some(&admin()), make_draft(&format!("P{n}"))).await?.id);
    }

    let numeric: Vec<i64> = ids.iter().map(|id| id.parse::<i64>()).collect::<Result<_, _>>()?;
    assert!(numeric.windows(2).all(|w| w[0] < w[1]), "ids not increasing: {ids:?}");
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());

    Ok(())
}

#[tokio::test]
async fn test_concurrent_adds_both_land() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;
    let identity = admin();

    let (a, b) = tokio::join!(
        store.add(Some(&identity), make_draft("A")),
        store.add(Some(&identity), make_draft("B")),
    );
    let (a, b) = (a?, b?);
    assert_ne!(a.id, b.id);

    let listed = ids(&store.list());
    assert!(listed.contains(&a.id));
    assert!(listed.contains(&b.id));

    store.refresh().await;
    assert_eq!(store.list().projects.len(), seed_projects().len() + 2);

    Ok(())
}

#[tokio::test]
async fn test_update_merges_fields() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;
    let original = store.add(Some(&admin()), make_draft("Before")).await?;

    let update = ProjectUpdate {
        title: Some("After".to_string()),
        ..Default::default()
    };
    store.update(Some(&admin()), &original.id, update).await?;

    let updated = store
        .list()
        .projects
        .into_iter()
        .find(|p| p.id == original.id)
        .expect("updated project should be listed");
    assert_eq!(updated.title, "After");
    assert_eq!(updated.description, original.description);
    assert_eq!(updated.image, original.image);
    assert_eq!(updated.tech_stack, original.tech_stack);
    assert_eq!(updated.live_url, original.live_url);
    assert_eq!(updated.github_url, original.github_url);

    // The merge was persisted, not just cached
    store.refresh().await;
    let reloaded = store
        .list()
        .projects
        .into_iter()
        .find(|p| p.id == original.id)
        .expect("project should survive refresh");
    assert_eq!(reloaded, updated);

    Ok(())
}

#[tokio::test]
async fn test_update_replaces_tech_stack_in_order() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;
    let project = store.add(Some(&admin()), make_draft("Stack")).await?;

    let update = ProjectUpdate {
        tech_stack: Some(vec!["Tokio".into(), "Axum".into(), "Tokio".into()]),
        ..Default::default()
    };
    store.update(Some(&admin()), &project.id, update).await?;
    store.refresh().await;

    let reloaded = store.list().projects.into_iter().find(|p| p.id == project.id).unwrap();
    assert_eq!(reloaded.tech_stack, vec!["Tokio", "Axum", "Tokio"]);
    assert_eq!(reloaded.title, "Stack");

    Ok(())
}

#[tokio::test]
async fn test_delete_user_project() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;
    let keep = store.add(Some(&admin()), make_draft("Keep")).await?;
    let doomed = store.add(Some(&admin()), make_draft("Doomed")).await?;

    store.delete(Some(&admin()), &doomed.id).await?;
    assert!(!ids(&store.list()).contains(&doomed.id));

    store.refresh().await;
    let listed = ids(&store.list());
    assert!(!listed.contains(&doomed.id));
    assert!(listed.contains(&keep.id));

    Ok(())
}

#[tokio::test]
async fn test_mutations_require_identity() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;
    let existing = store.add(Some(&admin()), make_draft("Existing")).await?;
    let before = store.list();

    let add = store.add(None, make_draft("Sneaky")).await;
    assert!(matches!(add, Err(StoreError::Auth(_))), "got {add:?}");

    let update = ProjectUpdate {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let result = store.update(None, &existing.id, update.clone()).await;
    assert!(matches!(result, Err(StoreError::Auth(_))));
    let result = store.update(None, "default-1", update).await;
    assert!(matches!(result, Err(StoreError::Auth(_))));

    let result = store.delete(None, &existing.id).await;
    assert!(matches!(result, Err(StoreError::Auth(_))));
    let result = store.delete(None, "default-1").await;
    assert!(matches!(result, Err(StoreError::Auth(_))));

    assert_eq!(store.list(), before);

    // Nothing reached storage either
    store.refresh().await;
    assert_eq!(store.list(), before);

    Ok(())
}

#[tokio::test]
async fn test_unknown_id_is_not_found() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_local_store().await;
    store.refresh().await;
    let before = store.list();

    let update = ProjectUpdate {
        title: Some("Ghost".to_string()),
        ..Default::default()
    };
    let result = store.update(Some(&admin()), "1700000000000", update).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    let result = store.delete(Some(&admin()), "1700000000000").await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    let result = store.delete(Some(&admin()), "default-99").await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    assert_eq!(store.list(), before);

    Ok(())
}

#[tokio::test]
async fn test_projects_persist_after_reopen() -> anyhow::Result<()> {
    let temp_dir = tempfile::TempDir::new()?;

    // 1. Create store and add a project
    let added = {
        let store = open_local_store(temp_dir.path()).await;
        store.refresh().await;
        let added = store.add(Some(&admin()), make_draft("Persistent")).await?;
        store.backend().device().close().await?;
        added
    };

    // 2. Reopen from the same directory
    let store = open_local_store(temp_dir.path()).await;
    store.refresh().await;
    let projects = store.list().projects;
    assert_eq!(projects.len(), seed_projects().len() + 1);
    assert_eq!(projects.last(), Some(&added));

    // 3. New ids keep increasing past the persisted ones
    let next = store.add(Some(&admin()), make_draft("Next")).await?;
    assert!(next.id.parse::<i64>()? > added.id.parse::<i64>()?);

    Ok(())
}
