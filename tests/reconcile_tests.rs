//! Integration tests for the override-aware write paths.

mod common;

use common::{harness, harness_with};
use curatarr::domain::{CatalogError, EntryId, EntryKind, FieldGroup};
use curatarr::models::entry::{EntryContent, EntryMetadata};
use curatarr::models::episode::EpisodeInput;
use curatarr::services::{RefreshPolicy, SaveRequest};
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

fn curated(title: &str) -> EntryMetadata {
    EntryMetadata {
        title: title.to_string(),
        overview: Some("Written by hand".to_string()),
        ..EntryMetadata::default()
    }
}

#[tokio::test]
async fn test_admin_metadata_survives_batch_sync() {
    let h = harness();
    h.provider.add_movie(550, "Fight Club");
    let id = EntryId::from(550);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    let saved = h
        .catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Movie,
            SaveRequest {
                metadata: Some(curated("Fight Club (Director's Cut)")),
                content: Some(EntryContent::Movie {
                    watch_link: Some("https://watch/550".to_string()),
                    download_link: None,
                }),
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();
    assert!(saved.backfill.is_none());
    let stamped = saved.entry.media_updated_at.clone();

    h.provider.retitle(550, "Fight Club (Upstream)");
    let report = h.catalog.sync_all(&mut |_| {}, &cancel).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let stored = h.store.entry(550).unwrap();
    assert_eq!(stored.metadata.title, "Fight Club (Director's Cut)");
    assert_eq!(stored.media_updated_at, stamped);
    assert_eq!(
        stored.content,
        EntryContent::Movie {
            watch_link: Some("https://watch/550".to_string()),
            download_link: None,
        }
    );
}

#[tokio::test]
async fn test_automatic_refresh_updates_unowned_entries() {
    let h = harness();
    h.provider.add_series(1399, "Game of Thrones", &[1, 2], 2);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: Some(curated("GoT")),
                content: None,
                admin_edited: false,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();

    h.catalog.sync_all(&mut |_| {}, &cancel).await.unwrap();

    let stored = h.store.entry(1399).unwrap();
    assert_eq!(stored.metadata.title, "Game of Thrones");
    assert!(!stored.admin_edited());
    let EntryContent::Series { seasons } = &stored.content else {
        panic!("expected series content");
    };
    assert_eq!(seasons.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn test_owned_metadata_still_gets_new_season_slots() {
    let h = harness();
    h.provider.add_series(1399, "Game of Thrones", &[1, 2, 3], 1);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: Some(curated("Thrones")),
                content: None,
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();

    h.catalog.sync_all(&mut |_| {}, &cancel).await.unwrap();

    let stored = h.store.entry(1399).unwrap();
    assert!(stored.overrides.contains(FieldGroup::Metadata));
    assert!(!stored.overrides.contains(FieldGroup::Links));
    assert_eq!(stored.metadata.title, "Thrones");
    let EntryContent::Series { seasons } = &stored.content else {
        panic!("expected series content");
    };
    assert_eq!(seasons.len(), 3);
}

#[tokio::test]
async fn test_admin_episode_survives_season_sync() {
    let h = harness();
    h.provider.add_series(1399, "Game of Thrones", &[1], 3);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    let saved = h
        .catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: Some(curated("Game of Thrones")),
                content: None,
                admin_edited: false,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(saved.backfill.unwrap().succeeded, 1);
    assert_eq!(h.store.episodes(1399).len(), 3);

    let episode = h
        .catalog
        .save_episode(
            &id,
            1,
            EpisodeInput {
                episode_number: 2,
                name: Some("The Kingsroad (curated)".to_string()),
                ..EpisodeInput::default()
            },
            true,
        )
        .await
        .unwrap();
    assert!(episode.admin_edited);

    let report = h.catalog.sync_series(&id, &cancel).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let kept = h.store.episode(1399, 1, 2).unwrap();
    assert_eq!(kept.name.as_deref(), Some("The Kingsroad (curated)"));
    assert!(kept.admin_edited);

    let synced = h.store.episode(1399, 1, 1).unwrap();
    assert_eq!(synced.name.as_deref(), Some("Upstream S1E1"));
    assert!(!synced.admin_edited);
}

#[tokio::test]
async fn test_entry_flag_does_not_protect_episodes() {
    let h = harness();
    h.provider.add_series(1399, "Game of Thrones", &[1], 2);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    let saved = h
        .catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: Some(curated("Thrones")),
                content: None,
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();
    assert!(saved.backfill.is_none());
    assert!(h.store.episodes(1399).is_empty());

    h.catalog.sync_series(&id, &cancel).await.unwrap();
    assert_eq!(h.store.episodes(1399).len(), 2);
}

#[tokio::test]
async fn test_refresh_always_refetches_and_never_writes() {
    let h = harness();
    h.provider.add_movie(550, "Fight Club");
    let id = EntryId::from(550);
    let session = h.catalog.new_session();

    h.catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::default())
        .await
        .unwrap();
    h.provider.retitle(550, "Fight Club (Remastered)");
    let second = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::default())
        .await
        .unwrap();

    assert_eq!(h.provider.details_calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.metadata.title, "Fight Club (Remastered)");
    assert!(h.store.entry(550).is_none());
    assert_eq!(session.draft(&id).unwrap(), second);
}

#[tokio::test]
async fn test_refresh_respects_policy() {
    let h = harness();
    h.provider.add_movie(550, "Fight Club");
    let id = EntryId::from(550);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Movie,
            SaveRequest {
                metadata: Some(curated("Curated Club")),
                content: None,
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();

    let preserved = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::PreserveOverrides)
        .await
        .unwrap();
    assert_eq!(preserved.metadata.title, "Fight Club");
    assert!(preserved.admin_edited);

    session.clear();
    let overwritten = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::OverwriteAll)
        .await
        .unwrap();
    assert_eq!(overwritten.metadata.title, "Fight Club");
    assert!(!overwritten.admin_edited);

    // Staging alone changes nothing in the store.
    assert_eq!(h.store.entry(550).unwrap().metadata.title, "Curated Club");
}

#[tokio::test]
async fn test_refresh_of_admin_entry_tracks_upstream() {
    let h = harness();
    h.provider.add_movie(550, "Fight Club");
    let id = EntryId::from(550);
    let session = h.catalog.new_session();

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Movie,
            SaveRequest {
                metadata: Some(curated("Curated")),
                content: None,
                admin_edited: true,
                links_admin_edited: None,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let first = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::default())
        .await
        .unwrap();
    h.provider.retitle(550, "Fight Club (Remastered)");
    let second = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::default())
        .await
        .unwrap();

    assert_eq!(first.metadata.title, "Fight Club");
    assert_eq!(second.metadata.title, "Fight Club (Remastered)");
    assert_ne!(first.metadata, second.metadata);
    assert!(second.admin_edited);
    assert_eq!(h.store.entry(550).unwrap().metadata.title, "Curated");
}

#[tokio::test]
async fn test_saved_draft_keeps_links_ownership() {
    let h = harness();
    h.provider.add_series(1399, "Game of Thrones", &[1], 1);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: None,
                content: Some(EntryContent::empty(EntryKind::Series)),
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();
    let stored = h.store.entry(1399).unwrap();
    assert!(stored.overrides.contains(FieldGroup::Links));
    assert!(!stored.overrides.contains(FieldGroup::Metadata));

    let draft = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Series, RefreshPolicy::default())
        .await
        .unwrap();
    assert!(!draft.admin_edited);
    assert!(draft.links_admin_edited);

    h.catalog.save_draft(&session, &id, &cancel).await.unwrap();

    let saved = h.store.entry(1399).unwrap();
    assert_eq!(saved.metadata.title, "Game of Thrones");
    assert!(saved.overrides.contains(FieldGroup::Links));
    assert!(!saved.overrides.contains(FieldGroup::Metadata));
}

#[tokio::test]
async fn test_save_backfill_leaves_admin_episode_untouched() {
    let h = harness();
    h.provider.add_series(1399, "Game of Thrones", &[1], 3);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: Some(curated("Thrones")),
                content: None,
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();
    h.catalog
        .save_episode(
            &id,
            1,
            EpisodeInput {
                episode_number: 2,
                name: Some("The Kingsroad (curated)".to_string()),
                overview: Some("Hand-written".to_string()),
                runtime: Some(56),
                ..EpisodeInput::default()
            },
            true,
        )
        .await
        .unwrap();
    let before = h.store.episode(1399, 1, 2).unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let saved = h
        .catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: Some(curated("Game of Thrones")),
                content: None,
                admin_edited: false,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(saved.backfill.unwrap().succeeded, 1);
    assert_eq!(h.store.episode(1399, 1, 2).unwrap(), before);
    let upstream = h.store.episode(1399, 1, 1).unwrap();
    assert_eq!(upstream.name.as_deref(), Some("Upstream S1E1"));
    assert_eq!(h.store.episode(1399, 1, 3).unwrap().name.as_deref(), Some("Upstream S1E3"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_draft() {
    let h = harness();
    h.provider.add_movie(550, "Fight Club");
    let id = EntryId::from(550);
    let session = h.catalog.new_session();

    let first = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::default())
        .await
        .unwrap();

    h.provider.offline.store(true, Ordering::SeqCst);
    let err = h
        .catalog
        .refresh_entry(&session, &id, EntryKind::Movie, RefreshPolicy::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::ProviderUnavailable(_)));
    assert!(err.is_transient());
    assert_eq!(session.draft(&id).unwrap(), first);
}

#[tokio::test]
async fn test_save_draft_persists_and_invalidates() {
    let mut h = harness();
    h.provider.add_series(1399, "Game of Thrones", &[1, 2], 1);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    h.catalog
        .refresh_entry(&session, &id, EntryKind::Series, RefreshPolicy::default())
        .await
        .unwrap();
    let saved = h.catalog.save_draft(&session, &id, &cancel).await.unwrap();

    assert!(session.draft(&id).is_none());
    assert_eq!(saved.entry.metadata.title, "Game of Thrones");
    assert_eq!(saved.backfill.unwrap().succeeded, 2);

    let events = common::drain(&mut h.events);
    assert!(events.iter().any(|e| matches!(
        e,
        curatarr::domain::events::CatalogEvent::EntrySaved { entry_id, admin_edited: false }
            if entry_id == "1399"
    )));

    let err = h.catalog.save_draft(&session, &id, &cancel).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[tokio::test]
async fn test_save_rejects_kind_mismatch() {
    let h = harness();
    let id = EntryId::from(550);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    let err = h
        .catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Movie,
            SaveRequest {
                metadata: None,
                content: Some(EntryContent::empty(EntryKind::Series)),
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput(_)));

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Movie,
            SaveRequest {
                metadata: Some(curated("Fight Club")),
                content: None,
                admin_edited: true,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();

    let err = h
        .catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest::default(),
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput(_)));
}

#[tokio::test]
async fn test_save_failure_reports_store_write() {
    let h = harness();
    h.store.fail_writes.store(true, Ordering::SeqCst);
    let session = h.catalog.new_session();

    let err = h
        .catalog
        .save_entry(
            &session,
            &EntryId::from(550),
            EntryKind::Movie,
            SaveRequest {
                metadata: Some(curated("Fight Club")),
                content: None,
                admin_edited: true,
                links_admin_edited: None,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::StoreWriteFailed(_)));
    assert!(h.store.entry(550).is_none());
}

#[tokio::test]
async fn test_resolve_prefers_series_with_seasons() {
    let h = harness();
    h.provider.add_movie(93405, "Some Movie");
    h.provider.add_series(93405, "Squid Game", &[1, 2, 3], 1);

    let resolved = h.catalog.resolve_candidate("93405").await.unwrap();
    assert_eq!(resolved.kind, EntryKind::Series);
    assert_eq!(resolved.season_count, Some(3));
    assert_eq!(resolved.details.title, "Squid Game");
    assert!(resolved.movie.is_some());
}

#[tokio::test]
async fn test_resolve_falls_back_to_movie() {
    let h = harness();
    h.provider.add_movie(550, "Fight Club");

    let resolved = h.catalog.resolve_candidate("550").await.unwrap();
    assert_eq!(resolved.kind, EntryKind::Movie);
    assert_eq!(resolved.season_count, None);
    assert!(resolved.series.is_none());

    h.provider.add_movie(777, "Pilot Movie");
    h.provider.add_series(777, "Unaired Show", &[], 0);
    let resolved = h.catalog.resolve_candidate("777").await.unwrap();
    assert_eq!(resolved.kind, EntryKind::Movie);

    h.provider.add_series(888, "Only Specials", &[0], 1);
    let resolved = h.catalog.resolve_candidate("888").await.unwrap();
    assert_eq!(resolved.kind, EntryKind::Series);
    assert_eq!(resolved.season_count, Some(0));
}

#[tokio::test]
async fn test_resolve_errors() {
    let h = harness();

    let err = h.catalog.resolve_candidate("tt0137523").await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidIdentifier(_)));
    assert_eq!(h.provider.details_calls.load(Ordering::SeqCst), 0);

    let err = h.catalog.resolve_candidate("404").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
    assert!(!err.is_transient());

    h.provider.offline.store(true, Ordering::SeqCst);
    let err = h.catalog.resolve_candidate("404").await.unwrap_err();
    assert!(matches!(err, CatalogError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_episode_operations() {
    let h = harness_with(|_| {});
    h.provider.add_series(1399, "Game of Thrones", &[1, 2], 2);
    let id = EntryId::from(1399);
    let session = h.catalog.new_session();
    let cancel = CancellationToken::new();

    let err = h
        .catalog
        .save_episode(&id, 1, EpisodeInput::default(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));

    h.catalog
        .save_entry(
            &session,
            &id,
            EntryKind::Series,
            SaveRequest {
                metadata: Some(curated("Game of Thrones")),
                content: None,
                admin_edited: false,
                links_admin_edited: None,
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(h.store.episodes(1399).len(), 4);

    let staged = h.catalog.refresh_episode(&id, 2, 1).await.unwrap();
    assert_eq!(staged.name.as_deref(), Some("Upstream S2E1"));
    assert!(!staged.admin_edited);

    let err = h.catalog.refresh_episode(&id, 2, 9).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));

    assert!(h.catalog.delete_episode(&id, 1, 1).await.unwrap());
    assert!(!h.catalog.delete_episode(&id, 1, 1).await.unwrap());
    assert_eq!(h.catalog.delete_season(&id, 2).await.unwrap(), 2);
    assert_eq!(h.store.episodes(1399).len(), 1);
}
