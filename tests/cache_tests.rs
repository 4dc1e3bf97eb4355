//! Integration tests for the persistent cache and cleanup.
//!
//! Tests cover:
//! - File-backed persistence
//! - Listing with filters
//! - Unmatched ledger replacement
//! - Garbage collection and its idempotence

use poster_renamer::core::cache::{PersistentCache, SqliteCache};
use poster_renamer::core::gc::{collect_garbage, CleanupSettings};
use poster_renamer::core::orchestrator::{UnmatchedReport, UnmatchedShow};
use poster_renamer::core::unmatched::{write_unmatched, UnmatchedLedger};
use poster_renamer::models::cache::{CacheField, CacheFilter, CacheRecord};
use poster_renamer::models::media::{Catalogue, Collection, MediaType, Movie, Season, Show};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ========== TEST FIXTURES ==========

fn record(path: &Path, hash: &str, media_type: MediaType, webhook_run: bool) -> CacheRecord {
    CacheRecord {
        file_path: path.to_path_buf(),
        file_name: path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        status: None,
        has_episodes: None,
        has_file: None,
        media_type,
        file_hash: format!("{}-out", hash),
        original_file_hash: hash.to_string(),
        source_path: PathBuf::from("/posters").join(path.file_name().unwrap_or_default()),
        border_replaced: false,
        border_setting: None,
        border_color: None,
        uploaded_to_libraries: Vec::new(),
        webhook_run,
        timestamp: "2026-10-14T00:00:00+00:00".to_string(),
    }
}

fn movie(title: &str) -> Movie {
    Movie {
        title: title.to_string(),
        status: "released".to_string(),
        ..Default::default()
    }
}

fn cleanup(root: &Path, asset_folders: bool) -> CleanupSettings {
    CleanupSettings {
        target_root: root.to_path_buf(),
        backup_root: None,
        asset_folders,
        clean_assets: true,
    }
}

// ========== PERSISTENCE TESTS ==========

#[test]
fn test_cache_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("db").join("database.db");
    let rec = record(Path::new("/assets/Inception (2010).jpg"), "h1", MediaType::Movies, false);

    {
        let cache = SqliteCache::open(&db).unwrap();
        cache.upsert(&rec).unwrap();
        cache
            .update_field(
                &rec.file_path,
                &CacheField::UploadedToLibraries(vec!["Movies".to_string()]),
            )
            .unwrap();
    }

    let reopened = SqliteCache::open(&db).unwrap();
    let stored = reopened.get(&rec.file_path).unwrap().unwrap();
    assert_eq!(stored.original_file_hash, "h1");
    assert_eq!(stored.uploaded_to_libraries, vec!["Movies"]);
    assert_eq!(reopened.row_count().unwrap(), 1);
}

#[test]
fn test_list_all_filters() {
    let cache = SqliteCache::in_memory().unwrap();
    cache
        .upsert(&record(Path::new("/assets/A (2001).jpg"), "a", MediaType::Movies, true))
        .unwrap();
    cache
        .upsert(&record(Path::new("/assets/B (2002).jpg"), "b", MediaType::Movies, false))
        .unwrap();
    cache
        .upsert(&record(Path::new("/assets/C - Season 01.jpg"), "c", MediaType::Shows, true))
        .unwrap();

    let all = cache.list_all(&CacheFilter::default()).unwrap();
    assert_eq!(all.len(), 3);

    let webhook = cache
        .list_all(&CacheFilter {
            webhook_run: Some(true),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(webhook.len(), 2);

    let webhook_movies = cache
        .list_all(&CacheFilter {
            webhook_run: Some(true),
            media_type: Some(MediaType::Movies),
        })
        .unwrap();
    let keys: Vec<&PathBuf> = webhook_movies.keys().collect();
    assert_eq!(keys, vec![&PathBuf::from("/assets/A (2001).jpg")]);
}

// ========== LEDGER TESTS ==========

#[test]
fn test_unmatched_ledger_is_replaced() {
    let dir = TempDir::new().unwrap();
    let cache = SqliteCache::open(&dir.path().join("database.db")).unwrap();
    let catalogue = Catalogue {
        movies: vec![movie("Heat (1995)"), movie("Alien (1979)")],
        shows: vec![Show {
            title: "Lost (2004)".to_string(),
            seasons: vec![Season::numbered(1, true), Season::numbered(2, true)],
            ..Default::default()
        }],
        collections: vec![Collection {
            title: "Marvel Collection".to_string(),
            library: None,
        }],
    };

    let first = UnmatchedReport {
        movies: vec![movie("Heat (1995)"), movie("Alien (1979)")],
        collections: catalogue.collections.clone(),
        shows: vec![UnmatchedShow {
            title: "Lost (2004)".to_string(),
            missing_poster: true,
            missing_seasons: vec!["season02".to_string()],
        }],
    };
    let totals = write_unmatched(&cache, &catalogue, &first).unwrap();
    assert_eq!(totals.unmatched_movies, 2);
    assert_eq!(totals.total_seasons, 2);
    assert_eq!(totals.unmatched_seasons, 1);

    let second = UnmatchedReport {
        movies: vec![movie("Heat (1995)")],
        ..Default::default()
    };
    write_unmatched(&cache, &catalogue, &second).unwrap();

    assert_eq!(cache.unmatched_titles(MediaType::Movies).unwrap(), vec!["Heat (1995)"]);
    assert!(cache.unmatched_titles(MediaType::Shows).unwrap().is_empty());
    assert!(cache.unmatched_titles(MediaType::Collections).unwrap().is_empty());
    let stored = cache.unmatched_totals().unwrap().unwrap();
    assert_eq!(stored.unmatched_movies, 1);
    assert_eq!(stored.unmatched_series, 0);
}

// ========== CLEANUP TESTS ==========

#[test]
fn test_gc_removes_orphans_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("assets");
    fs::create_dir_all(&root).unwrap();

    let kept = root.join("Inception (2010).jpg");
    let orphan = root.join("Old Movie (1999).jpg");
    let vanished = root.join("Vanished (2003).jpg");
    fs::write(&kept, b"kept").unwrap();
    fs::write(&orphan, b"orphan").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    cache.upsert(&record(&kept, "k", MediaType::Movies, false)).unwrap();
    cache.upsert(&record(&orphan, "o", MediaType::Movies, false)).unwrap();
    cache.upsert(&record(&vanished, "v", MediaType::Movies, false)).unwrap();
    cache
        .upsert(&record(Path::new("/elsewhere/Inception (2010).jpg"), "e", MediaType::Movies, false))
        .unwrap();

    let catalogue = Catalogue {
        movies: vec![movie("Inception (2010)"), movie("Vanished (2003)")],
        ..Default::default()
    };

    let first = collect_garbage(&cache, &catalogue, &cleanup(&root, false)).unwrap();
    assert_eq!(first.removed_assets, 1);
    assert_eq!(first.removed_records, 3);
    assert!(kept.exists());
    assert!(!orphan.exists());

    let remaining = cache.list_all(&CacheFilter::default()).unwrap();
    assert_eq!(remaining.keys().collect::<Vec<_>>(), vec![&kept]);

    let second = collect_garbage(&cache, &catalogue, &cleanup(&root, false)).unwrap();
    assert!(second.is_noop());
}

#[test]
fn test_gc_folder_layout_removes_empty_dirs() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("assets");
    let kept_dir = root.join("Lost (2004)");
    let gone_dir = root.join("Gone (2000)");
    fs::create_dir_all(&kept_dir).unwrap();
    fs::create_dir_all(&gone_dir).unwrap();
    fs::write(kept_dir.join("poster.jpg"), b"lost").unwrap();
    fs::write(kept_dir.join("Season01.jpg"), b"lost-s1").unwrap();
    fs::write(gone_dir.join("poster.jpg"), b"gone").unwrap();
    fs::write(root.join("loose.jpg"), b"loose").unwrap();

    let catalogue = Catalogue {
        shows: vec![Show {
            title: "Lost (2004)".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let cache = SqliteCache::in_memory().unwrap();

    let first = collect_garbage(&cache, &catalogue, &cleanup(&root, true)).unwrap();
    assert_eq!(first.removed_assets, 2);
    assert_eq!(first.removed_dirs, 1);
    assert!(kept_dir.join("Season01.jpg").exists());
    assert!(!gone_dir.exists());

    let second = collect_garbage(&cache, &catalogue, &cleanup(&root, true)).unwrap();
    assert!(second.is_noop());
}

#[test]
fn test_gc_keeps_assets_when_cleaning_disabled() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("assets");
    fs::create_dir_all(&root).unwrap();
    let orphan = root.join("Old Movie (1999).jpg");
    fs::write(&orphan, b"orphan").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let settings = CleanupSettings {
        clean_assets: false,
        ..cleanup(&root, false)
    };
    let summary = collect_garbage(&cache, &Catalogue::default(), &settings).unwrap();

    assert!(summary.is_noop());
    assert!(orphan.exists());
}
