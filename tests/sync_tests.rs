//! Integration tests for poster synchronization.
//!
//! Tests cover:
//! - Idempotent re-sync
//! - Content changes and backups
//! - Border transforms and their reversal
//! - Per-entity folder layout and switching to it
//! - Identical content under two targets

use image::{GenericImageView, Rgb, RgbImage};
use poster_renamer::core::border::{BorderColor, BorderMode, CANVAS_HEIGHT, CANVAS_WIDTH};
use poster_renamer::core::cache::{PersistentCache, SqliteCache};
use poster_renamer::core::matcher::{Match, MatchReason, PosterSlot};
use poster_renamer::core::progress::{NoProgress, ProgressTracker};
use poster_renamer::core::sync::{SyncOutcome, SyncPipeline, SyncSettings};
use poster_renamer::models::media::MediaType;
use poster_renamer::models::poster::PosterFile;
use poster_renamer::utils::hash::sha256_file;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ========== TEST FIXTURES ==========

fn settings(dir: &TempDir) -> SyncSettings {
    SyncSettings {
        target_root: dir.path().join("assets"),
        backup_root: Some(dir.path().join("backup")),
        asset_folders: false,
        border: None,
        webhook_run: false,
    }
}

fn source_dir(dir: &TempDir) -> PathBuf {
    let sources = dir.path().join("sources");
    fs::create_dir_all(&sources).unwrap();
    sources
}

fn movie_match(source: &Path, title: &str) -> Match {
    Match {
        media_type: MediaType::Movies,
        title: title.to_string(),
        slot: PosterSlot::Poster,
        reason: MatchReason::Title,
        poster: PosterFile::from_path(source),
        status: Some("released".to_string()),
        has_episodes: None,
        has_file: Some(true),
        webhook_run: false,
    }
}

fn season_match(source: &Path, title: &str, season: u32) -> Match {
    Match {
        media_type: MediaType::Shows,
        slot: PosterSlot::Season(season),
        has_episodes: Some(true),
        has_file: None,
        ..movie_match(source, title)
    }
}

fn write_png(path: &Path, color: [u8; 3]) {
    RgbImage::from_pixel(100, 150, Rgb(color)).save(path).unwrap();
}

// ========== IDEMPOTENCE TESTS ==========

#[test]
fn test_second_sync_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let sources = source_dir(&dir);
    let inception = sources.join("Inception (2010).jpg");
    let office = sources.join("The Office (2005) - Season 02.jpg");
    fs::write(&inception, b"inception-art").unwrap();
    fs::write(&office, b"office-art").unwrap();

    let matches = vec![
        movie_match(&inception, "Inception (2010)"),
        season_match(&office, "The Office (2005)", 2),
    ];
    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(&cache, settings(&dir));
    let sink = NoProgress;

    let mut progress = ProgressTracker::new(&sink, "sync_0001");
    let first = pipeline.sync_all(&matches, &mut progress);
    assert_eq!(first.written, 2);
    assert_eq!(first.failed, 0);

    let target = dir.path().join("assets").join("Inception (2010).jpg");
    let before = cache.get(&target).unwrap().unwrap();

    let mut progress = ProgressTracker::new(&sink, "sync_0002");
    let second = pipeline.sync_all(&matches, &mut progress);
    assert_eq!(second.written, 0);
    assert_eq!(second.skipped, 2);
    assert!(second.synced.is_empty());

    let after = cache.get(&target).unwrap().unwrap();
    assert_eq!(before.timestamp, after.timestamp);
    assert!(dir
        .path()
        .join("assets")
        .join("The Office (2005) - Season 02.jpg")
        .exists());
}

#[test]
fn test_changed_source_is_rewritten_and_backed_up() {
    let dir = TempDir::new().unwrap();
    let source = source_dir(&dir).join("Inception (2010).jpg");
    fs::write(&source, b"poster-v1").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(&cache, settings(&dir));
    let m = movie_match(&source, "Inception (2010)");
    pipeline.sync_one(&m).unwrap();

    fs::write(&source, b"poster-v2").unwrap();
    assert_eq!(pipeline.sync_one(&m).unwrap(), SyncOutcome::Written { first_write: false });

    let target = dir.path().join("assets").join("Inception (2010).jpg");
    let backup = dir.path().join("backup").join("Inception (2010).jpg");
    assert_eq!(fs::read(&target).unwrap(), b"poster-v2");
    assert_eq!(fs::read(&backup).unwrap(), b"poster-v2");

    let record = cache.get(&target).unwrap().unwrap();
    assert_eq!(record.original_file_hash, sha256_file(&source).unwrap());
}

#[test]
fn test_touching_source_without_changes_is_skipped() {
    let dir = TempDir::new().unwrap();
    let source = source_dir(&dir).join("Inception (2010).jpg");
    fs::write(&source, b"poster-v1").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(&cache, settings(&dir));
    let m = movie_match(&source, "Inception (2010)");
    pipeline.sync_one(&m).unwrap();

    // Same bytes, new modification time.
    fs::write(&source, b"poster-v1").unwrap();
    assert_eq!(pipeline.sync_one(&m).unwrap(), SyncOutcome::Skipped { flag_updated: false });
}

#[test]
fn test_deleted_target_is_restored() {
    let dir = TempDir::new().unwrap();
    let source = source_dir(&dir).join("Inception (2010).jpg");
    fs::write(&source, b"poster-v1").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(&cache, settings(&dir));
    let m = movie_match(&source, "Inception (2010)");
    pipeline.sync_one(&m).unwrap();

    let target = dir.path().join("assets").join("Inception (2010).jpg");
    fs::remove_file(&target).unwrap();

    assert_eq!(pipeline.sync_one(&m).unwrap(), SyncOutcome::Written { first_write: false });
    assert_eq!(fs::read(&target).unwrap(), b"poster-v1");
}

#[test]
fn test_status_change_is_reconciled() {
    let dir = TempDir::new().unwrap();
    let source = source_dir(&dir).join("Inception (2010).jpg");
    fs::write(&source, b"poster-v1").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(&cache, settings(&dir));
    let announced = Match {
        status: Some("announced".to_string()),
        has_file: Some(false),
        ..movie_match(&source, "Inception (2010)")
    };
    pipeline.sync_one(&announced).unwrap();

    fs::write(&source, b"poster-v2").unwrap();
    pipeline
        .sync_one(&movie_match(&source, "Inception (2010)"))
        .unwrap();

    let target = dir.path().join("assets").join("Inception (2010).jpg");
    let record = cache.get(&target).unwrap().unwrap();
    assert_eq!(record.status.as_deref(), Some("released"));
    assert_eq!(record.has_file, Some(true));
}

// ========== LAYOUT TESTS ==========

#[test]
fn test_folder_layout() {
    let dir = TempDir::new().unwrap();
    let sources = source_dir(&dir);
    let inception = sources.join("Inception (2010).jpg");
    let office = sources.join("The Office (2005) - Season 02.jpg");
    fs::write(&inception, b"inception-art").unwrap();
    fs::write(&office, b"office-art").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(
        &cache,
        SyncSettings {
            asset_folders: true,
            ..settings(&dir)
        },
    );
    pipeline.sync_one(&movie_match(&inception, "Inception (2010)")).unwrap();
    pipeline
        .sync_one(&season_match(&office, "The Office (2005)", 2))
        .unwrap();

    let assets = dir.path().join("assets");
    let poster = assets.join("Inception (2010)").join("poster.jpg");
    assert!(poster.exists());
    assert!(assets.join("The Office (2005)").join("Season02.jpg").exists());
    assert_eq!(cache.get(&poster).unwrap().unwrap().media_type, MediaType::Movies);
}

#[test]
fn test_switching_to_folder_layout_moves_record() {
    let dir = TempDir::new().unwrap();
    let source = source_dir(&dir).join("Inception (2010).jpg");
    fs::write(&source, b"inception-art").unwrap();
    let m = movie_match(&source, "Inception (2010)");
    let cache = SqliteCache::in_memory().unwrap();

    let flat = SyncPipeline::new(&cache, settings(&dir));
    flat.sync_one(&m).unwrap();

    let folders = SyncPipeline::new(
        &cache,
        SyncSettings {
            asset_folders: true,
            ..settings(&dir)
        },
    );
    assert_eq!(folders.sync_one(&m).unwrap(), SyncOutcome::Written { first_write: true });

    let assets = dir.path().join("assets");
    let poster = assets.join("Inception (2010)").join("poster.jpg");
    assert_eq!(fs::read(&poster).unwrap(), b"inception-art");
    assert!(cache.get(&poster).unwrap().is_some());
    assert!(cache.get(&assets.join("Inception (2010).jpg")).unwrap().is_none());
    assert_eq!(cache.row_count().unwrap(), 1);

    assert_eq!(folders.sync_one(&m).unwrap(), SyncOutcome::Skipped { flag_updated: false });
}

// ========== DUPLICATE CONTENT TESTS ==========

#[test]
fn test_identical_content_for_another_title_is_rejected() {
    let dir = TempDir::new().unwrap();
    let sources = source_dir(&dir);
    let alien = sources.join("Alien (1979).jpg");
    let aliens = sources.join("Aliens (1986).jpg");
    fs::write(&alien, b"same-art").unwrap();
    fs::write(&aliens, b"same-art").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(&cache, settings(&dir));
    let assets = dir.path().join("assets");
    let alien_target = assets.join("Alien (1979).jpg");
    let aliens_target = assets.join("Aliens (1986).jpg");

    pipeline.sync_one(&movie_match(&alien, "Alien (1979)")).unwrap();
    let owner = cache.get(&alien_target).unwrap().unwrap();

    let second = movie_match(&aliens, "Aliens (1986)");
    for _ in 0..2 {
        let err = pipeline.sync_one(&second).unwrap_err();
        assert!(matches!(err, poster_renamer::Error::DuplicateContent { .. }));
        assert!(!aliens_target.exists());
        assert!(!dir.path().join("backup").join("Aliens (1986).jpg").exists());
    }

    let after = cache.get(&alien_target).unwrap().unwrap();
    assert_eq!(after.source_path, owner.source_path);
    assert_eq!(after.timestamp, owner.timestamp);
    assert_eq!(cache.row_count().unwrap(), 1);

    let sink = NoProgress;
    let mut progress = ProgressTracker::new(&sink, "sync_0001");
    let summary = pipeline.sync_all(
        &[movie_match(&alien, "Alien (1979)"), second.clone()],
        &mut progress,
    );
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].0, aliens);

    // Once the owning asset is gone its record no longer blocks the copy.
    fs::remove_file(&alien_target).unwrap();
    assert_eq!(pipeline.sync_one(&second).unwrap(), SyncOutcome::Written { first_write: true });
    assert!(aliens_target.exists());
    assert!(cache.get(&alien_target).unwrap().is_none());
}

// ========== BORDER TESTS ==========

#[test]
fn test_border_remove_then_paint_then_disable() {
    let dir = TempDir::new().unwrap();
    let source = source_dir(&dir).join("Inception (2010).png");
    write_png(&source, [200, 200, 200]);
    let original_hash = sha256_file(&source).unwrap();
    let target = dir.path().join("assets").join("Inception (2010).png");
    let m = movie_match(&source, "Inception (2010)");
    let cache = SqliteCache::in_memory().unwrap();

    // Remove: bordered output on the fixed canvas.
    let remove = SyncPipeline::new(
        &cache,
        SyncSettings {
            border: Some(BorderMode::Remove),
            ..settings(&dir)
        },
    );
    assert_eq!(remove.sync_one(&m).unwrap(), SyncOutcome::Written { first_write: true });

    let record = cache.get(&target).unwrap().unwrap();
    assert!(record.border_replaced);
    assert_eq!(record.border_setting.as_deref(), Some("remove"));
    assert_eq!(record.border_color, None);
    assert_eq!(record.original_file_hash, original_hash);
    assert_ne!(record.file_hash, original_hash);
    assert_eq!(image::open(&target).unwrap().dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    assert!(!dir.path().join("assets").join("temp_Inception (2010).png").exists());

    // The backup keeps the untouched source.
    let backup = dir.path().join("backup").join("Inception (2010).png");
    assert_eq!(sha256_file(&backup).unwrap(), original_hash);

    assert_eq!(remove.sync_one(&m).unwrap(), SyncOutcome::Skipped { flag_updated: false });

    // Paint: a different border setting forces a rewrite.
    let paint = SyncPipeline::new(
        &cache,
        SyncSettings {
            border: Some(BorderMode::Paint(BorderColor([255, 0, 0]))),
            ..settings(&dir)
        },
    );
    assert_eq!(paint.sync_one(&m).unwrap(), SyncOutcome::Written { first_write: false });

    let record = cache.get(&target).unwrap().unwrap();
    assert_eq!(record.border_setting.as_deref(), Some("paint"));
    assert_eq!(record.border_color.as_deref(), Some("#ff0000"));
    let painted = image::open(&target).unwrap().to_rgb8();
    assert_eq!(painted.get_pixel(0, 0).0, [255, 0, 0]);

    // Disabled: the untouched source replaces the bordered file.
    let plain = SyncPipeline::new(&cache, settings(&dir));
    assert_eq!(plain.sync_one(&m).unwrap(), SyncOutcome::Written { first_write: false });

    let record = cache.get(&target).unwrap().unwrap();
    assert!(!record.border_replaced);
    assert_eq!(record.border_setting, None);
    assert_eq!(record.file_hash, original_hash);
    assert_eq!(fs::read(&target).unwrap(), fs::read(&source).unwrap());
}

#[test]
fn test_border_failure_falls_back_to_original() {
    let dir = TempDir::new().unwrap();
    let source = source_dir(&dir).join("Inception (2010).jpg");
    fs::write(&source, b"not really a jpeg").unwrap();

    let cache = SqliteCache::in_memory().unwrap();
    let pipeline = SyncPipeline::new(
        &cache,
        SyncSettings {
            border: Some(BorderMode::Remove),
            ..settings(&dir)
        },
    );
    let m = movie_match(&source, "Inception (2010)");
    assert_eq!(pipeline.sync_one(&m).unwrap(), SyncOutcome::Written { first_write: true });

    let target = dir.path().join("assets").join("Inception (2010).jpg");
    assert_eq!(fs::read(&target).unwrap(), b"not really a jpeg");
    let record = cache.get(&target).unwrap().unwrap();
    assert!(!record.border_replaced);
    assert_eq!(record.file_hash, record.original_file_hash);
}
