//! Persistent cache.
//!
//! Stores the last synchronized state of every target file in SQLite. Rows
//! that cannot be decoded read as "no record", which forces a resync of that
//! target instead of failing the run.

use crate::core::unmatched::{LedgerEntries, UnmatchedLedger, UnmatchedTotals};
use crate::models::cache::{CacheField, CacheFilter, CacheRecord};
use crate::models::media::MediaType;
use crate::Result;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Cache operations used by the sync and cleanup passes.
pub trait PersistentCache {
    /// Record for a target path.
    fn get(&self, path: &Path) -> Result<Option<CacheRecord>>;
    /// Insert a record, or update the stored hashes, source, border and
    /// flags of an existing one.
    fn upsert(&self, record: &CacheRecord) -> Result<()>;
    /// Update one column. Returns whether a row was changed.
    fn update_field(&self, path: &Path, field: &CacheField) -> Result<bool>;
    /// Delete a record. Returns whether a row existed.
    fn delete(&self, path: &Path) -> Result<bool>;
    /// Every readable record accepted by the filter.
    fn list_all(&self, filter: &CacheFilter) -> Result<BTreeMap<PathBuf, CacheRecord>>;

    /// Records whose `file_hash` or `original_file_hash` equals `hash`.
    fn find_by_hash(&self, hash: &str) -> Result<Vec<CacheRecord>> {
        Ok(self
            .list_all(&CacheFilter::default())?
            .into_values()
            .filter(|r| r.file_hash == hash || r.original_file_hash == hash)
            .collect())
    }
}

const RECORD_COLUMNS: &str = "file_path, file_name, status, has_episodes, has_file, media_type, \
     file_hash, original_file_hash, source_path, border_replaced, border_setting, border_color, \
     uploaded_to_libraries, webhook_run, timestamp";

/// SQLite-backed cache.
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open (or create) the cache file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        tracing::debug!("Opened cache {:?}", path);
        Ok(cache)
    }

    /// Cache that lives only as long as the value.
    pub fn in_memory() -> Result<Self> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS file_cache (
                file_path TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                status TEXT,
                has_episodes INTEGER,
                has_file INTEGER,
                media_type TEXT NOT NULL,
                file_hash TEXT NOT NULL UNIQUE,
                original_file_hash TEXT NOT NULL UNIQUE,
                source_path TEXT NOT NULL,
                border_replaced INTEGER NOT NULL DEFAULT 0,
                border_setting TEXT,
                border_color TEXT,
                uploaded_to_libraries TEXT NOT NULL DEFAULT '[]',
                webhook_run INTEGER NOT NULL DEFAULT 0,
                timestamp TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS unmatched_movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS unmatched_collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS unmatched_shows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                main_poster_missing INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS unmatched_seasons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                show_id INTEGER NOT NULL,
                season TEXT NOT NULL,
                FOREIGN KEY(show_id) REFERENCES unmatched_shows(id) ON DELETE CASCADE,
                UNIQUE(show_id, season)
            );
            CREATE TABLE IF NOT EXISTS unmatched_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_movies INTEGER NOT NULL DEFAULT 0,
                total_series INTEGER NOT NULL DEFAULT 0,
                total_seasons INTEGER NOT NULL DEFAULT 0,
                total_collections INTEGER NOT NULL DEFAULT 0,
                unmatched_movies INTEGER NOT NULL DEFAULT 0,
                unmatched_series INTEGER NOT NULL DEFAULT 0,
                unmatched_seasons INTEGER NOT NULL DEFAULT 0,
                unmatched_collections INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(())
    }

    /// Total number of rows, readable or not.
    pub fn row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM file_cache", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    #[cfg(test)]
    fn execute_raw(&self, sql: &str) -> Result<usize> {
        Ok(self.conn.execute(sql, [])?)
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Decode a row; `None` when any column is missing or malformed.
fn record_from_row(row: &Row<'_>) -> Option<CacheRecord> {
    let media_type = MediaType::parse(&row.get::<_, String>(5).ok()?)?;
    let libraries: Vec<String> = serde_json::from_str(&row.get::<_, String>(12).ok()?).ok()?;

    Some(CacheRecord {
        file_path: PathBuf::from(row.get::<_, String>(0).ok()?),
        file_name: row.get(1).ok()?,
        status: row.get(2).ok()?,
        has_episodes: row.get(3).ok()?,
        has_file: row.get(4).ok()?,
        media_type,
        file_hash: row.get(6).ok()?,
        original_file_hash: row.get(7).ok()?,
        source_path: PathBuf::from(row.get::<_, String>(8).ok()?),
        border_replaced: row.get(9).ok()?,
        border_setting: row.get(10).ok()?,
        border_color: row.get(11).ok()?,
        uploaded_to_libraries: libraries,
        webhook_run: row.get(13).ok()?,
        timestamp: row.get(14).ok()?,
    })
}

fn field_value(field: &CacheField) -> Result<Value> {
    let bool_value = |b: bool| Value::Integer(i64::from(b));
    Ok(match field {
        CacheField::Status(status) => status.clone().map_or(Value::Null, Value::Text),
        CacheField::HasEpisodes(v) | CacheField::HasFile(v) => v.map_or(Value::Null, bool_value),
        CacheField::WebhookRun(v) => bool_value(*v),
        CacheField::UploadedToLibraries(libs) => Value::Text(serde_json::to_string(libs)?),
    })
}

impl PersistentCache for SqliteCache {
    fn get(&self, path: &Path) -> Result<Option<CacheRecord>> {
        let sql = format!("SELECT {} FROM file_cache WHERE file_path = ?1", RECORD_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![path_key(path)], |row| Ok(record_from_row(row)))
            .optional()?;

        Ok(match row {
            Some(Some(record)) => Some(record),
            Some(None) => {
                tracing::warn!("Unreadable cache record for {:?}, treating as new", path);
                None
            }
            None => None,
        })
    }

    fn upsert(&self, record: &CacheRecord) -> Result<()> {
        let sql = format!(
            "INSERT INTO file_cache ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(file_path) DO UPDATE SET
                file_name = excluded.file_name,
                media_type = excluded.media_type,
                file_hash = excluded.file_hash,
                original_file_hash = excluded.original_file_hash,
                source_path = excluded.source_path,
                border_replaced = excluded.border_replaced,
                border_setting = excluded.border_setting,
                border_color = excluded.border_color,
                uploaded_to_libraries = excluded.uploaded_to_libraries,
                webhook_run = excluded.webhook_run,
                timestamp = excluded.timestamp",
            RECORD_COLUMNS
        );
        self.conn.execute(
            &sql,
            params![
                path_key(&record.file_path),
                record.file_name,
                record.status,
                record.has_episodes,
                record.has_file,
                record.media_type.as_str(),
                record.file_hash,
                record.original_file_hash,
                path_key(&record.source_path),
                record.border_replaced,
                record.border_setting,
                record.border_color,
                serde_json::to_string(&record.uploaded_to_libraries)?,
                record.webhook_run,
                record.timestamp,
            ],
        )?;
        Ok(())
    }

    fn update_field(&self, path: &Path, field: &CacheField) -> Result<bool> {
        let sql = format!("UPDATE file_cache SET {} = ?1 WHERE file_path = ?2", field.column());
        let changed = self
            .conn
            .execute(&sql, params![field_value(field)?, path_key(path)])?;
        Ok(changed > 0)
    }

    fn delete(&self, path: &Path) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM file_cache WHERE file_path = ?1", params![path_key(path)])?;
        Ok(changed > 0)
    }

    fn list_all(&self, filter: &CacheFilter) -> Result<BTreeMap<PathBuf, CacheRecord>> {
        let sql = format!("SELECT {} FROM file_cache ORDER BY file_path", RECORD_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok(record_from_row(row)))?;

        let mut records = BTreeMap::new();
        for row in rows {
            match row? {
                Some(record) if filter.accepts(&record) => {
                    records.insert(record.file_path.clone(), record);
                }
                Some(_) => {}
                None => tracing::warn!("Skipping unreadable cache record"),
            }
        }
        Ok(records)
    }

    fn find_by_hash(&self, hash: &str) -> Result<Vec<CacheRecord>> {
        let sql = format!(
            "SELECT {} FROM file_cache WHERE file_hash = ?1 OR original_file_hash = ?1 ORDER BY file_path",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![hash], |row| Ok(record_from_row(row)))?;

        let mut records = Vec::new();
        for row in rows {
            if let Some(record) = row? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl UnmatchedLedger for SqliteCache {
    fn replace_unmatched(&self, entries: &LedgerEntries) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM unmatched_seasons;
             DELETE FROM unmatched_shows;
             DELETE FROM unmatched_movies;
             DELETE FROM unmatched_collections;
             DELETE FROM unmatched_stats;",
        )?;

        for title in &entries.movies {
            tx.execute("INSERT OR IGNORE INTO unmatched_movies (title) VALUES (?1)", params![title])?;
        }
        for title in &entries.collections {
            tx.execute(
                "INSERT OR IGNORE INTO unmatched_collections (title) VALUES (?1)",
                params![title],
            )?;
        }
        for show in &entries.shows {
            tx.execute(
                "INSERT OR IGNORE INTO unmatched_shows (title, main_poster_missing) VALUES (?1, ?2)",
                params![show.title, show.missing_poster],
            )?;
            let show_id: i64 = tx.query_row(
                "SELECT id FROM unmatched_shows WHERE title = ?1",
                params![show.title],
                |r| r.get(0),
            )?;
            for season in &show.missing_seasons {
                tx.execute(
                    "INSERT OR IGNORE INTO unmatched_seasons (show_id, season) VALUES (?1, ?2)",
                    params![show_id, season],
                )?;
            }
        }

        let t = &entries.totals;
        tx.execute(
            "INSERT INTO unmatched_stats (id, total_movies, total_series, total_seasons, total_collections,
                unmatched_movies, unmatched_series, unmatched_seasons, unmatched_collections)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                t.total_movies as i64,
                t.total_series as i64,
                t.total_seasons as i64,
                t.total_collections as i64,
                t.unmatched_movies as i64,
                t.unmatched_series as i64,
                t.unmatched_seasons as i64,
                t.unmatched_collections as i64,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn unmatched_totals(&self) -> Result<Option<UnmatchedTotals>> {
        let totals = self
            .conn
            .query_row(
                "SELECT total_movies, total_series, total_seasons, total_collections,
                    unmatched_movies, unmatched_series, unmatched_seasons, unmatched_collections
                 FROM unmatched_stats WHERE id = 1",
                [],
                |r| {
                    Ok(UnmatchedTotals {
                        total_movies: r.get::<_, i64>(0)? as usize,
                        total_series: r.get::<_, i64>(1)? as usize,
                        total_seasons: r.get::<_, i64>(2)? as usize,
                        total_collections: r.get::<_, i64>(3)? as usize,
                        unmatched_movies: r.get::<_, i64>(4)? as usize,
                        unmatched_series: r.get::<_, i64>(5)? as usize,
                        unmatched_seasons: r.get::<_, i64>(6)? as usize,
                        unmatched_collections: r.get::<_, i64>(7)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(totals)
    }

    fn unmatched_titles(&self, media_type: MediaType) -> Result<Vec<String>> {
        let table = match media_type {
            MediaType::Movies => "unmatched_movies",
            MediaType::Shows => "unmatched_shows",
            MediaType::Collections => "unmatched_collections",
        };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT title FROM {} ORDER BY id", table))?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;

        let mut titles = Vec::new();
        for title in rows {
            titles.push(title?);
        }
        Ok(titles)
    }
}
