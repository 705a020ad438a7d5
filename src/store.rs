//! SQLite store for titles and partial summaries of unfinished runs.
//!
//! A run that fails after some segments were summarized (most often at the
//! merge call) leaves its title and partial summaries here, so the next run of
//! the same transcript only redoes the missing work. Rows are removed once the
//! notes have been rendered.
//!
//! Everything is keyed by the transcript ID together with a SHA-256
//! fingerprint of the transcript text. Two files with the same stem, or a file
//! edited after a failed run, never share stored work.

use crate::chunking::Segment;
use crate::error::{LecternError, Result};
use crate::transcript_source::Transcript;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// Bumped whenever the tables change shape; older tables are dropped.
const SCHEMA_VERSION: i64 = 2;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS runs (
        transcript_id TEXT NOT NULL,
        transcript_hash TEXT NOT NULL,
        locator TEXT NOT NULL,
        title TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (transcript_id, transcript_hash)
    );

    CREATE TABLE IF NOT EXISTS partial_summaries (
        transcript_id TEXT NOT NULL,
        transcript_hash TEXT NOT NULL,
        segment_index INTEGER NOT NULL,
        max_length INTEGER NOT NULL,
        segment_hash TEXT NOT NULL,
        summary TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (transcript_id, transcript_hash, segment_index)
    );
"#;

/// Hex SHA-256 of a text.
pub fn fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// An interrupted run with stored work.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub transcript_id: String,
    pub locator: String,
    pub title: String,
    pub partial_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Persistent store for partial summaries.
pub struct PartialStore {
    conn: Mutex<Connection>,
}

impl PartialStore {
    /// Open (or create) the store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_schema(&conn)?;

        info!("Opened partial summary store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LecternError::Store(format!("Failed to acquire lock: {}", e)))
    }

    /// Remember the title chosen for a transcript.
    pub fn save_title(&self, transcript: &Transcript, title: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO runs (transcript_id, transcript_hash, locator, title, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                transcript.id,
                fingerprint(&transcript.text),
                transcript.locator,
                title,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Title stored by an earlier, unfinished run of this exact transcript.
    pub fn stored_title(&self, transcript: &Transcript) -> Result<Option<String>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT title FROM runs WHERE transcript_id = ?1 AND transcript_hash = ?2",
            params![transcript.id, fingerprint(&transcript.text)],
            |row| row.get(0),
        );

        match result {
            Ok(title) => Ok(Some(title)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store the summary of one segment.
    pub fn save_partial(
        &self,
        transcript: &Transcript,
        segment: &Segment,
        max_length: usize,
        summary: &str,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO partial_summaries
                (transcript_id, transcript_hash, segment_index, max_length, segment_hash, summary, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                transcript.id,
                fingerprint(&transcript.text),
                segment.index as i64,
                max_length as i64,
                fingerprint(&segment.text),
                summary,
                Utc::now().to_rfc3339(),
            ],
        )?;
        debug!("Stored partial summary {} for {}", segment.number(), transcript.id);
        Ok(())
    }

    /// Load stored summaries as slots aligned with `segments`.
    ///
    /// A stored summary is only used when it was produced with the same
    /// `max_length` for a segment with the same text; anything else yields
    /// `None` for that slot.
    pub fn load_partials(
        &self,
        transcript: &Transcript,
        segments: &[Segment],
        max_length: usize,
    ) -> Result<Vec<Option<String>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT segment_index, max_length, segment_hash, summary
            FROM partial_summaries
            WHERE transcript_id = ?1 AND transcript_hash = ?2
            "#,
        )?;

        let rows = stmt
            .query_map(params![transcript.id, fingerprint(&transcript.text)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut slots = vec![None; segments.len()];
        for (index, stored_max, segment_hash, summary) in rows {
            let Some(segment) = usize::try_from(index).ok().and_then(|i| segments.get(i)) else {
                continue;
            };
            if stored_max as usize == max_length && segment_hash == fingerprint(&segment.text) {
                slots[segment.index] = Some(summary);
            }
        }

        Ok(slots)
    }

    /// Remove everything stored for this transcript. Returns the number of partials removed.
    pub fn clear(&self, transcript: &Transcript) -> Result<usize> {
        let conn = self.lock()?;
        let hash = fingerprint(&transcript.text);
        let removed = conn.execute(
            "DELETE FROM partial_summaries WHERE transcript_id = ?1 AND transcript_hash = ?2",
            params![transcript.id, hash],
        )?;
        conn.execute(
            "DELETE FROM runs WHERE transcript_id = ?1 AND transcript_hash = ?2",
            params![transcript.id, hash],
        )?;
        Ok(removed)
    }

    /// List unfinished runs, most recent first.
    pub fn list_runs(&self) -> Result<Vec<StoredRun>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.transcript_id, r.locator, r.title, r.updated_at,
                   (SELECT COUNT(*) FROM partial_summaries p
                    WHERE p.transcript_id = r.transcript_id AND p.transcript_hash = r.transcript_hash)
            FROM runs r
            ORDER BY r.updated_at DESC
            "#,
        )?;

        let runs = stmt
            .query_map([], |row| {
                let updated_at: String = row.get(3)?;
                let partial_count: i64 = row.get(4)?;
                Ok(StoredRun {
                    transcript_id: row.get(0)?,
                    locator: row.get(1)?,
                    title: row.get(2)?,
                    partial_count: partial_count as usize,
                    updated_at: DateTime::parse_from_rfc3339(&updated_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(runs)
    }
}

/// Create the tables, dropping ones written by an older layout.
fn init_schema(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch("DROP TABLE IF EXISTS partial_summaries; DROP TABLE IF EXISTS runs;")?;
    }
    conn.execute_batch(SCHEMA)?;
    conn.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::chunk_transcript;
    use crate::transcript_source::CaptionEntry;

    fn transcript(id: &str, text: &str) -> Transcript {
        Transcript::from_captions(id, format!("{}.txt", id), &[CaptionEntry::new(0.0, text)])
    }

    #[test]
    fn test_fingerprint() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(fingerprint("alpha"), fingerprint("alpha "));
    }

    #[test]
    fn test_title_roundtrip_and_clear() {
        let store = PartialStore::in_memory().unwrap();
        let vid = transcript("vid", "alpha beta");
        assert_eq!(store.stored_title(&vid).unwrap(), None);

        store.save_title(&vid, "Graph Algorithms").unwrap();
        assert_eq!(store.stored_title(&vid).unwrap().as_deref(), Some("Graph Algorithms"));

        store.clear(&vid).unwrap();
        assert_eq!(store.stored_title(&vid).unwrap(), None);
    }

    #[test]
    fn test_title_not_shared_between_texts_with_same_id() {
        let store = PartialStore::in_memory().unwrap();
        store
            .save_title(&transcript("lecture", "physics of motion"), "Physics Lecture")
            .unwrap();

        let other = transcript("lecture", "biology of cells");
        assert_eq!(store.stored_title(&other).unwrap(), None);
    }

    #[test]
    fn test_load_partials_fills_matching_slots() {
        let store = PartialStore::in_memory().unwrap();
        let vid = transcript("vid", "alpha beta gamma delta");
        let segments = chunk_transcript(&vid.text, 5);
        assert_eq!(segments.len(), 4);

        store.save_partial(&vid, &segments[0], 5, "first").unwrap();
        store.save_partial(&vid, &segments[2], 5, "third").unwrap();
        store
            .save_partial(&transcript("other", &vid.text), &segments[1], 5, "elsewhere")
            .unwrap();

        let slots = store.load_partials(&vid, &segments, 5).unwrap();
        assert_eq!(
            slots,
            vec![Some("first".to_string()), None, Some("third".to_string()), None]
        );
    }

    #[test]
    fn test_load_partials_ignores_other_chunk_length() {
        let store = PartialStore::in_memory().unwrap();
        let vid = transcript("vid", "alpha beta gamma delta");
        let segments = chunk_transcript(&vid.text, 5);
        store.save_partial(&vid, &segments[0], 5, "first").unwrap();

        let slots = store.load_partials(&vid, &segments, 6).unwrap();
        assert!(slots.iter().all(Option::is_none));
    }

    #[test]
    fn test_load_partials_ignores_edited_text_of_same_length() {
        let store = PartialStore::in_memory().unwrap();
        let before = transcript("lecture", "physics notes");
        let segments = chunk_transcript(&before.text, 100);
        store.save_partial(&before, &segments[0], 100, "old").unwrap();

        let after = transcript("lecture", "biology notes");
        assert_eq!(before.char_len(), after.char_len());
        let slots = store
            .load_partials(&after, &chunk_transcript(&after.text, 100), 100)
            .unwrap();
        assert_eq!(slots, vec![None]);
    }

    #[test]
    fn test_undecodable_row_is_an_error() {
        let store = PartialStore::in_memory().unwrap();
        let vid = transcript("vid", "alpha beta");
        let segments = chunk_transcript(&vid.text, 100);
        store
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO partial_summaries
                    (transcript_id, transcript_hash, segment_index, max_length, segment_hash, summary, created_at)
                VALUES (?1, ?2, 'first', 100, ?3, 'text', ?4)
                "#,
                params![vid.id, fingerprint(&vid.text), fingerprint(&segments[0].text), Utc::now().to_rfc3339()],
            )
            .unwrap();

        assert!(matches!(
            store.load_partials(&vid, &segments, 100),
            Err(LecternError::Database(_))
        ));
    }

    #[test]
    fn test_list_runs_counts_partials() {
        let store = PartialStore::in_memory().unwrap();
        let vid = transcript("vid", "alpha beta gamma delta");
        let segments = chunk_transcript(&vid.text, 5);
        store.save_title(&vid, "Lecture").unwrap();
        store.save_partial(&vid, &segments[0], 5, "first").unwrap();
        store.save_partial(&vid, &segments[1], 5, "second").unwrap();

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].transcript_id, "vid");
        assert_eq!(runs[0].locator, "vid.txt");
        assert_eq!(runs[0].partial_count, 2);

        assert_eq!(store.clear(&vid).unwrap(), 2);
        assert!(store.list_runs().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_current_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partials.db");
        let vid = transcript("vid", "alpha");

        PartialStore::new(&path).unwrap().save_title(&vid, "Kept").unwrap();
        let reopened = PartialStore::new(&path).unwrap();

        assert_eq!(reopened.stored_title(&vid).unwrap().as_deref(), Some("Kept"));
    }
}
