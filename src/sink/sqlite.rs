use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, params};
use tracing::info;

use crate::error::PersistenceError;
use crate::models::ConversationRecord;
use crate::sink::RecordSink;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conversations (
    id                   TEXT PRIMARY KEY,
    file_label           TEXT,
    self_name            TEXT,
    original_text        TEXT NOT NULL,
    normalized_text      TEXT NOT NULL,
    summary              TEXT NOT NULL,
    intent_level         TEXT NOT NULL,
    color                TEXT NOT NULL,
    suggested_message    TEXT NOT NULL,
    created_at           TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_conversations_color ON conversations(color);
";

/// Stores records in a SQLite table
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    /// Open (or create) the database at `path` and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;
        info!("Initialized SQLite record sink (path={})", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records
    pub fn count(&self) -> Result<u64, PersistenceError> {
        let conn = lock(&self.conn);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn lock(conn: &Mutex<Connection>) -> std::sync::MutexGuard<'_, Connection> {
    match conn.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn insert_blocking(conn: &Mutex<Connection>, record: &ConversationRecord) -> Result<(), PersistenceError> {
    let conn = lock(conn);
    conn.execute(
        "INSERT INTO conversations (
            id, file_label, self_name, original_text, normalized_text,
            summary, intent_level, color, suggested_message, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.id.to_string(),
            record.file_label,
            record.self_name,
            record.original_text,
            record.normalized_text,
            record.result.summary,
            record.result.intent_level.as_str(),
            record.result.color.as_str(),
            record.result.suggested_message,
            record.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl RecordSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, record: &ConversationRecord) -> Result<(), PersistenceError> {
        let conn = self.conn.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || insert_blocking(&conn, &record))
            .await
            .map_err(|e| PersistenceError::Join(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationResult, Color, IntentLevel};

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SqliteSink::open(dir.path().join("records.db")).unwrap();

        let record = ConversationRecord::new(
            Some("chat.txt".to_string()),
            Some("Ana".to_string()),
            "09/11/2025 15:59 - Bruno: oi",
            "CLIENT: oi",
            ClassificationResult {
                summary: "s".to_string(),
                intent_level: IntentLevel::VeryHigh,
                color: Color::Green,
                suggested_message: "m".to_string(),
            },
        );
        sink.insert(&record).await.unwrap();

        assert_eq!(sink.count().unwrap(), 1);
        let conn = Connection::open(sink.path()).unwrap();
        let (color, intent): (String, String) = conn
            .query_row(
                "SELECT color, intent_level FROM conversations WHERE id = ?1",
                params![record.id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(color, "green");
        assert_eq!(intent, "very-high");
    }

    #[tokio::test]
    async fn test_duplicate_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SqliteSink::open(dir.path().join("records.db")).unwrap();
        let record = ConversationRecord::new(None, None, "a", "b", ClassificationResult::fallback());

        sink.insert(&record).await.unwrap();
        let err = sink.insert(&record).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Sqlite(_)));
    }
}
