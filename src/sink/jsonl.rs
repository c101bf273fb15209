use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::PersistenceError;
use crate::models::ConversationRecord;
use crate::sink::RecordSink;

/// Appends one JSON object per line to a file
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    /// Serializes appends so concurrent inserts never interleave lines
    write_lock: Mutex<()>,
}

impl JsonlSink {
    /// Create a sink writing to `path`, creating parent directories
    pub fn new(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("Initialized JSONL record sink (path={})", path.display());
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn insert(&self, record: &ConversationRecord) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassificationResult;

    #[tokio::test]
    async fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::new(dir.path().join("nested/records.jsonl")).unwrap();

        for label in ["a.txt", "b.txt"] {
            let record = ConversationRecord::new(
                Some(label.to_string()),
                None,
                "raw",
                "CLIENT: raw",
                ClassificationResult::fallback(),
            );
            sink.insert(&record).await.unwrap();
        }

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let records: Vec<ConversationRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].file_label.as_deref(), Some("b.txt"));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = std::sync::Arc::new(JsonlSink::new(dir.path().join("records.jsonl")).unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                let record = ConversationRecord::new(
                    Some(format!("{i}.txt")),
                    None,
                    "x".repeat(4096),
                    "CLIENT: x",
                    ClassificationResult::fallback(),
                );
                sink.insert(&record).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 16);
        for line in content.lines() {
            serde_json::from_str::<ConversationRecord>(line).unwrap();
        }
    }
}
