use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::models::ConversationRecord;
use crate::sink::RecordSink;

/// Keeps records in memory; useful for embedding and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ConversationRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything inserted so far
    pub fn records(&self) -> Vec<ConversationRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: &ConversationRecord) -> Result<(), PersistenceError> {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push(record.clone());
        Ok(())
    }
}
