//! Record sinks: where finished classifications are stored.
//!
//! The pipeline only ever calls [`RecordSink::insert`] and treats every
//! failure as non-fatal.

pub mod jsonl;
pub mod memory;
pub mod sqlite;

pub use jsonl::JsonlSink;
pub use memory::MemorySink;
pub use sqlite::SqliteSink;

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::models::ConversationRecord;

#[async_trait]
/// Append-only store for conversation records.
pub trait RecordSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Store one record. Implementations may be called concurrently.
    async fn insert(&self, record: &ConversationRecord) -> Result<(), PersistenceError>;
}
