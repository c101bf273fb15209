use std::time::Duration;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::ConversationRecord;
use crate::sink::RecordSink;

/// What happened to the record after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Stored under this id
    Persisted(Uuid),
    /// The sink failed or timed out; already logged
    Failed,
    /// No sink configured
    Skipped,
}

impl PersistOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, PersistOutcome::Persisted(_))
    }
}

/// Execute Stage 2: best-effort insert into the record sink
///
/// Never fails. Errors and timeouts are logged and reported as
/// [`PersistOutcome::Failed`].
pub async fn execute_stage2(
    sink: Option<&dyn RecordSink>,
    record: &ConversationRecord,
    timeout: Duration,
) -> PersistOutcome {
    let Some(sink) = sink else {
        return PersistOutcome::Skipped;
    };

    let outcome = match tokio::time::timeout(timeout, sink.insert(record)).await {
        Ok(result) => result,
        Err(_) => Err(PersistenceError::Timeout(timeout)),
    };

    match outcome {
        Ok(()) => {
            info!("Stage 2: record {} stored in {} sink", record.id, sink.name());
            PersistOutcome::Persisted(record.id)
        }
        Err(e) => {
            error!(sink = sink.name(), record_id = %record.id, "Failed to store record: {}", e);
            PersistOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassificationResult;
    use crate::sink::MemorySink;
    use async_trait::async_trait;

    struct StalledSink;

    #[async_trait]
    impl RecordSink for StalledSink {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn insert(&self, _record: &ConversationRecord) -> Result<(), PersistenceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    fn record() -> ConversationRecord {
        ConversationRecord::new(None, None, "raw", "CLIENT: raw", ClassificationResult::fallback())
    }

    #[tokio::test]
    async fn test_no_sink_is_skipped() {
        let outcome = execute_stage2(None, &record(), Duration::from_secs(1)).await;
        assert_eq!(outcome, PersistOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_successful_insert() {
        let sink = MemorySink::new();
        let record = record();
        let outcome = execute_stage2(Some(&sink), &record, Duration::from_secs(1)).await;

        assert_eq!(outcome, PersistOutcome::Persisted(record.id));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_sink_times_out() {
        let outcome =
            execute_stage2(Some(&StalledSink), &record(), Duration::from_millis(50)).await;
        assert_eq!(outcome, PersistOutcome::Failed);
    }
}
