//! Ingestion orchestrator.
//!
//! One call to [`IngestionPipeline::ingest`] walks a request through
//! `Received → Parsed → Requested → Classified → Persisted|PersistFailed → Done`.
//! Requests share nothing but the provider client and the record sink, so a
//! pipeline can be cloned freely and driven from many tasks at once.
//!
//! Dropping the future returned by `ingest` cancels the request: an
//! in-flight backend call is aborted and, since persistence only starts after
//! classification, nothing is stored.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{IngestError, PolicyError};
use crate::llm::{ClassificationPolicy, ClassificationProvider};
use crate::models::{ClassificationResult, ConversationRecord, Transcript};
use crate::sink::RecordSink;
use crate::stages::{
    PersistOutcome, execute_stage0, execute_stage2, reconcile_completion, request_classification,
};

/// Where a request is in the pipeline.
///
/// Without a record sink there is nothing to persist, so the trail goes
/// straight from `Classified` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Received,
    Parsed,
    Requested,
    Classified,
    Persisted,
    PersistFailed,
    Done,
}

/// One transcript submitted for classification
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub raw_text: String,
    /// Name the exporting user appears under in the chat
    pub self_name: String,
    /// Name of the uploaded file, if any
    pub file_label: Option<String>,
}

impl IngestRequest {
    pub fn new(raw_text: impl Into<String>, self_name: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            self_name: self_name.into(),
            file_label: None,
        }
    }

    pub fn with_file_label(mut self, file_label: impl Into<String>) -> Self {
        self.file_label = Some(file_label.into());
        self
    }
}

/// Everything the caller gets back from a successful ingest
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub result: ClassificationResult,
    pub transcript: Transcript,
    /// Rendered transcript exactly as sent to the backend
    pub normalized_text: String,
    pub used_fallback: bool,
    /// Older lines were dropped to fit the character budget
    pub truncated: bool,
    pub persistence: PersistOutcome,
    /// States visited, in order
    pub states: Vec<IngestState>,
}

/// Parser, builder, provider, validator and sink wired together
#[derive(Clone)]
pub struct IngestionPipeline {
    provider: Arc<dyn ClassificationProvider>,
    sink: Option<Arc<dyn RecordSink>>,
    policy: ClassificationPolicy,
    sink_timeout: Duration,
}

impl IngestionPipeline {
    /// Create a pipeline without a record sink; the policy is validated here
    pub fn new(
        provider: Arc<dyn ClassificationProvider>,
        policy: ClassificationPolicy,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            provider,
            sink: None,
            policy,
            sink_timeout: Duration::from_secs(10),
        })
    }

    pub fn with_sink(mut self, sink: Option<Arc<dyn RecordSink>>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Classify one transcript.
    ///
    /// Only empty input and backend failures are errors. A malformed backend
    /// answer yields the fallback result and a failed insert is logged, both
    /// still returning `Ok`.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, IngestError> {
        let mut states = vec![IngestState::Received];

        let transcript = execute_stage0(&request.raw_text, &request.self_name)?;
        advance(&mut states, IngestState::Parsed);

        let normalized_text = transcript.render(&self.policy.labels);
        let completion =
            request_classification(self.provider.as_ref(), &normalized_text, &self.policy).await?;
        advance(&mut states, IngestState::Requested);

        let stage1 = reconcile_completion(&completion);
        advance(&mut states, IngestState::Classified);

        let record = ConversationRecord::new(
            request.file_label.clone(),
            Some(request.self_name.trim().to_string()).filter(|s| !s.is_empty()),
            request.raw_text,
            normalized_text.clone(),
            stage1.result.clone(),
        );
        let persistence = execute_stage2(self.sink.as_deref(), &record, self.sink_timeout).await;
        match persistence {
            PersistOutcome::Persisted(_) => advance(&mut states, IngestState::Persisted),
            PersistOutcome::Failed => advance(&mut states, IngestState::PersistFailed),
            PersistOutcome::Skipped => {}
        }

        advance(&mut states, IngestState::Done);
        info!(
            "Ingest complete: color={} intent={} persisted={}",
            stage1.result.color,
            stage1.result.intent_level,
            persistence.is_persisted()
        );

        Ok(IngestOutcome {
            result: stage1.result,
            transcript,
            normalized_text,
            used_fallback: stage1.used_fallback,
            truncated: stage1.truncated,
            persistence,
            states,
        })
    }
}

fn advance(states: &mut Vec<IngestState>, next: IngestState) {
    debug!(from = ?states.last(), to = ?next, "Ingest state transition");
    states.push(next);
}
