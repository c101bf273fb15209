pub mod config;
pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod sink;
pub mod stages;
pub mod text;

pub use config::{AppConfig, ConfigError, SinkConfig};
pub use error::{IngestError, PersistenceError, PolicyError, ProviderError, ValidationError};
pub use io::{AnalysisMetadata, AnalysisOutput, HumanReport, parse_export, parse_export_file};
pub use llm::{
    ClassificationPolicy, ClassificationProvider, ClassificationRequest, ProviderConfig,
    ProviderKind, build_provider, build_request, validate_response,
};
pub use models::{ClassificationResult, Color, ConversationRecord, IntentLevel, Speaker, Transcript};
pub use pipeline::{IngestOutcome, IngestRequest, IngestState, IngestionPipeline};
pub use sink::{JsonlSink, MemorySink, RecordSink, SqliteSink};
