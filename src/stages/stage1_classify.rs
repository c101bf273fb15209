use tracing::{info, warn};

use crate::error::IngestError;
use crate::llm::{
    ClassificationPolicy, ClassificationProvider, build_request, validate_response,
};
use crate::models::ClassificationResult;

/// Raw completion text as returned by the backend
#[derive(Debug, Clone)]
pub struct RawCompletion {
    pub text: String,
    /// Whether the transcript was cut down to fit the character budget
    pub truncated: bool,
}

/// Result of Stage 1 processing
#[derive(Debug, Clone)]
pub struct Stage1Result {
    pub result: ClassificationResult,
    /// True when the completion could not be read and the fallback was used
    pub used_fallback: bool,
    /// The backend only saw the most recent part of the transcript
    pub truncated: bool,
}

/// Build the request and make a single backend call.
///
/// A provider failure is returned as-is; there is no retry and no fallback
/// classification for an unavailable backend.
pub async fn request_classification(
    provider: &dyn ClassificationProvider,
    normalized_text: &str,
    policy: &ClassificationPolicy,
) -> Result<RawCompletion, IngestError> {
    let request = build_request(normalized_text, policy)?;
    if request.truncated {
        info!("Stage 1: transcript truncated to the most recent messages");
    }

    info!(
        "Stage 1: requesting classification from {} ({})",
        provider.name(),
        provider.model()
    );
    let text = provider.classify(&request).await.map_err(|e| {
        warn!(
            kind = %e.kind,
            status = ?e.status,
            diagnostic = e.diagnostic.as_deref().unwrap_or(""),
            "Classification backend failed: {}",
            e
        );
        e
    })?;

    Ok(RawCompletion {
        text,
        truncated: request.truncated,
    })
}

/// Reconcile the completion into the strict result schema
pub fn reconcile_completion(completion: &RawCompletion) -> Stage1Result {
    let result = validate_response(&completion.text);
    let used_fallback = result.is_fallback();

    info!(
        "Stage 1: color={} intent={}{}{}",
        result.color,
        result.intent_level,
        if used_fallback { " (fallback)" } else { "" },
        if completion.truncated {
            " from truncated transcript"
        } else {
            ""
        }
    );

    Stage1Result {
        result,
        used_fallback,
        truncated: completion.truncated,
    }
}
