use tracing::info;

use crate::error::ValidationError;
use crate::io::parse_export;
use crate::models::{Speaker, Transcript};

/// Execute Stage 0: input validation and transcript parsing
///
/// Structurally empty input is rejected here, before the parser runs and
/// before any backend call can happen.
pub fn execute_stage0(raw_text: &str, self_name: &str) -> Result<Transcript, ValidationError> {
    if raw_text.trim().is_empty() {
        return Err(ValidationError::MissingInput);
    }

    let transcript = parse_export(raw_text, self_name);

    info!(
        "Stage 0: {} messages ({} self, {} other){}",
        transcript.messages.len(),
        transcript.message_count(Speaker::SelfParty),
        transcript.message_count(Speaker::Other),
        if transcript.stats.fallback {
            ", unrecognised format"
        } else {
            ""
        }
    );

    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(execute_stage0("", "Ana"), Err(ValidationError::MissingInput));
        assert_eq!(
            execute_stage0(" \r\n\t\n", "Ana"),
            Err(ValidationError::MissingInput)
        );
    }

    #[test]
    fn test_parses_non_empty_input() {
        let transcript = execute_stage0("09/11/2025 15:59 - Ana: oi", "Ana").unwrap();
        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.messages[0].speaker, Speaker::SelfParty);
    }
}
