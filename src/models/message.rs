use serde::{Deserialize, Serialize};

/// Which side of the conversation an utterance belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The party whose identity hint was supplied with the request
    #[serde(rename = "self")]
    SelfParty,
    /// Anyone else in the chat
    Other,
}

/// Labels used when rendering speakers into the normalized transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerLabels {
    pub self_label: String,
    pub other_label: String,
}

impl Default for SpeakerLabels {
    fn default() -> Self {
        Self {
            self_label: "SELLER".to_string(),
            other_label: "CLIENT".to_string(),
        }
    }
}

impl SpeakerLabels {
    pub fn label(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::SelfParty => &self.self_label,
            Speaker::Other => &self.other_label,
        }
    }
}

/// One utterance from the export, including its continuation lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
    /// Raw `<date> <time>` taken from the header line, if there was one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Message {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Line-level counters collected while parsing an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    /// Lines that opened a new message
    pub header_lines: usize,
    /// Lines appended to the message before them
    pub continuation_lines: usize,
    /// Encryption/join/etc. notices that were dropped
    pub system_notices: usize,
    /// Non-header lines with no message to attach to
    pub orphan_lines: usize,
    /// True when nothing parsed and the raw text was used as one message
    pub fallback: bool,
}

/// An ordered, speaker-attributed conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub messages: Vec<Message>,
    /// The export exactly as received
    pub raw_text: String,
    /// Identity hint used to resolve [`Speaker::SelfParty`]
    pub self_hint: String,
    pub stats: ParseStats,
}

impl Transcript {
    /// Render as `"<LABEL>: <text>"` lines in original order
    pub fn render(&self, labels: &SpeakerLabels) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", labels.label(m.speaker), m.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn message_count(&self, speaker: Speaker) -> usize {
        self.messages.iter().filter(|m| m.speaker == speaker).count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
