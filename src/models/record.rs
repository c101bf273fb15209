use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ClassificationResult;

/// One persisted classification, handed to the record sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: Uuid,
    /// Name of the uploaded export, if the caller supplied one
    #[serde(default)]
    pub file_label: Option<String>,
    /// Identity hint the transcript was parsed with
    #[serde(default)]
    pub self_name: Option<String>,
    pub original_text: String,
    pub normalized_text: String,
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn new(
        file_label: Option<String>,
        self_name: Option<String>,
        original_text: impl Into<String>,
        normalized_text: impl Into<String>,
        result: ClassificationResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_label,
            self_name,
            original_text: original_text.into(),
            normalized_text: normalized_text.into(),
            result,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, IntentLevel};

    #[test]
    fn test_record_flattens_result_fields() {
        let record = ConversationRecord::new(
            Some("chat.txt".to_string()),
            Some("Ana".to_string()),
            "raw",
            "CLIENT: hi",
            ClassificationResult {
                summary: "s".to_string(),
                intent_level: IntentLevel::Medium,
                color: Color::Yellow,
                suggested_message: "m".to_string(),
            },
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["fileLabel"], "chat.txt");
        assert_eq!(value["normalizedText"], "CLIENT: hi");
        assert_eq!(value["intentLevel"], "medium");
        assert_eq!(value["color"], "yellow");
        assert!(value.get("result").is_none());

        let back: ConversationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
