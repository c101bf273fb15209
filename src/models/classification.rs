use serde::{Deserialize, Serialize};

use crate::text::fold_key;

/// Ordinal judgment of the other party's purchase intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
    Unknown,
}

impl IntentLevel {
    pub const RANKED: [IntentLevel; 5] = [
        IntentLevel::VeryHigh,
        IntentLevel::High,
        IntentLevel::Medium,
        IntentLevel::Low,
        IntentLevel::VeryLow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IntentLevel::VeryHigh => "very-high",
            IntentLevel::High => "high",
            IntentLevel::Medium => "medium",
            IntentLevel::Low => "low",
            IntentLevel::VeryLow => "very-low",
            IntentLevel::Unknown => "unknown",
        }
    }

    /// Interpret a free-form intent label from the backend.
    ///
    /// Matching ignores case, diacritics, spacing and punctuation, and
    /// understands both English and Portuguese wording. Anything else is
    /// [`IntentLevel::Unknown`].
    pub fn from_label(label: &str) -> Self {
        match fold_key(label).as_str() {
            "veryhigh" | "highest" | "altissima" | "muitoalta" => IntentLevel::VeryHigh,
            "high" | "alta" | "alto" => IntentLevel::High,
            "medium" | "moderate" | "media" | "medio" | "moderada" => IntentLevel::Medium,
            "low" | "baixa" | "baixo" => IntentLevel::Low,
            "verylow" | "lowest" | "baixissima" | "muitobaixa" | "nenhuma" => {
                IntentLevel::VeryLow
            }
            _ => IntentLevel::Unknown,
        }
    }
}

impl std::fmt::Display for IntentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse follow-up triage label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Yellow,
    Red,
    Gray,
}

impl Color {
    /// Colors from most to least urgent follow-up
    pub const BY_URGENCY: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Gray];

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Red => "red",
            Color::Gray => "gray",
        }
    }

    /// Case-insensitive parse; unrecognized values map to gray
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "red" => Color::Red,
            _ => Color::Gray,
        }
    }

    /// Position in [`Color::BY_URGENCY`], 0 being most urgent
    pub fn urgency_rank(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Yellow => 1,
            Color::Green => 2,
            Color::Gray => 3,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const FALLBACK_SUMMARY: &str =
    "The classification backend returned an unstructured response, so no summary could be extracted.";

pub const FALLBACK_SUGGESTED_MESSAGE: &str =
    "Hi! I wanted to follow up on our last conversation. Is there anything I can help you with?";

/// Canonical classification returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub summary: String,
    pub intent_level: IntentLevel,
    pub color: Color,
    pub suggested_message: String,
}

impl ClassificationResult {
    /// Result substituted when the backend output cannot be interpreted
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            intent_level: IntentLevel::Unknown,
            color: Color::Gray,
            suggested_message: FALLBACK_SUGGESTED_MESSAGE.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}
