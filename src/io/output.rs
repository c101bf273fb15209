use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{ClassificationResult, ParseStats};
use crate::text::wrap_text;

/// Machine-readable analysis written by the CLI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub ok: bool,
    pub result: ClassificationResult,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub file_label: Option<String>,
    pub messages: usize,
    pub self_messages: usize,
    pub other_messages: usize,
    pub parse: ParseStats,
    /// True when the backend answer had to be replaced by the fallback result
    pub fallback_result: bool,
    /// Only the most recent part of the transcript was classified
    pub truncated: bool,
    pub persisted: bool,
}

impl AnalysisOutput {
    pub fn new(result: ClassificationResult, metadata: AnalysisMetadata) -> Self {
        Self {
            ok: true,
            result,
            metadata,
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Plain-text report for a person deciding whom to follow up with
pub struct HumanReport<'a> {
    result: &'a ClassificationResult,
    normalized_text: &'a str,
}

impl<'a> HumanReport<'a> {
    pub fn new(result: &'a ClassificationResult, normalized_text: &'a str) -> Self {
        Self {
            result,
            normalized_text,
        }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Color: {}  (follow-up priority {} of {})\n",
            self.result.color.as_str().to_uppercase(),
            self.result.color.urgency_rank() + 1,
            crate::models::Color::BY_URGENCY.len()
        ));
        output.push_str(&format!("Intent: {}\n\n", self.result.intent_level));

        output.push_str("Summary\n-------\n");
        output.push_str(&wrap_text(&self.result.summary, 80));
        output.push_str("\n\n");

        output.push_str("Suggested message\n-----------------\n");
        output.push_str(&wrap_text(&self.result.suggested_message, 80));
        output.push_str("\n\n");

        output.push_str("Conversation\n------------\n");
        output.push_str(self.normalized_text);
        output.push('\n');

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}
