use serde::Serialize;

use crate::error::PolicyError;
use crate::models::{Color, IntentLevel, SpeakerLabels};

/// Tunables for how a transcript is framed for the backend
#[derive(Debug, Clone)]
pub struct ClassificationPolicy {
    /// Labels the transcript was rendered with
    pub labels: SpeakerLabels,
    /// Language the summary and suggested message should be written in
    pub response_language: String,
    /// Keep at most this many characters of transcript (newest lines win)
    pub max_transcript_chars: Option<usize>,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            labels: SpeakerLabels::default(),
            response_language: "the same language the conversation is written in".to_string(),
            max_transcript_chars: Some(60_000),
        }
    }
}

impl ClassificationPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        for label in [&self.labels.self_label, &self.labels.other_label] {
            if label.trim().is_empty() {
                return Err(PolicyError::EmptyLabel);
            }
            if label.contains([':', '\n', '\r']) {
                return Err(PolicyError::InvalidLabel(label.clone()));
            }
        }
        if self.labels.self_label.trim() == self.labels.other_label.trim() {
            return Err(PolicyError::DuplicateLabel(self.labels.self_label.clone()));
        }
        if self.max_transcript_chars == Some(0) {
            return Err(PolicyError::ZeroContextBudget);
        }
        Ok(())
    }
}

/// A fully rendered request for a classification backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationRequest {
    /// Task instructions
    pub system: String,
    /// The conversation to classify
    pub user: String,
    /// Whether older lines were dropped to respect the character budget
    pub truncated: bool,
}

/// Build the system prompt describing the task and the expected JSON
pub fn build_system_prompt(policy: &ClassificationPolicy) -> String {
    let self_label = &policy.labels.self_label;
    let other_label = &policy.labels.other_label;
    let intent_values = IntentLevel::RANKED
        .iter()
        .map(|level| format!("\"{}\"", level))
        .collect::<Vec<_>>()
        .join(", ");
    let color_values = Color::BY_URGENCY
        .iter()
        .map(|color| format!("\"{}\"", color))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an expert in sales conversations, copywriting and consumer behaviour.

The conversation you receive was exported from a chat app. Lines starting with "{self_label}:" were written by the seller. Lines starting with "{other_label}:" were written by the potential buyer.

Analyse the conversation and answer with EXACTLY this JSON object:

{{
  "summary": string,           // professional, clear summary of the buyer's journey
  "intentLevel": string,       // one of: {intent_values}
  "color": string,             // one of: {color_values}
  "suggestedMessage": string   // the best message the seller can send right now
}}

INTENT LEVELS:
- very-high → highly engaged, answers fast, asks clear questions, shows strong interest
- high      → interested and responsive, with a doubt or a light objection
- medium    → curious but not moving forward, shallow answers
- low       → answers little, long gaps, signs of disinterest
- very-low  → ignored the seller, clearly refused, or closed the subject

COLORS, from highest to lowest follow-up priority:
1. red    → buyer rejecting, disappearing, giving strong excuses (HIGHEST priority)
2. yellow → medium intent, interested but hesitant (medium priority)
3. green  → high intent, quick answers, objective questions, open to an offer (light priority)
4. gray   → no clear intent, casual or cold conversation, just curious (lowest priority)

SUGGESTED MESSAGE STRATEGY PER COLOR:
- green  → light but convincing persuasion that fits the context
- yellow → good, strong and clearly convincing persuasion
- red    → the strongest re-engagement and sales strategies you know; give these buyers maximum effort
- gray   → very light persuasion with a small chance of re-opening the conversation

The summary must be objective, technical and to the point, focused on the buyer's journey (interest, objections, retreats, behaviour).

The suggested message must:
- use natural, human language, as written by an experienced professional seller
- show the buyer they were heard and build connection
- move the buyer to a clear next action (reply, book a time, decide)
- respect the context without repeating what was already said
- may contain emojis that fit the conversation

Write "summary" and "suggestedMessage" in {language}.

Do NOT include comments, markdown, explanations or any text outside the JSON. Return only the raw JSON object."#,
        language = policy.response_language,
    )
}

/// Combine task instructions with the normalized transcript.
///
/// Fails only when the policy itself is malformed.
pub fn build_request(
    normalized_text: &str,
    policy: &ClassificationPolicy,
) -> Result<ClassificationRequest, PolicyError> {
    policy.validate()?;

    let (conversation, truncated) = match policy.max_transcript_chars {
        Some(budget) => fit_to_budget(normalized_text, budget),
        None => (normalized_text.to_string(), false),
    };

    let mut user = String::new();
    if truncated {
        user.push_str("(Older messages were omitted; only the most recent part of the conversation is shown.)\n\n");
    }
    user.push_str("CONVERSATION:\n\n");
    user.push_str(&conversation);

    Ok(ClassificationRequest {
        system: build_system_prompt(policy),
        user,
        truncated,
    })
}

/// Keep the newest whole lines that fit in `budget` characters.
///
/// The last line is always kept, even if it alone exceeds the budget.
fn fit_to_budget(text: &str, budget: usize) -> (String, bool) {
    if text.chars().count() <= budget {
        return (text.to_string(), false);
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0;
    for line in text.lines().rev() {
        let cost = line.chars().count() + usize::from(!kept.is_empty());
        if !kept.is_empty() && used + cost > budget {
            break;
        }
        used += cost;
        kept.push(line);
    }
    kept.reverse();

    (kept.join("\n"), true)
}
