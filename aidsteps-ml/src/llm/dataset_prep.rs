//! Chat dataset preparation for fine-tuning (ShareGPT layout).

use crate::data::example::{TrainingExample, load_examples};
use crate::error::MlError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SHAREGPT_SOURCE: &str = "manual-first-aid";
pub const SHAREGPT_SCORE: f64 = 0.8;

/// A chat message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub role: String,
}

/// One ShareGPT-style training record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareGptRecord {
    pub conversations: Vec<ChatMessage>,
    pub source: String,
    pub score: f64,
}

/// Convert an example into a user/assistant exchange.
///
/// The assistant turn is the compact JSON of the example's output.
pub fn to_sharegpt(example: &TrainingExample) -> Result<ShareGptRecord, MlError> {
    let assistant = serde_json::to_string(&example.output)?;
    Ok(ShareGptRecord {
        conversations: vec![
            ChatMessage {
                content: example.input.clone(),
                role: "user".into(),
            },
            ChatMessage {
                content: assistant,
                role: "assistant".into(),
            },
        ],
        source: SHAREGPT_SOURCE.into(),
        score: SHAREGPT_SCORE,
    })
}

/// Convert a JSONL file of examples into a ShareGPT JSONL file.
///
/// Returns the number of records written.
pub fn export_sharegpt(input: &Path, output: &Path) -> Result<usize, MlError> {
    let examples = load_examples(input)?;
    let records = examples
        .iter()
        .map(to_sharegpt)
        .collect::<Result<Vec<_>, _>>()?;
    for issue in validate_conversations(&records) {
        tracing::warn!(%issue, "ShareGPT record issue");
    }
    let written = aidsteps_core::persistence::write_jsonl(output, &records)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        records = written,
        "Exported ShareGPT dataset"
    );
    Ok(written)
}

/// Validate conversations (check for empty messages, role consistency).
pub fn validate_conversations(records: &[ShareGptRecord]) -> Vec<String> {
    let mut issues = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if record.conversations.is_empty() {
            issues.push(format!("Conversation {i}: empty"));
        }
        for (j, msg) in record.conversations.iter().enumerate() {
            if msg.content.trim().is_empty() {
                issues.push(format!("Conversation {i}, message {j}: empty content"));
            }
            if !["system", "user", "assistant"].contains(&msg.role.as_str()) {
                issues.push(format!(
                    "Conversation {i}, message {j}: invalid role '{}'",
                    msg.role
                ));
            }
        }
    }
    issues
}
