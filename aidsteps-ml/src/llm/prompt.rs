//! Instruction prompt used when querying the fine-tuned model.

pub const INSTRUCTION: &str = "You're a first aid expert. Based on the emergency described, \
generate step-by-step JSON instructions with fields: step, title, and description.";

/// Build the Alpaca-style prompt for one emergency description.
pub fn prompt_for(input: &str) -> String {
    format!("### Instruction:\n{INSTRUCTION}\n\n### Input:\n{input}\n\n### Response:\n")
}
