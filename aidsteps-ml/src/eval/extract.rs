//! Locating a JSON object inside free-form model output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Byte length of the balanced `{...}` span starting at `text[0]`, if it closes.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Return the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals are ignored. Prose before and after the
/// object is tolerated. When an opening brace never closes, scanning resumes
/// at the next opening brace.
pub fn extract_json_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let rest = &text[start..];
        balanced_len(rest).map(|len| &rest[..len])
    })
}

/// Outcome of trying to read JSON out of a generated response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedOutput {
    /// The parsed object; `None` when no span was found or it did not parse.
    pub json: Option<Value>,
    pub is_valid_json: bool,
}

/// Extract and parse the first JSON object in `text`. Never fails.
pub fn parse_generated(text: &str) -> ParsedOutput {
    let Some(span) = extract_json_object(text) else {
        tracing::debug!("No JSON object found in generated text");
        return ParsedOutput::default();
    };
    match serde_json::from_str::<Value>(span) {
        Ok(json) => ParsedOutput {
            json: Some(json),
            is_valid_json: true,
        },
        Err(e) => {
            tracing::debug!(error = %e, "Generated JSON span did not parse");
            ParsedOutput::default()
        }
    }
}
