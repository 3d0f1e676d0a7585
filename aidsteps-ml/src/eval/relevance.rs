//! Keyword-overlap relevance heuristic between an emergency description and
//! generated steps.
//!
//! This is a proxy, not a validated metric: the keyword lists are ad hoc and
//! the category is the first one whose keywords appear in the input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category keyword lists, in detection order.
pub static EMERGENCY_KEYWORDS: &[(&str, &[&str])] = &[
    ("bleeding", &["blood", "bleeding", "cut", "wound"]),
    ("breathing", &["breath", "choking", "airway", "oxygen"]),
    ("burns", &["burn", "fire", "heat", "scald"]),
    ("fracture", &["fracture", "broken", "bone", "arm", "leg"]),
    ("cardiac", &["heart", "chest", "cardiac", "pulse"]),
    ("allergic", &["allergy", "allergic", "reaction", "swelling"]),
    ("head", &["head", "skull", "brain", "concussion"]),
    ("hypothermia", &["cold", "hypothermia", "freezing", "shivering"]),
    ("heat", &["heat", "hot", "fever", "temperature"]),
    ("drowning", &["water", "drown", "underwater"]),
    ("poison", &["poison", "snake", "bite", "venom"]),
];

/// Generic first-aid vocabulary.
pub static GENERAL_FIRST_AID_TERMS: &[&str] = &[
    "call 911",
    "emergency",
    "medical",
    "hospital",
    "help",
    "pressure",
    "apply",
    "check",
    "monitor",
    "position",
    "seek",
];

/// Number of general terms that counts as full general relevance.
pub const GENERAL_TERMS_DENOMINATOR: f64 = 5.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub detected_emergency: Option<String>,
    pub specific_relevance_score: f64,
    pub general_relevance_score: f64,
    pub overall_relevance: f64,
}

/// First category whose keywords occur in `input` (case-insensitive).
pub fn detect_emergency(input: &str) -> Option<&'static str> {
    let input = input.to_lowercase();
    EMERGENCY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| input.contains(k)))
        .map(|(name, _)| *name)
}

fn step_text(steps: &[Value]) -> String {
    steps
        .iter()
        .map(|step| {
            let field = |name: &str| step.get(name).and_then(Value::as_str).unwrap_or("");
            format!("{} {}", field("title"), field("description"))
        })
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn fraction_found(text: &str, terms: &[&str], denominator: f64) -> f64 {
    if text.trim().is_empty() || denominator <= 0.0 {
        return 0.0;
    }
    let matches = terms.iter().filter(|t| text.contains(*t)).count();
    (matches as f64 / denominator).min(1.0)
}

/// Score generated steps (untyped JSON) against the input phrase.
///
/// Non-object steps and missing fields contribute empty text.
pub fn score_relevance(input: &str, steps: &[Value]) -> RelevanceScore {
    let text = step_text(steps);
    let detected = detect_emergency(input);

    let specific = detected
        .and_then(|name| EMERGENCY_KEYWORDS.iter().find(|(n, _)| *n == name))
        .map(|(_, keywords)| fraction_found(&text, keywords, keywords.len() as f64))
        .unwrap_or(0.0);
    let general = fraction_found(&text, GENERAL_FIRST_AID_TERMS, GENERAL_TERMS_DENOMINATOR);

    RelevanceScore {
        detected_emergency: detected.map(str::to_string),
        specific_relevance_score: specific,
        general_relevance_score: general,
        overall_relevance: (specific + general) / 2.0,
    }
}
