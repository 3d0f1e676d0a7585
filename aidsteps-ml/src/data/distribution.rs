//! Emergency-type classification of input phrases and per-split distribution.

use crate::data::split::{DatasetSplit, SplitLabel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Ordered classification rules. The first rule with a matching phrase wins.
static EMERGENCY_RULES: &[(&str, &[&str])] = &[
    ("heat_stroke", &["heat stroke", "overheating"]),
    ("hypothermia", &["hypothermia", "too cold", "freezing"]),
    ("allergic_reaction", &["allergic", "anaphylaxis"]),
    ("altitude_sickness", &["altitude", "mountain sickness"]),
    ("dehydration", &["dehydrat", "no water"]),
    ("tick_bite", &["tick"]),
    ("sunburn", &["sunburn", "burned by sun"]),
    ("bee_sting", &["bee", "wasp", "sting"]),
    ("snake_bite", &["snake"]),
    ("seizure", &["seizure", "convuls", "epileptic"]),
    ("fainting", &["faint", "passed out", "unconscious"]),
    ("vertigo", &["vertigo", "dizz", "spinning"]),
    ("eye_injury", &["eye"]),
];

static LATE_RULES: &[(&str, &[&str])] = &[
    ("fever", &["fever", "temperature", "burning up"]),
    ("bruises", &["bruise", "black and blue", "contusion"]),
    ("sprains", &["sprain", "twisted", "sports injury"]),
    ("fractures", &["fracture", "broken", "bone"]),
];

static TAIL_RULES: &[(&str, &[&str])] = &[
    ("cuts", &["cut", "bleeding cut"]),
    ("choking", &["chok", "can't breathe", "blocked airway"]),
    (
        "cpr",
        &["cpr", "cardiac", "heart stopped", "not breathing"],
    ),
    ("drowning", &["drown", "underwater", "water rescue"]),
];

fn first_match(text: &str, rules: &[(&'static str, &[&str])]) -> Option<&'static str> {
    rules
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| text.contains(n)))
        .map(|(kind, _)| *kind)
}

/// Classify an input phrase into an emergency type, or `"other"`.
///
/// Matching is case-insensitive substring search. Nose bleeds and head
/// injuries need two cues each, so they sit between the single-cue rule groups.
pub fn classify_emergency(input: &str) -> &'static str {
    let text = input.to_lowercase();

    if let Some(kind) = first_match(&text, EMERGENCY_RULES) {
        return kind;
    }
    if text.contains("nose") && text.contains("bleed") {
        return "nose_bleed";
    }
    if let Some(kind) = first_match(&text, LATE_RULES) {
        return kind;
    }
    if text.contains("head")
        && ["injury", "trauma", "wound"]
            .iter()
            .any(|cue| text.contains(cue))
    {
        return "head_injury";
    }
    first_match(&text, TAIL_RULES).unwrap_or("other")
}

/// Emergency-type counts for each split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub per_split: BTreeMap<String, BTreeMap<String, usize>>,
    /// Every type seen in any split, including `"other"`.
    pub all_types: BTreeSet<String>,
}

impl DistributionReport {
    /// Types present in `train` but absent from `label`.
    pub fn missing_from(&self, label: SplitLabel) -> Vec<String> {
        let train = self.per_split.get(&SplitLabel::Train.to_string());
        let target = self.per_split.get(&label.to_string());
        match (train, target) {
            (Some(train), Some(target)) => train
                .keys()
                .filter(|k| !target.contains_key(*k))
                .cloned()
                .collect(),
            (Some(train), None) => train.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

/// Count emergency types across the three splits.
pub fn distribution(split: &DatasetSplit) -> DistributionReport {
    let mut report = DistributionReport::default();
    for label in SplitLabel::ALL {
        let counts = report.per_split.entry(label.to_string()).or_default();
        for example in split.get(label) {
            let kind = classify_emergency(&example.input);
            *counts.entry(kind.to_string()).or_default() += 1;
            report.all_types.insert(kind.to_string());
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::Step;
    use crate::data::example::TrainingExample;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classification_examples() {
        assert_eq!(classify_emergency("How do you treat Heat Stroke?"), "heat_stroke");
        assert_eq!(classify_emergency("I am freezing"), "hypothermia");
        assert_eq!(classify_emergency("bee sting on my arm"), "bee_sting");
        assert_eq!(classify_emergency("my nose won't stop bleeding"), "nose_bleed");
        assert_eq!(classify_emergency("fractured leg"), "fractures");
        assert_eq!(classify_emergency("head injury from a fall"), "head_injury");
        assert_eq!(classify_emergency("I cut myself"), "cuts");
        assert_eq!(classify_emergency("blocked airway"), "choking");
        assert_eq!(classify_emergency("heart stopped"), "cpr");
        assert_eq!(classify_emergency("person drowning"), "drowning");
        assert_eq!(classify_emergency("I feel sad"), "other");
    }

    #[test]
    fn test_first_rule_wins() {
        // "sting" (bee_sting) comes before "snake" and "cut".
        assert_eq!(classify_emergency("snake sting cut"), "bee_sting");
        // "bone" is a fracture cue even though "head" and "wound" appear later.
        assert_eq!(classify_emergency("head wound near the bone"), "fractures");
    }

    #[test]
    fn test_distribution_counts() {
        let step = vec![Step::new(1, "Act Now", "Follow basic first aid steps.")];
        let split = DatasetSplit {
            train: vec![
                TrainingExample::new("I cut myself", step.clone()),
                TrainingExample::new("bleeding cut", step.clone()),
                TrainingExample::new("someone is choking", step.clone()),
            ],
            validation: vec![TrainingExample::new("person drowning", step.clone())],
            test: vec![TrainingExample::new("I feel odd", step)],
        };
        let report = distribution(&split);
        assert_eq!(report.per_split["train"]["cuts"], 2);
        assert_eq!(report.per_split["validation"]["drowning"], 1);
        assert_eq!(report.per_split["test"]["other"], 1);
        assert_eq!(report.all_types.len(), 4);
        assert_eq!(
            report.missing_from(SplitLabel::Validation),
            vec!["choking".to_string(), "cuts".to_string()]
        );
    }
}
