//! Flattens the catalog into one training example per trigger phrase.

use crate::data::catalog::Catalog;
use crate::data::example::TrainingExample;

/// Expand every pattern of every category into a [`TrainingExample`].
///
/// Output order follows catalog order, then pattern order. Each example owns
/// its own copy of the category's steps. Similar phrases under different
/// categories are kept as-is.
pub fn expand(catalog: &Catalog) -> Vec<TrainingExample> {
    let mut examples = Vec::with_capacity(catalog.pattern_count());
    for record in catalog.records() {
        for pattern in &record.patterns {
            examples.push(TrainingExample::new(pattern.clone(), record.steps.clone()));
        }
    }
    tracing::debug!(
        categories = catalog.len(),
        examples = examples.len(),
        "Expanded catalog"
    );
    examples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::{EmergencyRecord, Step};
    use pretty_assertions::assert_eq;

    fn record(category: &str, patterns: &[&str], steps: usize) -> EmergencyRecord {
        EmergencyRecord {
            category: category.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            steps: (1..=steps as u32)
                .map(|i| Step::new(i, format!("{category} action {i}"), format!("Do the {category} thing number {i}.")))
                .collect(),
        }
    }

    #[test]
    fn test_one_example_per_pattern_in_order() {
        let catalog = Catalog::new(vec![
            record("Cuts", &["I cut myself", "bleeding cut"], 2),
            record("Burns", &["burned hand"], 3),
        ]);
        let examples = expand(&catalog);
        let inputs: Vec<&str> = examples.iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs, vec!["I cut myself", "bleeding cut", "burned hand"]);
        assert_eq!(examples[0].steps(), catalog.records()[0].steps.as_slice());
        assert_eq!(examples[2].steps().len(), 3);
    }

    #[test]
    fn test_zero_patterns_contribute_nothing() {
        let catalog = Catalog::new(vec![record("Quiet", &[], 2), record("Cuts", &["cut"], 1)]);
        assert_eq!(expand(&catalog).len(), 1);
    }

    #[test]
    fn test_steps_are_copied_by_value() {
        let catalog = Catalog::new(vec![record("Cuts", &["a", "b"], 2)]);
        let mut examples = expand(&catalog);
        examples[0].output.steps[0].title = "Changed".into();
        assert_eq!(examples[1].steps()[0].title, "Cuts action 1");
        assert_eq!(catalog.records()[0].steps[0].title, "Cuts action 1");
    }

    #[test]
    fn test_duplicate_phrases_across_categories_kept() {
        let catalog = Catalog::new(vec![
            record("Cuts", &["bleeding"], 1),
            record("Nose Bleed", &["bleeding"], 1),
        ]);
        assert_eq!(expand(&catalog).len(), 2);
    }
}
