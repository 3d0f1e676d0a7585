//! Structural checks on a generated `{"steps": [...]}` object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields every step object must carry.
pub const REQUIRED_STEP_FIELDS: [&str; 3] = ["step", "title", "description"];

/// Default inclusive bounds on the number of steps.
pub const DEFAULT_STEP_BOUNDS: (usize, usize) = (1, 10);

/// Independent pass/fail checks. A `false` never implies anything about the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureChecks {
    pub has_steps_field: bool,
    pub steps_is_list: bool,
    pub all_steps_have_required_fields: bool,
    pub step_numbers_sequential: bool,
    pub reasonable_step_count: bool,
}

impl StructureChecks {
    pub const NAMES: [&'static str; 5] = [
        "has_steps_field",
        "steps_is_list",
        "all_steps_have_required_fields",
        "step_numbers_sequential",
        "reasonable_step_count",
    ];

    pub fn all_passed(&self) -> bool {
        self.iter().all(|(_, ok)| ok)
    }

    /// `(name, value)` pairs in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> {
        Self::NAMES.into_iter().zip([
            self.has_steps_field,
            self.steps_is_list,
            self.all_steps_have_required_fields,
            self.step_numbers_sequential,
            self.reasonable_step_count,
        ])
    }
}

fn step_is_well_formed(step: &Value) -> bool {
    let Some(obj) = step.as_object() else {
        return false;
    };
    if !REQUIRED_STEP_FIELDS.iter().all(|f| obj.contains_key(*f)) {
        return false;
    }
    obj["step"].is_number() && obj["title"].is_string() && obj["description"].is_string()
}

fn numbers_are_sequential(steps: &[Value]) -> bool {
    !steps.is_empty()
        && steps
            .iter()
            .enumerate()
            .all(|(pos, step)| step.get("step").and_then(Value::as_f64) == Some((pos + 1) as f64))
}

/// Validate with the default step-count bounds of 1..=10.
pub fn validate_structure(value: &Value) -> StructureChecks {
    let (min, max) = DEFAULT_STEP_BOUNDS;
    validate_structure_with(value, min, max)
}

/// Validate a parsed value. Non-object input simply fails every check.
pub fn validate_structure_with(value: &Value, min_steps: usize, max_steps: usize) -> StructureChecks {
    let mut checks = StructureChecks::default();

    let Some(steps) = value.get("steps") else {
        return checks;
    };
    checks.has_steps_field = true;

    let Some(steps) = steps.as_array() else {
        return checks;
    };
    checks.steps_is_list = true;

    checks.all_steps_have_required_fields = steps.iter().all(step_is_well_formed);
    checks.step_numbers_sequential =
        checks.all_steps_have_required_fields && numbers_are_sequential(steps);
    checks.reasonable_step_count = (min_steps..=max_steps).contains(&steps.len());
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn step(n: u64) -> Value {
        json!({"step": n, "title": "Apply Pressure", "description": "Press firmly on the wound."})
    }

    #[test]
    fn test_well_formed_passes_everything() {
        let value = json!({"steps": [step(1), step(2)]});
        let checks = validate_structure(&value);
        assert!(checks.all_passed());
    }

    #[test]
    fn test_gap_in_numbering() {
        let value = json!({"steps": [step(1), step(3)]});
        let checks = validate_structure(&value);
        assert_eq!(
            checks,
            StructureChecks {
                has_steps_field: true,
                steps_is_list: true,
                all_steps_have_required_fields: true,
                step_numbers_sequential: false,
                reasonable_step_count: true,
            }
        );
    }

    #[test]
    fn test_reordered_numbering() {
        let checks = validate_structure(&json!({"steps": [step(2), step(1)]}));
        assert!(!checks.step_numbers_sequential);
    }

    #[test]
    fn test_missing_steps_field() {
        assert_eq!(validate_structure(&json!({"answer": "x"})), StructureChecks::default());
    }

    #[test]
    fn test_non_object_input_degrades() {
        assert_eq!(validate_structure(&json!([1, 2, 3])), StructureChecks::default());
        assert_eq!(validate_structure(&json!("steps")), StructureChecks::default());
        assert_eq!(validate_structure(&Value::Null), StructureChecks::default());
    }

    #[test]
    fn test_steps_not_a_list() {
        let checks = validate_structure(&json!({"steps": {"step": 1}}));
        assert!(checks.has_steps_field);
        assert!(!checks.steps_is_list);
        assert!(!checks.reasonable_step_count);
    }

    #[test]
    fn test_wrong_field_shapes() {
        let value = json!({"steps": [
            {"step": "1", "title": "Apply Pressure", "description": "Press firmly."}
        ]});
        let checks = validate_structure(&value);
        assert!(!checks.all_steps_have_required_fields);
        assert!(!checks.step_numbers_sequential);
        assert!(checks.reasonable_step_count);

        let value = json!({"steps": ["just text"]});
        assert!(!validate_structure(&value).all_steps_have_required_fields);
    }

    #[test]
    fn test_step_count_bounds() {
        let empty = validate_structure(&json!({"steps": []}));
        assert!(empty.steps_is_list);
        assert!(!empty.reasonable_step_count);
        assert!(!empty.step_numbers_sequential);

        let ten: Vec<Value> = (1..=10).map(step).collect();
        assert!(validate_structure(&json!({"steps": ten})).all_passed());

        let eleven: Vec<Value> = (1..=11).map(step).collect();
        let checks = validate_structure(&json!({"steps": eleven}));
        assert!(checks.step_numbers_sequential);
        assert!(!checks.reasonable_step_count);
    }

    #[test]
    fn test_custom_bounds() {
        let value = json!({"steps": [step(1), step(2), step(3)]});
        assert!(!validate_structure_with(&value, 1, 2).reasonable_step_count);
        assert!(validate_structure_with(&value, 3, 3).reasonable_step_count);
    }

    #[test]
    fn test_names_follow_fields() {
        let names: Vec<&str> = StructureChecks::default().iter().map(|(n, _)| n).collect();
        assert_eq!(names, StructureChecks::NAMES.to_vec());
    }
}
