//! Checks applied to model-generated step lists: JSON extraction, structure, relevance.

pub mod extract;
pub mod relevance;
pub mod schema;

pub use extract::{ParsedOutput, extract_json_object, parse_generated};
pub use relevance::{RelevanceScore, detect_emergency, score_relevance};
pub use schema::{StructureChecks, validate_structure, validate_structure_with};
