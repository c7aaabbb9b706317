//! Data models for rubricly.

mod field;
mod rubric;

pub use field::{fold_key, FieldKey, FieldKind};
pub use rubric::{RubricRecord, ScoreProblem, ValidationIssue, SCORE_MAX, SCORE_MIN};
