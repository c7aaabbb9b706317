//! Rubric record model.

use serde::{Deserialize, Serialize};

use super::field::FieldKey;

/// One evaluated rubric, extracted from a single chunk.
///
/// Empty strings mean "not found". Scores are kept as the text the backend
/// produced so that out-of-range values survive for validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RubricRecord {
    pub chunk_number: u32,
    pub start_page: u32,
    pub end_page: u32,

    pub project_motivation_score: String,
    pub problem_statement_score: String,
    pub objectives_score: String,
    pub literature_review_score: String,
    pub methodology_score: String,
    pub design_score: String,
    pub implementation_score: String,
    pub testing_score: String,
    pub budget_score: String,
    pub timeline_score: String,
    pub presentation_score: String,

    pub evaluator_name: String,
    pub group_name: String,
    pub advisor_name: String,

    pub comments: String,
}

impl RubricRecord {
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::ProjectMotivation => &self.project_motivation_score,
            FieldKey::ProblemStatement => &self.problem_statement_score,
            FieldKey::Objectives => &self.objectives_score,
            FieldKey::LiteratureReview => &self.literature_review_score,
            FieldKey::Methodology => &self.methodology_score,
            FieldKey::Design => &self.design_score,
            FieldKey::Implementation => &self.implementation_score,
            FieldKey::Testing => &self.testing_score,
            FieldKey::Budget => &self.budget_score,
            FieldKey::Timeline => &self.timeline_score,
            FieldKey::Presentation => &self.presentation_score,
            FieldKey::EvaluatorName => &self.evaluator_name,
            FieldKey::GroupName => &self.group_name,
            FieldKey::AdvisorName => &self.advisor_name,
            FieldKey::Comments => &self.comments,
        }
    }

    fn slot_mut(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::ProjectMotivation => &mut self.project_motivation_score,
            FieldKey::ProblemStatement => &mut self.problem_statement_score,
            FieldKey::Objectives => &mut self.objectives_score,
            FieldKey::LiteratureReview => &mut self.literature_review_score,
            FieldKey::Methodology => &mut self.methodology_score,
            FieldKey::Design => &mut self.design_score,
            FieldKey::Implementation => &mut self.implementation_score,
            FieldKey::Testing => &mut self.testing_score,
            FieldKey::Budget => &mut self.budget_score,
            FieldKey::Timeline => &mut self.timeline_score,
            FieldKey::Presentation => &mut self.presentation_score,
            FieldKey::EvaluatorName => &mut self.evaluator_name,
            FieldKey::GroupName => &mut self.group_name,
            FieldKey::AdvisorName => &mut self.advisor_name,
            FieldKey::Comments => &mut self.comments,
        }
    }

    /// Overwrite a field unconditionally.
    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        *self.slot_mut(key) = value.into();
    }

    /// Fill a field only if it is still empty. Returns true if the value was
    /// stored.
    pub fn fill(&mut self, key: FieldKey, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        let slot = self.slot_mut(key);
        if !slot.is_empty() {
            return false;
        }
        *slot = value.to_string();
        true
    }

    pub fn is_empty(&self, key: FieldKey) -> bool {
        self.get(key).is_empty()
    }

    /// Fields that are still empty.
    pub fn missing(&self) -> Vec<FieldKey> {
        FieldKey::ALL
            .into_iter()
            .filter(|k| self.is_empty(*k))
            .collect()
    }

    /// Best-effort total: sum of the eleven scores, treating empty or
    /// non-numeric values as zero. Rounded to two decimals.
    pub fn total_score(&self) -> f64 {
        let total: f64 = FieldKey::SCORES
            .iter()
            .filter_map(|k| self.get(*k).trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .sum();
        (total * 100.0).round() / 100.0
    }

    /// Check present scores. Nothing is clamped or rewritten.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        FieldKey::SCORES
            .iter()
            .filter_map(|key| {
                let value = self.get(*key).trim();
                if value.is_empty() {
                    return None;
                }
                let problem = match value.parse::<f64>() {
                    Ok(v) if !v.is_finite() => ScoreProblem::NotNumeric,
                    Ok(v) if !(SCORE_MIN..=SCORE_MAX).contains(&v) => ScoreProblem::OutOfRange,
                    Ok(_) => return None,
                    Err(_) => ScoreProblem::NotNumeric,
                };
                Some(ValidationIssue {
                    chunk_number: self.chunk_number,
                    field: key.canonical_key().to_string(),
                    value: value.to_string(),
                    problem,
                })
            })
            .collect()
    }
}

/// Lowest valid score.
pub const SCORE_MIN: f64 = 0.0;
/// Highest valid score.
pub const SCORE_MAX: f64 = 5.0;

/// Why a score failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreProblem {
    NotNumeric,
    OutOfRange,
}

/// A score that a reviewer should look at before export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub chunk_number: u32,
    pub field: String,
    pub value: String,
    pub problem: ScoreProblem,
}
