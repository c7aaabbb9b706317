//! Canonical rubric fields and the label variants that map onto them.
//!
//! Every backend, every text pattern and every table heuristic resolves a
//! field name through [`FieldKey::from_label`], so this file is the single
//! source of truth for label spelling.

use std::collections::HashMap;
use std::sync::LazyLock;

/// What sort of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Decimal score in the nominal range [0, 5].
    Score,
    /// Single-line metadata (names).
    Text,
    /// Free-form comment block.
    Comments,
}

impl FieldKind {
    pub fn is_score(&self) -> bool {
        matches!(self, FieldKind::Score)
    }
}

/// A canonical rubric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    ProjectMotivation,
    ProblemStatement,
    Objectives,
    LiteratureReview,
    Methodology,
    Design,
    Implementation,
    Testing,
    Budget,
    Timeline,
    Presentation,
    EvaluatorName,
    GroupName,
    AdvisorName,
    Comments,
}

impl FieldKey {
    /// The eleven score fields in rubric (and CSV) order.
    pub const SCORES: [FieldKey; 11] = [
        FieldKey::ProjectMotivation,
        FieldKey::ProblemStatement,
        FieldKey::Objectives,
        FieldKey::LiteratureReview,
        FieldKey::Methodology,
        FieldKey::Design,
        FieldKey::Implementation,
        FieldKey::Testing,
        FieldKey::Budget,
        FieldKey::Timeline,
        FieldKey::Presentation,
    ];

    /// The three metadata fields.
    pub const METADATA: [FieldKey; 3] = [
        FieldKey::EvaluatorName,
        FieldKey::GroupName,
        FieldKey::AdvisorName,
    ];

    /// Every field, scores first.
    pub const ALL: [FieldKey; 15] = [
        FieldKey::ProjectMotivation,
        FieldKey::ProblemStatement,
        FieldKey::Objectives,
        FieldKey::LiteratureReview,
        FieldKey::Methodology,
        FieldKey::Design,
        FieldKey::Implementation,
        FieldKey::Testing,
        FieldKey::Budget,
        FieldKey::Timeline,
        FieldKey::Presentation,
        FieldKey::EvaluatorName,
        FieldKey::GroupName,
        FieldKey::AdvisorName,
        FieldKey::Comments,
    ];

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldKey::EvaluatorName | FieldKey::GroupName | FieldKey::AdvisorName => {
                FieldKind::Text
            }
            FieldKey::Comments => FieldKind::Comments,
            _ => FieldKind::Score,
        }
    }

    /// Internal (JSON) name of the field.
    pub fn canonical_key(&self) -> &'static str {
        match self {
            FieldKey::ProjectMotivation => "projectMotivationScore",
            FieldKey::ProblemStatement => "problemStatementScore",
            FieldKey::Objectives => "objectivesScore",
            FieldKey::LiteratureReview => "literatureReviewScore",
            FieldKey::Methodology => "methodologyScore",
            FieldKey::Design => "designScore",
            FieldKey::Implementation => "implementationScore",
            FieldKey::Testing => "testingScore",
            FieldKey::Budget => "budgetScore",
            FieldKey::Timeline => "timelineScore",
            FieldKey::Presentation => "presentationScore",
            FieldKey::EvaluatorName => "evaluatorName",
            FieldKey::GroupName => "groupName",
            FieldKey::AdvisorName => "advisorName",
            FieldKey::Comments => "comments",
        }
    }

    /// Human-readable label as printed on the rubric form.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKey::ProjectMotivation => "Project Motivation",
            FieldKey::ProblemStatement => "Problem Statement",
            FieldKey::Objectives => "Objectives",
            FieldKey::LiteratureReview => "Literature Review",
            FieldKey::Methodology => "Methodology",
            FieldKey::Design => "Design",
            FieldKey::Implementation => "Implementation",
            FieldKey::Testing => "Testing",
            FieldKey::Budget => "Budget",
            FieldKey::Timeline => "Timeline",
            FieldKey::Presentation => "Presentation",
            FieldKey::EvaluatorName => "Evaluator Name",
            FieldKey::GroupName => "Group Name",
            FieldKey::AdvisorName => "Advisor Name",
            FieldKey::Comments => "Comments",
        }
    }

    /// Label variants seen on scanned forms and in custom-model field names,
    /// in addition to [`label`](Self::label). Longest first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            FieldKey::ProjectMotivation => &["Project Motivation", "Motivation"],
            FieldKey::ProblemStatement => &["Problem Statement", "Problem Definition"],
            FieldKey::Objectives => &["Project Objectives", "Objectives", "Objective"],
            FieldKey::LiteratureReview => &["Literature Review", "Background Research"],
            FieldKey::Methodology => &["Methodology", "Approach"],
            FieldKey::Design => &["Technical Design", "System Design", "Design"],
            FieldKey::Implementation => &["Implementation"],
            FieldKey::Testing => &["Testing and Validation", "Testing"],
            FieldKey::Budget => &["Budget"],
            FieldKey::Timeline => &["Project Timeline", "Timeline", "Schedule"],
            FieldKey::Presentation => &["Oral Presentation", "Presentation"],
            FieldKey::EvaluatorName => &["Evaluator Name", "Evaluator", "Judge Name", "Judge"],
            FieldKey::GroupName => &["Group Name", "Team Name", "Group", "Team"],
            FieldKey::AdvisorName => &["Advisor Name", "Adviser Name", "Advisor", "Adviser"],
            FieldKey::Comments => &["Additional Comments", "Comments", "Comment", "Remarks"],
        }
    }

    /// Resolve any label, custom-model field name or canonical key.
    ///
    /// `"ProjectMotivationScore"`, `"project motivation score"`,
    /// `"Project Motivation"` and `"projectMotivationScore"` all resolve to
    /// [`FieldKey::ProjectMotivation`].
    pub fn from_label(label: &str) -> Option<FieldKey> {
        let folded = fold_key(label);
        if folded.is_empty() {
            return None;
        }
        LABEL_TABLE.get(folded.as_str()).copied()
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_key())
    }
}

/// Fold a key for table lookup: lowercase, drop everything that is not a
/// letter or digit, then strip a trailing "score".
pub fn fold_key(key: &str) -> String {
    let folded: String = key
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect();
    match folded.strip_suffix("score") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => folded,
    }
}

static LABEL_TABLE: LazyLock<HashMap<String, FieldKey>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for key in FieldKey::ALL {
        table.insert(fold_key(key.canonical_key()), key);
        table.insert(fold_key(key.label()), key);
        for alias in key.aliases() {
            table.insert(fold_key(alias), key);
        }
    }
    table
});
