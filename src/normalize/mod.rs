//! Map raw extraction output onto the canonical rubric record.
//!
//! Three tiers run in order, each filling only fields that are still empty:
//! 1. structured fields (custom-model fields, then generic key-value pairs)
//! 2. label patterns over the flattened text
//! 3. label/value adjacency in table cells
//!
//! Normalization never fails: anything unrecognized is ignored and missing
//! fields stay empty.

mod structured;
mod table;
mod text;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extraction::RawResult;
use crate::models::{FieldKey, RubricRecord};

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Normalize one raw result. Provenance fields are left at zero.
pub fn normalize(raw: &RawResult) -> RubricRecord {
    let mut record = RubricRecord::default();

    let structured = match raw {
        RawResult::Document(doc) => structured::apply(doc, &mut record),
        RawResult::Text(_) => 0,
    };
    let text = text::apply(&raw.text(), &mut record);
    let table = match raw {
        RawResult::Document(doc) => table::apply(&doc.tables, &mut record),
        RawResult::Text(_) => 0,
    };

    debug!(
        "Normalized fields: {} structured, {} text, {} table, {} missing",
        structured,
        text,
        table,
        record.missing().len()
    );
    record
}

/// Store `value` for `key` if the field is empty. Scores keep only their
/// first decimal number; a score value without one is rejected.
pub(crate) fn fill_value(record: &mut RubricRecord, key: FieldKey, value: &str) -> bool {
    if key.kind().is_score() {
        match score_value(value) {
            Some(number) => record.fill(key, number),
            None => false,
        }
    } else {
        record.fill(key, value)
    }
}

/// First decimal number in `text`, with its minus sign. A hyphen joined to a
/// preceding word or number ("A-4", "3-4") is not a sign.
pub(crate) fn score_value(text: &str) -> Option<&str> {
    let m = NUMBER_RE.find(text)?;
    let before = &text[..m.start()];
    let signed = before
        .strip_suffix('-')
        .is_some_and(|rest| !rest.ends_with(|c: char| c.is_alphanumeric() || c == '.'));
    let start = if signed { m.start() - 1 } else { m.start() };
    Some(&text[start..m.end()])
}

/// Resolve a label as printed on a form: parenthesized hints such as
/// "(0-5)" and trailing colons are ignored.
pub(crate) fn resolve_label(label: &str) -> Option<FieldKey> {
    let stripped = PAREN_RE.replace_all(label, " ");
    FieldKey::from_label(stripped.trim().trim_end_matches(':'))
}
