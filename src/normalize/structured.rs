//! Structured tier: typed model fields, then generic key-value pairs.

use tracing::trace;

use super::{fill_value, resolve_label};
use crate::extraction::AnalyzeResult;
use crate::models::{FieldKey, RubricRecord};

/// Returns the number of fields filled.
pub(super) fn apply(doc: &AnalyzeResult, record: &mut RubricRecord) -> usize {
    let mut filled = 0;

    if let Some(fields) = doc.primary_fields() {
        for (name, value) in fields {
            let Some(key) = FieldKey::from_label(name) else {
                trace!("Ignoring model field {}", name);
                continue;
            };
            if let Some(text) = value.as_text() {
                if fill_value(record, key, &text) {
                    filled += 1;
                }
            }
        }
    }

    for pair in &doc.key_value_pairs {
        let Some(key) = resolve_label(&pair.key.content) else {
            continue;
        };
        if let Some(value) = &pair.value {
            if fill_value(record, key, &value.content) {
                filled += 1;
            }
        }
    }

    filled
}
