//! Table tier: a cell holding a known label takes its value from the cell to
//! its right, or failing that, the cell below.

use super::{fill_value, resolve_label, score_value};
use crate::extraction::{Table, TableCell};
use crate::models::{FieldKey, RubricRecord};

/// Returns the number of fields filled.
pub(super) fn apply(tables: &[Table], record: &mut RubricRecord) -> usize {
    let mut filled = 0;
    for table in tables {
        for cell in &table.cells {
            let Some(key) = resolve_label(&cell.content) else {
                continue;
            };
            if !record.is_empty(key) {
                continue;
            }
            let right = cell
                .column_index
                .checked_add(1)
                .and_then(|column| table.cell(cell.row_index, column));
            let below = cell
                .row_index
                .checked_add(1)
                .and_then(|row| table.cell(row, cell.column_index));
            let value = [right, below]
                .into_iter()
                .flatten()
                .find_map(|candidate| candidate_value(key, candidate));
            if let Some(value) = value {
                if fill_value(record, key, value) {
                    filled += 1;
                }
            }
        }
    }
    filled
}

/// A neighbouring cell's text, if it can hold a value for `key`. Cells that
/// are themselves labels never count as values.
fn candidate_value(key: FieldKey, cell: &TableCell) -> Option<&str> {
    let content = cell.content.trim();
    if content.is_empty() || resolve_label(content).is_some() {
        return None;
    }
    if key.kind().is_score() {
        score_value(content)
    } else {
        Some(content)
    }
}
