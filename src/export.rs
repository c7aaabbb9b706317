//! CSV export of rubric records.

use crate::models::{FieldKey, RubricRecord};

/// Column headers, in output order.
pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["Chunk", "Start Page", "End Page", "Group Name", "Advisor Name"];
    header.extend(FieldKey::SCORES.iter().map(|k| k.label()));
    header.extend(["Total Score", "Comments", "Evaluator Name"]);
    header
}

/// Render records as CSV, one row per record plus the header. Rows end in
/// `\n`.
pub fn to_csv(records: &[RubricRecord]) -> String {
    let mut csv = String::new();
    csv.push_str(&csv_header().join(","));
    csv.push('\n');

    for record in records {
        let mut row: Vec<String> = vec![
            record.chunk_number.to_string(),
            record.start_page.to_string(),
            record.end_page.to_string(),
            escape_csv(&record.group_name),
            escape_csv(&record.advisor_name),
        ];
        row.extend(FieldKey::SCORES.iter().map(|k| escape_csv(record.get(*k))));
        row.push(record.total_score().to_string());
        row.push(escape_csv(&record.comments));
        row.push(escape_csv(&record.evaluator_name));

        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

/// Suggested download name for an export.
pub fn csv_filename(source: Option<&str>) -> String {
    let stem = source
        .and_then(|s| std::path::Path::new(s).file_stem())
        .and_then(|s| s.to_str())
        .map(|s| {
            s.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "rubrics".to_string());
    format!("{}-scores.csv", stem)
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
