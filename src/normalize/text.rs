//! Text tier: label patterns over OCR text or the analyzed page content.

use std::sync::LazyLock;

use regex::Regex;

use super::fill_value;
use crate::models::{FieldKey, FieldKind, RubricRecord};

/// Compiled patterns per field, longest alias first.
static FIELD_PATTERNS: LazyLock<Vec<(FieldKey, Vec<Regex>)>> = LazyLock::new(|| {
    FieldKey::ALL
        .into_iter()
        .map(|key| {
            let mut aliases: Vec<&str> = key.aliases().to_vec();
            if !aliases.contains(&key.label()) {
                aliases.push(key.label());
            }
            aliases.sort_by_key(|a| std::cmp::Reverse(a.len()));
            let patterns = aliases
                .into_iter()
                .map(|alias| field_pattern(key.kind(), alias))
                .collect();
            (key, patterns)
        })
        .collect()
});

/// Any known label followed by a colon. Used to cut a metadata value that
/// runs into the next label on the same line.
static NEXT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = label_alternation(|_| true);
    Regex::new(&format!(r"(?i)\b(?:{})(?:\s+score)?\s*:", alternation)).unwrap()
});

/// End of a comments block: any label opening a line, or a multi-word label
/// anywhere.
static COMMENTS_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    let any = label_alternation(|_| true);
    let multi_word = label_alternation(|a| a.contains(' '));
    Regex::new(&format!(
        r"(?im)(?:^[ \t]*(?:{})|\b(?:{}))(?:\s+score)?\s*:",
        any, multi_word
    ))
    .unwrap()
});

fn label_alternation(keep: impl Fn(&str) -> bool) -> String {
    let mut aliases: Vec<&str> = FieldKey::ALL
        .iter()
        .flat_map(|k| k.aliases().iter().copied())
        .filter(|a| keep(a))
        .collect();
    aliases.sort_by_key(|a| std::cmp::Reverse(a.len()));
    aliases
        .iter()
        .map(|a| label_regex(a))
        .collect::<Vec<_>>()
        .join("|")
}

/// Escape a label and let any run of whitespace separate its words.
fn label_regex(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn field_pattern(kind: FieldKind, alias: &str) -> Regex {
    let label = label_regex(alias);
    let pattern = match kind {
        FieldKind::Score => format!(
            r"(?i)\b{}(?:\s+score)?(?:\s*\([^)\n]*\))?[:\s]+(-?\d+(?:\.\d+)?)",
            label
        ),
        // A single word is only a label when a colon follows it.
        FieldKind::Text if !alias.contains(' ') => {
            format!(r"(?i)\b{}\s*:[ \t]*([^\n]+)", label)
        }
        FieldKind::Text => format!(r"(?i)\b{}[:\s]+([^\n]+)", label),
        FieldKind::Comments => format!(r"(?is)\b{}\s*:[ \t]*(.+)", label),
    };
    Regex::new(&pattern).unwrap()
}

/// Returns the number of fields filled.
pub(super) fn apply(text: &str, record: &mut RubricRecord) -> usize {
    if text.trim().is_empty() {
        return 0;
    }

    let mut filled = 0;
    for (key, patterns) in FIELD_PATTERNS.iter() {
        if !record.is_empty(*key) {
            continue;
        }
        let found = patterns.iter().find_map(|re| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });
        let Some(value) = found else {
            continue;
        };
        let value = match key.kind() {
            FieldKind::Text => cut_at_next_label(&value),
            FieldKind::Comments => cut_comments(&value),
            FieldKind::Score => value.as_str(),
        };
        if fill_value(record, *key, value) {
            filled += 1;
        }
    }
    filled
}

fn cut_at_next_label(value: &str) -> &str {
    match NEXT_LABEL_RE.find(value) {
        Some(m) => &value[..m.start()],
        None => value,
    }
}

/// The block's first character sits after "Comments:", so matching starts
/// past it.
fn cut_comments(value: &str) -> &str {
    let from = value.chars().next().map_or(0, char::len_utf8);
    match COMMENTS_END_RE.find_at(value, from) {
        Some(m) => &value[..m.start()],
        None => value,
    }
}
