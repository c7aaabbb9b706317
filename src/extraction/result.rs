//! Raw analysis output, as returned by the extraction backends.
//!
//! The cloud types mirror the `analyzeResult` JSON of Azure Document
//! Intelligence and Content Understanding. Only the parts the normalizer
//! reads are modelled; everything is optional so that partial responses still
//! deserialize.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Output of one `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RawResult {
    /// Structured cloud result.
    Document(AnalyzeResult),
    /// Plain OCR text.
    Text(String),
}

impl RawResult {
    /// All readable text: `content`, else page lines, else Content
    /// Understanding markdown. OCR text is returned as-is.
    pub fn text(&self) -> String {
        match self {
            RawResult::Text(text) => text.clone(),
            RawResult::Document(doc) => doc.full_text(),
        }
    }

    pub fn as_document(&self) -> Option<&AnalyzeResult> {
        match self {
            RawResult::Document(doc) => Some(doc),
            RawResult::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeResult {
    pub model_id: Option<String>,
    pub content: Option<String>,
    pub pages: Vec<Page>,
    pub tables: Vec<Table>,
    pub documents: Vec<AnalyzedDocument>,
    pub key_value_pairs: Vec<KeyValuePair>,
    /// Content Understanding analyzers return `contents` instead of
    /// `documents`.
    pub contents: Vec<AnalyzedContent>,
}

impl AnalyzeResult {
    pub fn full_text(&self) -> String {
        if let Some(content) = self.content.as_deref().filter(|c| !c.trim().is_empty()) {
            return content.to_string();
        }

        let lines: Vec<&str> = self
            .pages
            .iter()
            .flat_map(|page| page.lines.iter().map(|line| line.content.as_str()))
            .collect();
        if !lines.is_empty() {
            return lines.join("\n");
        }

        self.contents
            .iter()
            .filter_map(|c| c.markdown.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Fields of the first analyzed document, falling back to the first
    /// Content Understanding entry.
    pub fn primary_fields(&self) -> Option<&BTreeMap<String, FieldValue>> {
        self.documents
            .first()
            .map(|d| &d.fields)
            .filter(|f| !f.is_empty())
            .or_else(|| self.contents.first().map(|c| &c.fields))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub page_number: u32,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Table {
    pub row_count: u32,
    pub column_count: u32,
    pub cells: Vec<TableCell>,
}

impl Table {
    pub fn cell(&self, row: u32, column: u32) -> Option<&TableCell> {
        self.cells
            .iter()
            .find(|c| c.row_index == row && c.column_index == column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableCell {
    pub row_index: u32,
    pub column_index: u32,
    pub content: String,
    /// `columnHeader`, `rowHeader`, `content`, ...
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedDocument {
    pub doc_type: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzedContent {
    pub markdown: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
}

/// A typed field value from a custom model or analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldValue {
    #[serde(rename = "type")]
    pub value_type: Option<String>,
    pub value_number: Option<f64>,
    pub value_integer: Option<i64>,
    pub value_string: Option<String>,
    pub content: Option<String>,
    pub value_date: Option<String>,
    pub value_time: Option<String>,
    pub confidence: Option<f64>,
}

impl FieldValue {
    /// Best textual rendering of the value.
    ///
    /// Order: number, integer, string, recognized content, date/time.
    /// Numbers use shortest round-trip formatting, so `4.0` renders as `"4"`.
    pub fn as_text(&self) -> Option<String> {
        if let Some(n) = self.value_number.filter(|n| n.is_finite()) {
            return Some(n.to_string());
        }
        if let Some(i) = self.value_integer {
            return Some(i.to_string());
        }
        [
            &self.value_string,
            &self.content,
            &self.value_date,
            &self.value_time,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValuePair {
    pub key: KeyValueElement,
    pub value: Option<KeyValueElement>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValueElement {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_document_intelligence_result() {
        let json = r#"{
            "modelId": "rubric-v1",
            "content": "Project Motivation: 4",
            "pages": [{"pageNumber": 1, "lines": [{"content": "Project Motivation: 4"}]}],
            "documents": [{
                "docType": "rubric-v1",
                "fields": {
                    "ProjectMotivationScore": {"type": "number", "valueNumber": 4, "content": "4"},
                    "EvaluatorName": {"type": "string", "valueString": "Dr. Reyes"}
                }
            }],
            "unknownTopLevel": true
        }"#;
        let result: AnalyzeResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.model_id.as_deref(), Some("rubric-v1"));
        let fields = result.primary_fields().unwrap();
        assert_eq!(fields["ProjectMotivationScore"].as_text().as_deref(), Some("4"));
        assert_eq!(fields["EvaluatorName"].as_text().as_deref(), Some("Dr. Reyes"));
    }

    #[test]
    fn test_value_order_prefers_number() {
        let value = FieldValue {
            value_number: Some(8.5),
            value_string: Some("eight".into()),
            content: Some("8 .5".into()),
            ..Default::default()
        };
        assert_eq!(value.as_text().as_deref(), Some("8.5"));

        let value = FieldValue {
            value_integer: Some(3),
            content: Some("3".into()),
            ..Default::default()
        };
        assert_eq!(value.as_text().as_deref(), Some("3"));

        let value = FieldValue {
            value_string: Some("  ".into()),
            content: Some("Team Falcon".into()),
            ..Default::default()
        };
        assert_eq!(value.as_text().as_deref(), Some("Team Falcon"));

        assert_eq!(FieldValue::default().as_text(), None);
    }

    #[test]
    fn test_full_text_fallbacks() {
        let with_lines = AnalyzeResult {
            pages: vec![Page {
                page_number: 1,
                lines: vec![
                    Line { content: "Budget: 3".into() },
                    Line { content: "Timeline: 4".into() },
                ],
            }],
            ..Default::default()
        };
        assert_eq!(with_lines.full_text(), "Budget: 3\nTimeline: 4");

        let with_markdown = AnalyzeResult {
            contents: vec![AnalyzedContent {
                markdown: Some("# Rubric\nBudget: 3".into()),
                fields: BTreeMap::new(),
            }],
            ..Default::default()
        };
        assert_eq!(with_markdown.full_text(), "# Rubric\nBudget: 3");
        assert_eq!(RawResult::Text("ocr".into()).text(), "ocr");
    }

    #[test]
    fn test_primary_fields_falls_back_to_contents() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "BudgetScore".to_string(),
            FieldValue {
                value_number: Some(2.0),
                ..Default::default()
            },
        );
        let result = AnalyzeResult {
            contents: vec![AnalyzedContent {
                markdown: None,
                fields,
            }],
            ..Default::default()
        };
        assert!(result.primary_fields().unwrap().contains_key("BudgetScore"));
        assert!(AnalyzeResult::default().primary_fields().is_none());
    }
}
