//! End-to-end processing through the public API with a scripted extractor.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object};

use rubricly::config::BackendKind;
use rubricly::export;
use rubricly::extraction::{ExtractError, Extractor, RawResult};
use rubricly::jobs::{JobStatus, JobStore};
use rubricly::models::{FieldKey, ScoreProblem};
use rubricly::pipeline::{process_pdf, NoProgress};

fn scanned_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Answers each call with a canned cloud response; the second call fails.
struct ScriptedCloud {
    calls: AtomicU32,
}

impl ScriptedCloud {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Extractor for ScriptedCloud {
    fn backend(&self) -> BackendKind {
        BackendKind::Cloud
    }

    async fn analyze(&self, _chunk: &[u8]) -> Result<RawResult, ExtractError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let analyze_result = match call {
            1 => serde_json::json!({
                "modelId": "rubric-v2",
                "documents": [{
                    "docType": "rubric-v2",
                    "fields": {
                        "ProjectMotivationScore": { "type": "number", "valueNumber": 4.0 },
                        "BudgetScore": { "type": "string", "content": "3.5" },
                        "GroupName": { "type": "string", "valueString": "Team Rocket" }
                    }
                }]
            }),
            2 => {
                return Err(ExtractError::Transport {
                    status: Some(500),
                    message: "internal error".to_string(),
                })
            }
            _ => serde_json::json!({
                "content": "Group Name: Night Owls\nBudget: 9\n"
            }),
        };
        let doc = serde_json::from_value(analyze_result)
            .map_err(|e| ExtractError::BackendFailure(e.to_string()))?;
        Ok(RawResult::Document(doc))
    }
}

#[tokio::test]
async fn test_scanned_batch_to_csv() {
    let result = process_pdf(&ScriptedCloud::new(), &scanned_pdf(7), &NoProgress)
        .await
        .unwrap();

    assert_eq!(result.total_chunks, 3);
    assert_eq!(result.total_succeeded, 2);
    assert_eq!(result.total_failed(), 1);
    assert_eq!(result.failures[0].chunk_number, 2);
    assert_eq!(
        (result.failures[0].start_page, result.failures[0].end_page),
        (4, 6)
    );

    let first = &result.rubrics[0];
    assert_eq!(first.get(FieldKey::ProjectMotivation), "4");
    assert_eq!(first.get(FieldKey::Budget), "3.5");
    assert_eq!(first.group_name, "Team Rocket");
    assert_eq!(first.total_score(), 7.5);

    let last = &result.rubrics[1];
    assert_eq!((last.chunk_number, last.start_page, last.end_page), (3, 7, 7));
    assert_eq!(last.group_name, "Night Owls");
    assert_eq!(last.get(FieldKey::Budget), "9");

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].chunk_number, 3);
    assert_eq!(result.warnings[0].problem, ScoreProblem::OutOfRange);

    let csv = export::to_csv(&result.rubrics);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], export::csv_header().join(","));

    let row: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(row.len(), 19);
    assert_eq!(&row[..4], &["1", "1", "3", "Team Rocket"]);
    assert_eq!(row[5], "4");
    assert_eq!(row[13], "3.5");
    assert_eq!(row[16], "7.5");
}

#[tokio::test]
async fn test_background_job_reaches_done() {
    let store = JobStore::new(Duration::from_secs(60));
    let id = store
        .spawn_job(Arc::new(ScriptedCloud::new()), scanned_pdf(6))
        .await;

    let mut job = store.get(&id).await.unwrap();
    for _ in 0..200 {
        if job.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        job = store.get(&id).await.unwrap();
    }

    assert_eq!(job.status, JobStatus::Done);
    assert_eq!((job.current_chunk, job.total_chunks), (2, 2));
    let result = job.result.unwrap();
    assert_eq!(result.total_succeeded, 1);
    assert_eq!(result.failures.len(), 1);
}

#[tokio::test]
async fn test_unreadable_upload_fails() {
    let err = process_pdf(&ScriptedCloud::new(), b"not a pdf", &NoProgress)
        .await
        .unwrap_err();
    assert!(!err.to_string().is_empty());
}
