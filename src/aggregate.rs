//! Combine per-chunk outcomes into the job-level result.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extraction::{ExtractError, RawResult};
use crate::models::{RubricRecord, ValidationIssue};
use crate::normalize::normalize;
use crate::pdf::ChunkInfo;

/// A chunk that produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkFailure {
    pub chunk_number: u32,
    pub start_page: u32,
    pub end_page: u32,
    pub error: String,
}

/// Records of every successful chunk, in page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub rubrics: Vec<RubricRecord>,
    pub total_chunks: u32,
    pub total_succeeded: u32,
    #[serde(default)]
    pub failures: Vec<ChunkFailure>,
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
}

impl Aggregate {
    pub fn total_failed(&self) -> u32 {
        self.total_chunks - self.total_succeeded
    }
}

/// Normalize and attach provenance to a successful chunk.
pub fn record_for(raw: &RawResult, info: ChunkInfo) -> RubricRecord {
    let mut record = normalize(raw);
    record.chunk_number = info.number;
    record.start_page = info.start_page;
    record.end_page = info.end_page;
    record
}

/// Build the aggregate. Outcomes are sorted by chunk number, so callers may
/// pass them in any order.
pub fn aggregate(mut outcomes: Vec<(Result<RawResult, ExtractError>, ChunkInfo)>) -> Aggregate {
    outcomes.sort_by_key(|(_, info)| info.number);

    let mut result = Aggregate {
        total_chunks: outcomes.len() as u32,
        ..Default::default()
    };

    for (outcome, info) in outcomes {
        match outcome {
            Ok(raw) => {
                let record = record_for(&raw, info);
                result.warnings.extend(record.validate());
                result.rubrics.push(record);
            }
            Err(e) => {
                warn!(
                    "Chunk {} (pages {}-{}) failed: {}",
                    info.number, info.start_page, info.end_page, e
                );
                result.failures.push(ChunkFailure {
                    chunk_number: info.number,
                    start_page: info.start_page,
                    end_page: info.end_page,
                    error: e.to_string(),
                });
            }
        }
    }

    result.total_succeeded = result.rubrics.len() as u32;
    result
}
