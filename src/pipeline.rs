//! Chunk, analyze and aggregate one uploaded PDF.
//!
//! Chunks are analyzed strictly one after another. Progress is reported
//! through a [`ProgressSink`] so that the job tracker, the CLI and tests can
//! observe it in their own way.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::aggregate::{aggregate, Aggregate};
use crate::extraction::Extractor;
use crate::pdf::{self, ChunkError};

/// Receives progress for one pipeline run.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Chunking finished; `total_chunks` is now fixed.
    async fn chunked(&self, total_chunks: u32);

    /// Chunk `current_chunk` (1-based) has been analyzed, successfully or not.
    async fn chunk_finished(&self, current_chunk: u32, total_chunks: u32);
}

/// Sink that discards progress.
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn chunked(&self, _total_chunks: u32) {}

    async fn chunk_finished(&self, _current_chunk: u32, _total_chunks: u32) {}
}

/// Run the whole pipeline. Only a PDF that cannot be chunked fails the run;
/// failed chunks are reported inside the aggregate.
pub async fn process_pdf<E>(
    extractor: &E,
    pdf_bytes: &[u8],
    progress: &dyn ProgressSink,
) -> Result<Aggregate, ChunkError>
where
    E: Extractor + ?Sized,
{
    let chunks = pdf::split(pdf_bytes)?;
    let total = chunks.len() as u32;
    info!(
        "Split PDF into {} chunks, analyzing with {} backend",
        total,
        extractor.backend()
    );
    progress.chunked(total).await;

    let mut outcomes = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        debug!(
            "Analyzing chunk {}/{} (pages {}-{})",
            chunk.info.number, total, chunk.info.start_page, chunk.info.end_page
        );
        let outcome = extractor.analyze(&chunk.bytes).await;
        outcomes.push((outcome, chunk.info));
        progress.chunk_finished(chunk.info.number, total).await;
    }

    let result = aggregate(outcomes);
    info!(
        "Extracted {} of {} rubrics",
        result.total_succeeded, result.total_chunks
    );
    Ok(result)
}
