//! rubricly - rubric score extraction from scanned evaluation PDFs.
//!
//! A PDF holding several 3-page evaluation rubrics is split per rubric, each
//! chunk is analyzed by a cloud document-analysis service or by local OCR,
//! and the results are normalized into one score record per rubric.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod export;
pub mod extraction;
pub mod jobs;
pub mod models;
pub mod normalize;
pub mod pdf;
pub mod pipeline;
pub mod server;
