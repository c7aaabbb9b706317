//! PDF handling: splitting uploads into per-rubric chunks and reading the
//! embedded text layer.

mod chunker;

pub use chunker::{
    embedded_text, page_count, split, split_with, Chunk, ChunkError, ChunkInfo, PAGES_PER_RUBRIC,
};

#[cfg(test)]
pub(crate) use chunker::tests::{blank_pdf, text_pdf};
