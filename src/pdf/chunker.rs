//! Split a multi-rubric PDF into fixed-size page groups.

use lopdf::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pages per rubric form.
pub const PAGES_PER_RUBRIC: u32 = 3;

/// Errors from chunking.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("PDF has no pages")]
    EmptyDocument,

    #[error("Invalid PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Position of a chunk within its source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    /// Sequential chunk number, starting at 1.
    pub number: u32,
    /// First page (1-based).
    pub start_page: u32,
    /// Last page (1-based, inclusive).
    pub end_page: u32,
}

impl ChunkInfo {
    pub fn page_count(&self) -> u32 {
        self.end_page + 1 - self.start_page
    }
}

/// A standalone PDF holding one rubric's pages.
#[derive(Clone)]
pub struct Chunk {
    pub info: ChunkInfo,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("info", &self.info)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Count the pages of a PDF.
pub fn page_count(pdf: &[u8]) -> Result<u32, ChunkError> {
    let doc = Document::load_mem(pdf)?;
    Ok(doc.get_pages().len() as u32)
}

/// Split into chunks of [`PAGES_PER_RUBRIC`] pages.
pub fn split(pdf: &[u8]) -> Result<Vec<Chunk>, ChunkError> {
    split_with(pdf, PAGES_PER_RUBRIC)
}

/// Split into chunks of `pages_per_chunk` pages. The last chunk holds the
/// remainder.
pub fn split_with(pdf: &[u8], pages_per_chunk: u32) -> Result<Vec<Chunk>, ChunkError> {
    let pages_per_chunk = pages_per_chunk.max(1);
    let source = Document::load_mem(pdf)?;
    let total = source.get_pages().len() as u32;
    if total == 0 {
        return Err(ChunkError::EmptyDocument);
    }

    let mut chunks = Vec::with_capacity(total.div_ceil(pages_per_chunk) as usize);
    let mut start = 1;
    while start <= total {
        let end = (start + pages_per_chunk - 1).min(total);
        let info = ChunkInfo {
            number: chunks.len() as u32 + 1,
            start_page: start,
            end_page: end,
        };
        let bytes = extract_range(&source, info, total)?;
        tracing::debug!(
            "Chunk {}: pages {}-{} ({} bytes)",
            info.number,
            start,
            end,
            bytes.len()
        );
        chunks.push(Chunk { info, bytes });
        start = end + 1;
    }

    Ok(chunks)
}

/// Build a new document that keeps only the pages of `info`.
fn extract_range(source: &Document, info: ChunkInfo, total: u32) -> Result<Vec<u8>, ChunkError> {
    let mut doc = source.clone();
    let drop: Vec<u32> = (1..=total)
        .filter(|p| *p < info.start_page || *p > info.end_page)
        .collect();
    if !drop.is_empty() {
        doc.delete_pages(&drop);
        doc.prune_objects();
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Read the embedded (typed) text layer of every page, one entry per page.
///
/// Scanned rubrics usually have no text layer; callers treat an empty
/// result as "nothing found" rather than an error.
pub fn embedded_text(pdf: &[u8]) -> Result<Vec<String>, ChunkError> {
    let doc = Document::load_mem(pdf)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut texts = Vec::with_capacity(pages.len());
    for page in pages {
        match doc.extract_text(&[page]) {
            Ok(text) => texts.push(text),
            Err(e) => {
                tracing::debug!("No text layer on page {}: {}", page, e);
                texts.push(String::new());
            }
        }
    }
    Ok(texts)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Object, ObjectId};

    /// Build a PDF with `pages` blank pages. Page `n` gets a MediaBox width
    /// of `600 + n` so tests can tell pages apart after splitting.
    pub(crate) fn blank_pdf(pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (1..=pages)
            .map(|n| {
                let page_id: ObjectId = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), (600 + n as i64).into(), 800.into()],
                });
                page_id.into()
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

    /// Build a PDF with one page per entry of `pages`, each page carrying the
    /// given lines as a Helvetica text layer.
    pub(crate) fn text_pdf(pages: &[&[&str]]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::Stream;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new(
                    "Td",
                    vec![72.into(), (720 - 20 * i as i64).into()],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
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

    /// MediaBox widths of every page, in page order.
    fn page_widths(pdf: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_dictionary(*id).unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                media_box[2].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_seven_pages_split_into_three_chunks() {
        let pdf = blank_pdf(7);
        let chunks = split(&pdf).unwrap();

        let ranges: Vec<(u32, u32, u32)> = chunks
            .iter()
            .map(|c| (c.info.number, c.info.start_page, c.info.end_page))
            .collect();
        assert_eq!(ranges, vec![(1, 1, 3), (2, 4, 6), (3, 7, 7)]);

        assert_eq!(page_widths(&chunks[0].bytes), vec![601, 602, 603]);
        assert_eq!(page_widths(&chunks[1].bytes), vec![604, 605, 606]);
        assert_eq!(page_widths(&chunks[2].bytes), vec![607]);
    }

    #[test]
    fn test_chunks_cover_every_page_once() {
        for total in 1..=10u32 {
            let pdf = blank_pdf(total);
            let chunks = split(&pdf).unwrap();
            assert_eq!(chunks.len() as u32, total.div_ceil(PAGES_PER_RUBRIC));

            let mut seen = Vec::new();
            let mut expected_start = 1;
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.info.number, i as u32 + 1);
                assert_eq!(chunk.info.start_page, expected_start);
                assert!(chunk.info.page_count() <= PAGES_PER_RUBRIC);
                assert_eq!(page_count(&chunk.bytes).unwrap(), chunk.info.page_count());
                seen.extend(page_widths(&chunk.bytes));
                expected_start = chunk.info.end_page + 1;
            }
            let all: Vec<i64> = (1..=total as i64).map(|n| 600 + n).collect();
            assert_eq!(seen, all, "total pages {}", total);
        }
    }

    #[test]
    fn test_exact_multiple_has_no_short_chunk() {
        let chunks = split(&blank_pdf(6)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].info.start_page, 4);
        assert_eq!(chunks[1].info.end_page, 6);
    }

    #[test]
    fn test_custom_chunk_size() {
        let chunks = split_with(&blank_pdf(5), 2).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].info.start_page, 5);
        assert_eq!(chunks[2].info.end_page, 5);
    }

    #[test]
    fn test_zero_pages_is_empty_document() {
        let err = split(&blank_pdf(0)).unwrap_err();
        assert!(matches!(err, ChunkError::EmptyDocument));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = split(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ChunkError::Pdf(_)));
    }

    #[test]
    fn test_split_is_deterministic() {
        let pdf = blank_pdf(4);
        let a = split(&pdf).unwrap();
        let b = split(&pdf).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.info, y.info);
            assert_eq!(x.bytes, y.bytes);
        }
    }

    #[test]
    fn test_embedded_text_one_entry_per_page() {
        let texts = embedded_text(&blank_pdf(2)).unwrap();
        assert_eq!(texts.len(), 2);
    }

    #[test]
    fn test_embedded_text_reads_text_layer() {
        let pdf = text_pdf(&[&["Group Name: Falcon"], &["Budget: 4"]]);
        let texts = embedded_text(&pdf).unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("Group Name: Falcon"));
        assert!(texts[1].contains("Budget: 4"));
    }

    #[test]
    fn test_text_survives_splitting() {
        let pdf = text_pdf(&[&["one"], &["two"], &["three"], &["four"]]);
        let chunks = split(&pdf).unwrap();
        assert_eq!(chunks.len(), 2);
        let second = embedded_text(&chunks[1].bytes).unwrap();
        assert_eq!(second.len(), 1);
        assert!(second[0].contains("four"));
    }
}
