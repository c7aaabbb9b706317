//! Write each rubric of a PDF to its own file.

use std::path::{Path, PathBuf};

use console::style;

use crate::pdf::{self, Chunk};

pub fn cmd_split(file: &Path, out: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let chunks = pdf::split(&bytes)?;

    std::fs::create_dir_all(out)?;
    for chunk in &chunks {
        let path = chunk_path(out, chunk);
        std::fs::write(&path, &chunk.bytes)?;
        println!("  {} {}", style("✓").green(), path.display());
    }

    println!(
        "\n{} Split {} into {} chunks",
        style("→").cyan(),
        file.display(),
        chunks.len()
    );
    Ok(())
}

fn chunk_path(out: &Path, chunk: &Chunk) -> PathBuf {
    out.join(format!(
        "chunk-{:03}-p{}-{}.pdf",
        chunk.info.number, chunk.info.start_page, chunk.info.end_page
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::blank_pdf;

    #[test]
    fn test_split_writes_numbered_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scans.pdf");
        std::fs::write(&source, blank_pdf(7)).unwrap();
        let out = dir.path().join("chunks");

        cmd_split(&source, &out).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "chunk-001-p1-3.pdf",
                "chunk-002-p4-6.pdf",
                "chunk-003-p7-7.pdf"
            ]
        );
        let last = std::fs::read(out.join("chunk-003-p7-7.pdf")).unwrap();
        assert_eq!(pdf::page_count(&last).unwrap(), 1);
    }
}
