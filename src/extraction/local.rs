//! Local OCR backend: Poppler rasterization, preprocessing and Tesseract.
//!
//! Runs on the blocking thread pool. When rendering or recognition fails the
//! chunk's embedded text layer is used instead, so typed PDFs still work on
//! machines without the OCR toolchain.

use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, warn};

use super::{preprocess, tools, ExtractError, Extractor, RawResult};
use crate::config::{BackendKind, OcrSettings};
use crate::pdf;

/// OCR text of one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileText {
    pub filename: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tesseract-based extractor.
#[derive(Debug, Clone)]
pub struct LocalOcr {
    settings: OcrSettings,
}

impl LocalOcr {
    pub fn new(settings: OcrSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    pub fn is_available(&self) -> bool {
        tools::availability(&self.settings).ready()
    }

    pub fn availability_hint(&self) -> String {
        tools::availability_hint(&self.settings)
    }

    /// Recognize every page of a PDF and join the page texts with newlines.
    ///
    /// Blocking; call from `spawn_blocking`.
    pub fn recognize_pdf(&self, pdf_bytes: &[u8]) -> Result<String, ExtractError> {
        let ocr_error = match self.ocr_pages(pdf_bytes) {
            Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => {
                return Ok(pages.join("\n"));
            }
            Ok(_) => None,
            Err(e) => {
                warn!("OCR failed, falling back to embedded text: {}", e);
                Some(e)
            }
        };

        let embedded = pdf::embedded_text(pdf_bytes).unwrap_or_default();
        if embedded.iter().any(|p| !p.trim().is_empty()) {
            debug!("Using embedded text layer ({} pages)", embedded.len());
            return Ok(embedded.join("\n"));
        }

        match ocr_error {
            Some(e) => Err(e),
            None => Ok(String::new()),
        }
    }

    fn ocr_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let temp_dir = TempDir::new()?;
        let pdf_path = temp_dir.path().join("chunk.pdf");
        std::fs::write(&pdf_path, pdf_bytes)?;

        let images = self.render_pages(&pdf_path, temp_dir.path())?;
        if images.is_empty() {
            return Err(ExtractError::Ocr("pdftoppm produced no page images".to_string()));
        }

        let mut texts = Vec::with_capacity(images.len());
        for (i, image_path) in images.iter().enumerate() {
            let prepared = self.prepare_page(image_path, temp_dir.path(), i + 1)?;
            let text = self.run_tesseract(&prepared, &[])?;
            debug!("Page {}: {} characters", i + 1, text.len());
            texts.push(text);
        }
        Ok(texts)
    }

    /// Render every page of `pdf_path` to PNG inside `output_dir`.
    fn render_pages(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let output_prefix = output_dir.join("page");
        let dpi = self.settings.dpi.to_string();

        let output = Command::new(self.settings.pdftoppm_command())
            .args(["-png", "-r", &dpi])
            .arg(pdf_path)
            .arg(&output_prefix)
            .output();

        match output {
            Ok(o) if o.status.success() => Ok(find_page_images(output_dir)?),
            Ok(o) => Err(ExtractError::Ocr(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&o.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractError::ToolNotFound(
                "pdftoppm not found (install poppler-utils or set POPPLER_PATH)".to_string(),
            )),
            Err(e) => Err(ExtractError::Io(e)),
        }
    }

    /// Deskew and clean up one rendered page, returning the path of the image
    /// to feed to Tesseract.
    fn prepare_page(&self, image_path: &Path, work_dir: &Path, page: usize) -> Result<PathBuf, ExtractError> {
        let image = image::open(image_path)
            .map_err(|e| ExtractError::Ocr(format!("cannot read page image: {}", e)))?;

        let image = match self.detect_rotation(image_path) {
            Some(degrees) if degrees % 360 != 0 => {
                debug!("Page {}: rotating {} degrees", page, degrees);
                preprocess::rotate(image, degrees)
            }
            _ => image,
        };

        let cleaned = preprocess::preprocess(&image, self.settings.target_height);
        let out = work_dir.join(format!("prepared-{}.png", page));
        cleaned
            .save(&out)
            .map_err(|e| ExtractError::Ocr(format!("cannot write prepared image: {}", e)))?;
        Ok(out)
    }

    /// Orientation from Tesseract OSD. Failures mean "leave as-is".
    fn detect_rotation(&self, image_path: &Path) -> Option<u32> {
        match self.run_tesseract(image_path, &["--psm", "0"]) {
            Ok(osd) => preprocess::parse_osd_rotation(&osd),
            Err(e) => {
                debug!("Orientation detection skipped: {}", e);
                None
            }
        }
    }

    /// Run Tesseract on an image and return stdout. `mode` replaces the
    /// configured `--psm/--oem` arguments when non-empty.
    fn run_tesseract(&self, image_path: &Path, mode: &[&str]) -> Result<String, ExtractError> {
        let psm = self.settings.psm.to_string();
        let oem = self.settings.oem.to_string();
        let mut cmd = Command::new(self.settings.tesseract_command());
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", &self.settings.language]);
        if mode.is_empty() {
            cmd.args(["--psm", &psm, "--oem", &oem]);
        } else {
            cmd.args(mode);
        }

        match cmd.output() {
            Ok(output) if output.status.success() => {
                // OSD writes its report to stderr on some builds
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                if stdout.trim().is_empty() && !mode.is_empty() {
                    Ok(String::from_utf8_lossy(&output.stderr).to_string())
                } else {
                    Ok(stdout)
                }
            }
            Ok(output) => Err(ExtractError::Ocr(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractError::ToolNotFound(
                "tesseract not found (install tesseract-ocr or set TESSERACT_CMD)".to_string(),
            )),
            Err(e) => Err(ExtractError::Io(e)),
        }
    }

    /// OCR several uploaded PDFs, one after another.
    pub async fn extract_files(&self, files: Vec<(String, Vec<u8>)>) -> Vec<FileText> {
        let mut results = Vec::with_capacity(files.len());
        for (filename, bytes) in files {
            let ocr = self.clone();
            let outcome = tokio::task::spawn_blocking(move || ocr.recognize_pdf(&bytes))
                .await
                .unwrap_or_else(|e| Err(ExtractError::Ocr(format!("OCR task failed: {}", e))));
            results.push(match outcome {
                Ok(text) => FileText {
                    filename,
                    text,
                    error: None,
                },
                Err(e) => {
                    warn!("OCR of {} failed: {}", filename, e);
                    FileText {
                        filename,
                        text: String::new(),
                        error: Some(e.to_string()),
                    }
                }
            });
        }
        results
    }
}

/// Collect `page-N.png` files in page order. pdftoppm zero-pads N to the
/// width of the last page number.
fn find_page_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let ext = path.extension()?.to_str()?;
            if ext != "png" {
                return None;
            }
            let number = stem.strip_prefix("page-")?.parse().ok()?;
            Some((number, path))
        })
        .collect();
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

#[async_trait]
impl Extractor for LocalOcr {
    fn backend(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn analyze(&self, chunk: &[u8]) -> Result<RawResult, ExtractError> {
        let ocr = self.clone();
        let bytes = chunk.to_vec();
        let text = tokio::task::spawn_blocking(move || ocr.recognize_pdf(&bytes))
            .await
            .map_err(|e| ExtractError::Ocr(format!("OCR task failed: {}", e)))??;
        Ok(RawResult::Text(text))
    }
}
