//! Discovery of the external OCR binaries.

use std::path::Path;
use std::process::Command;

use serde::Serialize;

use crate::config::OcrSettings;

/// Presence of the local OCR toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStatus {
    pub tesseract_available: bool,
    pub poppler_available: bool,
}

impl ToolStatus {
    pub fn ready(&self) -> bool {
        self.tesseract_available && self.poppler_available
    }
}

/// Whether an executable can be resolved, either as a path or on `PATH`.
pub fn check_binary(cmd: &Path) -> bool {
    which::which(cmd).is_ok()
}

pub fn availability(ocr: &OcrSettings) -> ToolStatus {
    ToolStatus {
        tesseract_available: check_binary(&ocr.tesseract_command()),
        poppler_available: check_binary(&ocr.pdftoppm_command()),
    }
}

/// Install hint for whatever is missing.
pub fn availability_hint(ocr: &OcrSettings) -> String {
    let status = availability(ocr);
    if !status.tesseract_available {
        "Tesseract not installed. Install with: apt install tesseract-ocr (or set TESSERACT_CMD)"
            .to_string()
    } else if !status.poppler_available {
        "pdftoppm not installed. Install with: apt install poppler-utils (or set POPPLER_PATH)"
            .to_string()
    } else {
        "Tesseract and Poppler are available".to_string()
    }
}

/// First line of `tesseract --version`.
pub fn tesseract_version(ocr: &OcrSettings) -> Option<String> {
    let output = Command::new(ocr.tesseract_command())
        .arg("--version")
        .output()
        .ok()?;
    // Older releases print the version on stderr
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).to_string()
    };
    text.lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}
