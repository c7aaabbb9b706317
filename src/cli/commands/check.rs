//! Configuration and tool status report.

use console::style;

use crate::config::{BackendKind, Settings};
use crate::extraction::tools;

fn mark(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("✓ found").green()
    } else {
        style("✗ not found").red()
    }
}

pub fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("rubricly status").bold());
    println!("{}", "-".repeat(50));
    println!("  {:<15} {}", "Backend", style(settings.backend).cyan());

    println!("\n{}", style("Local OCR:").cyan());
    let status = tools::availability(&settings.ocr);
    println!(
        "  {:<15} {}",
        settings.ocr.tesseract_command().display(),
        mark(status.tesseract_available)
    );
    if let Some(version) = tools::tesseract_version(&settings.ocr) {
        println!("                  {}", style(version).dim());
    }
    println!(
        "  {:<15} {}",
        settings.ocr.pdftoppm_command().display(),
        mark(status.poppler_available)
    );
    if !status.ready() {
        println!(
            "                  {}",
            style(tools::availability_hint(&settings.ocr)).dim()
        );
    }
    println!(
        "  {:<15} {} / {} dpi / psm {}",
        "Settings", settings.ocr.language, settings.ocr.dpi, settings.ocr.psm
    );

    println!("\n{}", style("Cloud analysis:").cyan());
    let cloud = &settings.cloud;
    let show = |value: &Option<String>| match value {
        Some(v) => style(v.clone()).green(),
        None => style("not set".to_string()).dim(),
    };
    println!("  {:<15} {}", "Endpoint", show(&cloud.endpoint));
    println!("  {:<15} {}", "Model", show(&cloud.model_id));
    println!(
        "  {:<15} {}",
        "API key",
        if cloud.api_key.is_some() {
            style("set").green()
        } else {
            style("not set").dim()
        }
    );
    println!("  {:<15} {}", "API version", cloud.api_version());

    println!();
    match settings.validate() {
        Ok(()) => {
            println!(
                "{} Configuration is valid for the {} backend",
                style("✓").green(),
                settings.backend
            );
            if settings.backend == BackendKind::Local && !status.ready() {
                println!(
                    "  {} Scanned pages need Tesseract and Poppler",
                    style("!").yellow()
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}
