//! One-shot processing of a PDF from the command line.

use std::path::Path;

use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::aggregate::Aggregate;
use crate::config::Settings;
use crate::export;
use crate::extraction::ExtractionClient;
use crate::models::{FieldKey, ScoreProblem};
use crate::pipeline::{self, ProgressSink};

/// Progress bar over chunks.
struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(bar_style);
        bar.set_message("Analyzing rubrics...");
        Self { bar }
    }
}

#[async_trait]
impl ProgressSink for ConsoleProgress {
    async fn chunked(&self, total_chunks: u32) {
        self.bar.set_length(total_chunks as u64);
    }

    async fn chunk_finished(&self, current_chunk: u32, _total_chunks: u32) {
        self.bar.set_position(current_chunk as u64);
    }
}

/// Extract scores from `file`, print them, and optionally write a CSV.
pub async fn cmd_process(
    settings: &Settings,
    file: &Path,
    csv: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    settings.validate()?;

    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    let extractor = ExtractionClient::from_settings(settings);
    let progress = ConsoleProgress::new();
    let result = pipeline::process_pdf(&extractor, &bytes, &progress).await;
    progress.bar.finish_and_clear();
    let result = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if let Some(path) = csv {
        tokio::fs::write(path, export::to_csv(&result.rubrics)).await?;
        if !json {
            println!(
                "\n{} Wrote {} rows to {}",
                style("✓").green(),
                result.rubrics.len(),
                path.display()
            );
        }
    }

    Ok(())
}

fn print_summary(result: &Aggregate) {
    println!(
        "\n{} {} of {} rubrics extracted",
        style("→").cyan(),
        style(result.total_succeeded).bold(),
        result.total_chunks
    );

    for record in &result.rubrics {
        let missing = record.missing();
        let group = record.get(FieldKey::GroupName);
        println!(
            "  #{:<3} pages {}-{}  {:<24} total {:>6.2}{}",
            record.chunk_number,
            record.start_page,
            record.end_page,
            if group.is_empty() { "-" } else { group },
            record.total_score(),
            if missing.is_empty() {
                String::new()
            } else {
                format!("  ({} empty)", missing.len())
            }
        );
    }

    if !result.failures.is_empty() {
        println!("\n{}", style("Failed chunks:").red());
        for failure in &result.failures {
            println!(
                "  {} #{} pages {}-{}: {}",
                style("✗").red(),
                failure.chunk_number,
                failure.start_page,
                failure.end_page,
                failure.error
            );
        }
    }

    if !result.warnings.is_empty() {
        println!("\n{}", style("Scores to review:").yellow());
        for issue in &result.warnings {
            let problem = match issue.problem {
                ScoreProblem::NotNumeric => "not a number",
                ScoreProblem::OutOfRange => "out of range",
            };
            println!(
                "  {} #{} {} = {:?} ({})",
                style("!").yellow(),
                issue.chunk_number,
                issue.field,
                issue.value,
                problem
            );
        }
    }
}
