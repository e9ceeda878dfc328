//! Match command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use scenesync_core::{
    store, BatchOrchestrator, FsLibrary, MatchConfig, MatchRecord, ReferenceTable, RunSummary,
};
use serde::Serialize;
use tracing::info;

use crate::utils::{colored_score, rule, Output};

/// Number of best matches shown after a run.
const TOP_MATCHES: usize = 5;

#[derive(Serialize)]
struct MatchOutput<'a> {
    output_file: &'a Path,
    summary: &'a RunSummary,
    results: Vec<MatchRecord>,
}

/// Execute the match command.
pub fn execute(
    film_folder: &Path,
    scene_folder: &Path,
    output: &Path,
    reference: Option<&Path>,
    config: &MatchConfig,
    out: Output,
) -> Result<()> {
    config.validate().context("Invalid matching thresholds")?;

    let reference = match reference {
        Some(path) => store::read_reference(path)
            .with_context(|| format!("Failed to read reference table: {}", path.display()))?,
        None => ReferenceTable::new(),
    };

    if out.human() {
        println!("Starting photo matching...");
        println!("Film folder: {}", film_folder.display());
        println!("Scene folder: {}", scene_folder.display());
        println!("Output file: {}", output.display());
        println!("Max features: {}", config.max_features);
        println!("Good match percent: {}", config.good_match_percent);
        if !reference.is_empty() {
            println!("Reference entries: {}", reference.len());
        }
        println!("{}", rule());
    }

    let run = BatchOrchestrator::new(&FsLibrary, &FsLibrary)
        .run(film_folder, scene_folder, config, &reference)
        .context("Matching failed")?;

    store::write_results(output, &run.results)
        .with_context(|| format!("Failed to write results: {}", output.display()))?;
    info!(path = %output.display(), "Results saved");

    if out.json {
        return out.print_json(&MatchOutput {
            output_file: output,
            summary: &run.summary,
            results: run.records(),
        });
    }
    if out.quiet {
        return Ok(());
    }

    let summary = &run.summary;
    if summary.total_matches == 0 {
        println!("{}", "No matches found with sufficient confidence.".yellow());
    } else {
        println!();
        println!("{}", "Matching completed successfully!".green().bold());
        println!("Found {} matches", summary.total_matches);
    }
    println!(
        "  {} {}   {} {}   {} {}   {} {}",
        "New:".dimmed(),
        summary.new_matches,
        "Confident:".dimmed(),
        summary.confident_matches,
        "From reference:".dimmed(),
        summary.existing_matches,
        "Unmatched:".dimmed(),
        summary.unmatched
    );
    for film in &summary.stale_references {
        println!(
            "  {} reference entry {} has no photo in {}",
            "warning:".yellow(),
            film,
            film_folder.display()
        );
    }
    for photo in &summary.unreadable_photos {
        println!("  {} could not read {}", "warning:".yellow(), photo);
    }
    println!("Results saved to: {}", output.display());

    let top = run.top(TOP_MATCHES);
    if !top.is_empty() {
        println!();
        println!("Top matches:");
        for (i, result) in top.iter().enumerate() {
            let marker = if result.decision.is_reused() {
                " (reference)".dimmed().to_string()
            } else {
                String::new()
            };
            println!(
                "{}. {} -> {} (confidence: {}){}",
                i + 1,
                result.film_photo,
                result.scene_photo.as_deref().unwrap_or("-"),
                colored_score(
                    result.confidence_score(),
                    config.high_threshold,
                    config.low_threshold
                ),
                marker
            );
        }
    }

    Ok(())
}
