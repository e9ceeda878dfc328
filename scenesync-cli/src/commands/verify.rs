//! Verify command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use scenesync_core::{store, verify_pairs, VerificationReport};

use crate::utils::{banner, format_ratio, Output};

/// Execute the verify command.
pub fn execute(results: &Path, truth: &Path, out: Output) -> Result<()> {
    let result_pairs = store::read_pairs(results)
        .with_context(|| format!("Failed to read results file: {}", results.display()))?;
    let truth_pairs = store::read_truth(truth)
        .with_context(|| format!("Failed to read truth file: {}", truth.display()))?;

    let report = verify_pairs(&result_pairs, &truth_pairs).context("Verification failed")?;

    if out.json {
        return out.print_json(&report);
    }
    if !out.quiet {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &VerificationReport) {
    let m = &report.metrics;
    let d = &report.details;

    banner("VERIFICATION REPORT");

    println!("Total matches in results: {}", m.total_results);
    println!("Total matches in truth:   {}", m.total_truth);
    println!();

    println!("{}", "MATCHING ACCURACY:".bold());
    println!("  Correct matches:    {}", m.correct_matches.to_string().green());
    println!("  Incorrect matches:  {}", m.incorrect_matches.to_string().red());
    println!("  Missed matches:     {}", m.missed_matches.to_string().yellow());
    println!("  Extra matches:      {}", m.extra_matches.to_string().yellow());
    println!();

    println!("{}", "METRICS:".bold());
    println!("  Accuracy:  {}", format_ratio(m.accuracy));
    println!("  Precision: {}", format_ratio(m.precision));
    println!("  Recall:    {}", format_ratio(m.recall));
    println!("  F1 Score:  {:.3}", m.f1_score);
    println!();

    if !d.incorrect.is_empty() {
        println!("{}", "INCORRECT MATCHES:".red().bold());
        for item in &d.incorrect {
            println!(
                "  {} -> {} (should be {})",
                item.film_photo, item.result_scene_photo, item.truth_scene_photo
            );
        }
        println!();
    }

    if !d.missed.is_empty() {
        println!("{}", "MISSED MATCHES:".yellow().bold());
        for item in &d.missed {
            println!("  {} -> {} (not found in results)", item.film_photo, item.scene_photo);
        }
        println!();
    }

    if !d.extra.is_empty() {
        println!("{}", "EXTRA MATCHES:".yellow().bold());
        for item in &d.extra {
            println!("  {} -> {} (not in truth)", item.film_photo, item.scene_photo);
        }
        println!();
    }

    println!("{}", "=".repeat(60));
}
