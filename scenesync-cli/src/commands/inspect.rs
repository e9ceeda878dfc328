//! Inspect command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use scenesync_core::{inspect_pair, ConfidenceTier, FsLibrary, MatchConfig};

use crate::utils::{colored_score, Output};

/// Execute the inspect command.
pub fn execute(film: &Path, scene: &Path, config: &MatchConfig, out: Output) -> Result<()> {
    let report = inspect_pair(&FsLibrary, film, scene, config).context("Inspection failed")?;

    if out.json {
        return out.print_json(&report);
    }
    if out.quiet {
        return Ok(());
    }

    let tier = match report.tier {
        ConfidenceTier::High => "HIGH".green().bold(),
        ConfidenceTier::Medium => "MEDIUM".yellow().bold(),
        ConfidenceTier::Low => "LOW".red().bold(),
    };

    println!("{} -> {}", report.film_photo.bold(), report.scene_photo.bold());
    println!("   {} {} / {}", "Keypoints:".dimmed(), report.film_keypoints, report.scene_keypoints);
    println!("   {} {}", "Correspondences:".dimmed(), report.correspondence_count);
    println!(
        "   {} {} (mean distance {:.1})",
        "Good matches:".dimmed(),
        report.good_count,
        report.mean_distance
    );
    println!(
        "   {} {}",
        "Confidence:".dimmed(),
        colored_score(report.confidence_score, config.high_threshold, config.low_threshold)
    );
    println!("   {} {}", "Tier:".dimmed(), tier);
    println!(
        "   {} {}",
        "Would match:".dimmed(),
        if report.clears { "yes".green() } else { "no".red() }
    );
    Ok(())
}
