//! Folder listing, validation and setup commands.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use scenesync_core::library::SUPPORTED_EXTENSIONS;
use scenesync_core::{available_folders, setup_directories, validate_folder};
use serde_json::json;

use crate::utils::{rule, Output};

/// Photo names shown by `validate-folder`.
const SAMPLE_SIZE: usize = 10;

/// Execute the list-folders command.
pub fn list(film_base: &Path, scene_base: &Path, out: Output) -> Result<()> {
    let film = available_folders(film_base)
        .with_context(|| format!("Failed to list {}", film_base.display()))?;
    let scene = available_folders(scene_base)
        .with_context(|| format!("Failed to list {}", scene_base.display()))?;

    if out.json {
        return out.print_json(&json!({ "film_folders": film, "scene_folders": scene }));
    }
    if out.quiet {
        return Ok(());
    }

    println!("Available folders:");
    println!("{}", rule());
    print_folder_list("Film photo folders", film_base, &film);
    println!();
    print_folder_list("Scene photo folders", scene_base, &scene);
    Ok(())
}

fn print_folder_list(title: &str, base: &Path, folders: &[String]) {
    println!("{} ({}):", title.bold(), base.display());
    if folders.is_empty() {
        println!("  {}", "No folders found".dimmed());
    }
    for folder in folders {
        println!("  - {folder}");
    }
}

/// Execute the setup-directories command.
pub fn setup(film_base: &Path, scene_base: &Path, output_dir: &Path, out: Output) -> Result<()> {
    let created = setup_directories(film_base, scene_base, output_dir)
        .context("Failed to create directories")?;

    if out.json {
        return out.print_json(&json!({ "directories": created }));
    }
    if out.human() {
        for dir in &created {
            println!("Created directory: {}", dir.display());
        }
        println!();
        println!("{}", "Directory structure created successfully!".green());
        println!(
            "You can now add your photos to the {} and {} directories.",
            film_base.display(),
            scene_base.display()
        );
    }
    Ok(())
}

/// Execute the validate-folder command.
pub fn validate(folder: &Path, out: Output) -> Result<()> {
    let summary = validate_folder(folder, SAMPLE_SIZE)
        .with_context(|| format!("Failed to read folder: {}", folder.display()))?;

    if out.json {
        return out.print_json(&summary);
    }
    if out.quiet {
        return Ok(());
    }

    println!("Folder: {}", folder.display());
    println!("Total image files: {}", summary.image_count);
    println!("Supported formats: {}", SUPPORTED_EXTENSIONS.join(", "));

    if summary.image_count == 0 {
        println!();
        println!("{}", "No image files found in this folder.".yellow());
        println!("Make sure the folder contains files with these extensions:");
        for ext in SUPPORTED_EXTENSIONS {
            println!("  - .{ext}");
        }
        return Ok(());
    }

    println!("Formats present: {}", summary.formats_found.join(", "));
    println!();
    println!("Image files found:");
    for name in &summary.sample {
        println!("  - {name}");
    }
    if summary.remaining() > 0 {
        println!("  ... and {} more files", summary.remaining());
    }
    Ok(())
}
