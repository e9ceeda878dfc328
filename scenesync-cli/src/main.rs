//! Scene Sync CLI - match film photos to scene photos and verify the pairings.

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use scenesync_core::config::{
    DEFAULT_FAST_THRESHOLD, DEFAULT_GOOD_MATCH_PERCENT, DEFAULT_HIGH_THRESHOLD,
    DEFAULT_LOW_THRESHOLD, DEFAULT_MAX_FEATURES, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_MATCHES,
    DEFAULT_PYRAMID_LEVELS,
};
use scenesync_core::MatchConfig;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;
use utils::Output;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Invalid arguments or thresholds
  65  Malformed results, truth or reference file, or undecodable image
  66  Folder or input file not found
  74  Cannot write output";

#[derive(Parser)]
#[command(name = "scenesync")]
#[command(author, version, about = "Film to scene photo matching", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print nothing on success
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Matching thresholds shared by `match` and `inspect`.
#[derive(Args, Debug, Clone)]
struct MatchArgs {
    /// Maximum number of keypoints per image
    #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
    max_features: usize,

    /// Fraction of correspondences kept as good matches, in (0, 1]
    #[arg(long, default_value_t = DEFAULT_GOOD_MATCH_PERCENT)]
    good_match_percent: f64,

    /// Minimum correspondences for a pair to count
    #[arg(long, default_value_t = DEFAULT_MIN_MATCHES)]
    min_matches: usize,

    /// Minimum score for a candidate to be reported
    #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
    min_confidence: f64,

    /// Scores at or above this are confident matches
    #[arg(long, default_value_t = DEFAULT_HIGH_THRESHOLD)]
    high_threshold: f64,

    /// Scores below this are low-confidence candidates
    #[arg(long, default_value_t = DEFAULT_LOW_THRESHOLD)]
    low_threshold: f64,

    /// FAST corner intensity threshold
    #[arg(long, default_value_t = DEFAULT_FAST_THRESHOLD)]
    fast_threshold: u8,

    /// Image pyramid levels
    #[arg(long, default_value_t = DEFAULT_PYRAMID_LEVELS)]
    pyramid_levels: u8,

    /// Worker threads (default: one per core)
    #[arg(long)]
    threads: Option<usize>,
}

impl MatchArgs {
    fn to_config(&self) -> MatchConfig {
        MatchConfig {
            max_features: self.max_features,
            good_match_percent: self.good_match_percent,
            min_matches: self.min_matches,
            min_confidence: self.min_confidence,
            high_threshold: self.high_threshold,
            low_threshold: self.low_threshold,
            fast_threshold: self.fast_threshold,
            pyramid_levels: self.pyramid_levels,
            threads: self.threads,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Match photos between film and scene folders
    Match {
        /// Folder containing film photos
        #[arg(long, value_name = "DIR")]
        film_folder: PathBuf,

        /// Folder containing scene photos
        #[arg(long, value_name = "DIR")]
        scene_folder: PathBuf,

        /// Output file (.csv, or .json for JSON)
        #[arg(short, long, default_value = "output/results.csv")]
        output: PathBuf,

        /// Previously confirmed pairings to reuse instead of recomputing
        #[arg(long, value_name = "FILE")]
        reference: Option<PathBuf>,

        #[command(flatten)]
        thresholds: MatchArgs,
    },

    /// Verify matching results against ground truth and compute metrics
    Verify {
        /// Matching results file
        #[arg(long, value_name = "FILE")]
        results: PathBuf,

        /// Ground truth file with film_photo and scene_photo columns
        #[arg(long, value_name = "FILE")]
        truth: PathBuf,
    },

    /// List photo folders under the film and scene base directories
    ListFolders {
        #[arg(long, default_value = "film-photos")]
        film_base: PathBuf,

        #[arg(long, default_value = "scene-info")]
        scene_base: PathBuf,
    },

    /// Create the film, scene and output directories
    SetupDirectories {
        #[arg(long, default_value = "film-photos")]
        film_base: PathBuf,

        #[arg(long, default_value = "scene-info")]
        scene_base: PathBuf,

        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Show what a folder contains
    ValidateFolder {
        #[arg(long, value_name = "DIR")]
        folder: PathBuf,
    },

    /// Score a single film/scene pair and show the details
    Inspect {
        #[arg(long, value_name = "FILE")]
        film: PathBuf,

        #[arg(long, value_name = "FILE")]
        scene: PathBuf,

        #[command(flatten)]
        thresholds: MatchArgs,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                process::exit(exit_codes::USAGE_ERROR);
            }
        },
    };

    utils::init_tracing(cli.verbose);
    let out = Output {
        quiet: cli.quiet,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Match {
            film_folder,
            scene_folder,
            output,
            reference,
            thresholds,
        } => commands::matching::execute(
            &film_folder,
            &scene_folder,
            &output,
            reference.as_deref(),
            &thresholds.to_config(),
            out,
        ),
        Commands::Verify { results, truth } => commands::verify::execute(&results, &truth, out),
        Commands::ListFolders {
            film_base,
            scene_base,
        } => commands::folders::list(&film_base, &scene_base, out),
        Commands::SetupDirectories {
            film_base,
            scene_base,
            output_dir,
        } => commands::folders::setup(&film_base, &scene_base, &output_dir, out),
        Commands::ValidateFolder { folder } => commands::folders::validate(&folder, out),
        Commands::Inspect {
            film,
            scene,
            thresholds,
        } => commands::inspect::execute(&film, &scene, &thresholds.to_config(), out),
    };

    let exit = match result {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };
    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    process::exit(exit.code);
}
