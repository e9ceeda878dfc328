//! Common utility functions shared across CLI commands.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise logging to stderr. `RUST_LOG` overrides the default level.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// How a command should print its outcome.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub quiet: bool,
    pub json: bool,
}

impl Output {
    /// Whether human-readable text should be printed.
    pub fn human(&self) -> bool {
        !self.quiet && !self.json
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{text}");
        Ok(())
    }
}

/// `0.667 (66.7%)`
pub fn format_ratio(value: f64) -> String {
    format!("{:.3} ({:.1}%)", value, value * 100.0)
}

/// Score coloured by how it would be classified.
pub fn colored_score(score: f64, high: f64, low: f64) -> String {
    let text = format!("{score:.3}");
    if score >= high {
        text.green().to_string()
    } else if score < low {
        text.red().to_string()
    } else {
        text.yellow().to_string()
    }
}

pub fn rule() -> String {
    "-".repeat(50)
}

pub fn banner(title: &str) {
    let line = "=".repeat(60);
    println!("{line}");
    println!("{}", title.bold());
    println!("{line}");
}
