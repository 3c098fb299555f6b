//! CLI: argument parsing and output formatting only.
//! Orchestration lives in [`crate::pipeline`].

use crate::error::ThumbError;
use crate::pipeline::RunSummary;
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;

/// Build a content-addressed thumbnail cache for image files
#[derive(Parser, Debug)]
#[command(name = "thumbcache", version)]
#[command(about = "Generate cached JPEG thumbnails for every image under the given paths")]
pub struct Cli {
    /// Files or directories to process
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Map errors to a string for CLI output.
pub fn map_error(e: &ThumbError) -> String {
    format!("Error: {}", e)
}

/// One-line run summary. `styled` adds terminal emphasis.
pub fn format_summary(summary: &RunSummary, styled: bool) -> String {
    let label = "Done:";
    let label = if styled {
        format!("{}", label.bold())
    } else {
        label.to_string()
    };

    let mut line = format!(
        "{} {} files, {} thumbnails generated, {} already cached, {} skipped (smaller than target)",
        label, summary.files, summary.generated, summary.cached, summary.too_small
    );

    let failed = summary.failed_files();
    if failed > 0 {
        let failures = format!("{} files failed", failed);
        if styled {
            line.push_str(&format!(", {}", failures.red()));
        } else {
            line.push_str(&format!(", {}", failures));
        }
    }
    if summary.enumeration_errors > 0 {
        line.push_str(&format!(
            ", {} directories unreadable",
            summary.enumeration_errors
        ));
    }

    line
}
