//! Thumbcache CLI Binary
//!
//! Walks the given paths and fills the thumbnail cache.

use clap::Parser;
use std::io::IsTerminal;
use std::process;
use thumbcache::cli::{format_summary, map_error, Cli};
use thumbcache::config::ConfigLoader;
use thumbcache::logging::init_logging;
use thumbcache::pipeline::Pipeline;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("{}", map_error(&e));
        process::exit(1);
    }

    let pipeline = match Pipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Error initializing thumbnail cache: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    let summary = pipeline.run(&cli.paths);
    info!(
        files = summary.files,
        generated = summary.generated,
        failed = summary.failed_files(),
        "Run complete"
    );

    // Respects NO_COLOR and TTY
    let styled = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    println!("{}", format_summary(&summary, styled));
}
