//! qtov CLI: render a quote caption onto a video.
//!
//! Usage:
//!   qtov '<job json>'          Job given as the only argument
//!   qtov < job.json            Job read from stdin
//!
//! On success a single line `{"success":true,"output":"<path>"}` is printed
//! to stdout. Logs go to stderr.

use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(
    name = "qtov",
    about = "Overlay a quote on a video, optionally with background music",
    version,
    author
)]
struct Cli {
    /// Job as a JSON string; read from stdin when omitted
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_config = qtov_common::config::AppConfig::load();

    // Initialize logging
    let mut logging = app_config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if cli.log_json {
        logging.json = true;
    }
    qtov_common::logging::init_logging(&logging);

    commands::render::run(cli.config, app_config)
}
