use clap::Parser;
use log::LevelFilter;

use suivi_vsx::app;
use suivi_vsx::config::Args;

/// Main entry point for the follow-up dashboard.
///
/// Parses the command line, initializes logging, then hands over to the web
/// application. The storage backend (local CSV file or remote spreadsheet
/// service) is chosen entirely from the arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    app::run(args).await
}
