use clap::Parser;
use corridas_dashboard::app;
use corridas_dashboard::config::ServerArgs;
use log::info;

/// Main entry point for the dashboard web application
///
/// Parses the server settings from the command line and environment, then
/// serves the dashboard until the listener fails.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    corridas_dashboard::init_logging();

    let args = ServerArgs::parse();
    info!(
        "Starting dashboard for table '{}' on {}",
        args.backend.table, args.bind
    );

    app::run(args).await
}
