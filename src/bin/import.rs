use clap::Parser;
use corridas_dashboard::config::ImportArgs;
use corridas_dashboard::upload::{self, SelectedFile, UploadForm};
use std::process::ExitCode;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

// Headless counterpart of the upload form: same pipeline, messages on stdout/stderr.
#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    corridas_dashboard::init_logging();

    let args = ImportArgs::parse();
    let client = args.backend.client()?;

    let form = UploadForm::shared();
    upload::lock(&form).select_file(SelectedFile::from_path(&args.file));

    let started = Instant::now();
    let result = upload::watch_progress(
        &form,
        PROGRESS_INTERVAL,
        upload::run_upload(&form, &client, &args.backend.table, || {}),
        |progress| println!("{}", progress.label()),
    )
    .await;
    let elapsed = started.elapsed().as_secs_f64();

    let state = upload::lock(&form);
    match result {
        Ok(_) => {
            println!("{}", state.success().unwrap_or_default());
            println!("[{:.1}s]", elapsed);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let message = state.error().map(str::to_string).unwrap_or_else(|| err.user_message());
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}
