use clap::Parser;
use sdfcheck::prelude::*;

#[tokio::main]
async fn main() {
    // Usage errors exit with clap's code 2, the same as a fatal run error
    let options = RunOptions::from(Cli::parse());

    CliApp::new("sdfcheck")
        .with_logging()
        .run(|| execute_options(options))
        .await
}

/// Run the selected protocol, reporting failures as log events
async fn execute_options(options: RunOptions) -> Result<Verdict, AppError> {
    execute(&options, TracingReporter).await
}
