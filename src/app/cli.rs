use std::future::Future;

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use super::error::AppError;
use crate::driver::Verdict;

/// Exit code of a run aborted by a fatal error
pub const FATAL_EXIT_CODE: i32 = 2;

/// Reusable CLI application runner that handles:
/// - Logging setup (`RUST_LOG`, default `info`, written to stderr)
/// - Signal handling (SIGINT, SIGTERM, SIGHUP)
/// - Exit codes (0 = passed, 1 = failed, 2 = fatal error, 128 + n on signal n)
pub struct CliApp {
    name: String,
}

impl CliApp {
    /// Create a new CLI application runner
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Install the stderr log subscriber
    ///
    /// Does nothing if a global subscriber is already set.
    pub fn with_logging(self) -> Self {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
        self
    }

    /// Run the application and exit with the code for its outcome
    ///
    /// This function never returns - it calls std::process::exit with the appropriate code
    pub async fn run<F, Fut>(self, main_fn: F) -> !
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Verdict, AppError>>,
    {
        // Race main application logic against signal reception
        let code = tokio::select! {
            result = main_fn() => self.exit_code(result),
            signal_code = self.wait_for_signal() => signal_code,
        };
        std::process::exit(code);
    }

    /// Exit code for the outcome of a run
    pub fn exit_code(&self, result: Result<Verdict, AppError>) -> i32 {
        match result {
            Ok(verdict) => verdict.exit_code(),
            Err(e) => {
                error!(app = %self.name, error = %e, "Run aborted");
                eprintln!("Error: {}", e);
                FATAL_EXIT_CODE
            }
        }
    }

    /// Wait for any Unix signal (SIGINT, SIGTERM, SIGHUP) or Ctrl+C
    /// Returns the exit code to use (130 for SIGINT, 143 for SIGTERM, etc.)
    async fn wait_for_signal(&self) -> i32 {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
            let mut sighup = signal(SignalKind::hangup()).expect("Failed to setup SIGHUP handler");

            tokio::select! {
                _ = sigterm.recv() => {
                    warn!(app = %self.name, "Received SIGTERM");
                    143 // 128 + 15
                }
                _ = sigint.recv() => {
                    warn!(app = %self.name, "Received SIGINT");
                    130 // 128 + 2
                }
                _ = sighup.recv() => {
                    warn!(app = %self.name, "Received SIGHUP");
                    129 // 128 + 1
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to setup Ctrl+C handler");
            warn!(app = %self.name, "Received Ctrl+C");
            130
        }
    }
}
