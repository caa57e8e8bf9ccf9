// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! heraldd: the herald broker daemon.

use std::process::ExitCode;

use herald_daemon::{env, Config, Daemon, DaemonError};
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("heraldd: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(serve(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "daemon failed");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: Config) -> Result<(), DaemonError> {
    let mut daemon = Daemon::new(config)?;
    daemon.start().await?;
    daemon.run().await
}

/// Log to stderr, or to `log_file` when configured. The returned guard
/// flushes the file writer on drop.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let directive = env::log_filter();
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("heraldd: invalid log filter {directive:?} ({e}); using info");
        EnvFilter::new("info")
    });

    let file = config.log_file.as_ref().and_then(|path| {
        let name = path.file_name()?.to_owned();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("heraldd: cannot create log directory {}: {e}", dir.display());
            return None;
        }
        Some(tracing_appender::rolling::never(dir, name))
    });

    match file {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
            None
        }
    }
}
