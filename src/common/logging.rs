//! Logging and tracing configuration
//!
//! Logs go to the console and to an execution log file under the
//! configured log directory.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

/// Build the level filter
///
/// `RUST_LOG` wins when set. Otherwise INFO for this crate (DEBUG when
/// verbose), WARN for dependencies.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("lbprobe=debug,warn")
        } else {
            EnvFilter::new("lbprobe=info,warn")
        }
    })
}

/// Stream that receives console log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Stdout,
    Stderr,
}

impl Console {
    /// Keep stdout clean when it carries a machine-readable report
    pub fn for_report(json: bool) -> Self {
        if json {
            Console::Stderr
        } else {
            Console::Stdout
        }
    }

    fn writer(self) -> BoxMakeWriter {
        match self {
            Console::Stdout => BoxMakeWriter::new(std::io::stdout),
            Console::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Initialize tracing for a test run (console + log file)
///
/// The returned guard flushes the file writer on drop and must be held
/// until the process exits. Returns `None` if the log directory could not
/// be created, in which case only console logging is installed.
pub fn init_cli(verbose: bool, log_dir: &Path, console: Console) -> Option<WorkerGuard> {
    let console_layer = fmt::layer()
        .with_writer(console.writer())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    match paths::ensure_dir(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(log_dir, paths::LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true);

            tracing_subscriber::registry()
                .with(filter(verbose))
                .with(console_layer)
                .with(file_layer)
                .init();

            Some(guard)
        }
        Err(e) => {
            eprintln!(
                "Warning: Could not create log directory '{}': {}",
                log_dir.display(),
                e
            );
            tracing_subscriber::registry()
                .with(filter(verbose))
                .with(console_layer)
                .init();
            None
        }
    }
}

/// Initialize stdout-only tracing for commands that don't run tests
pub fn init_plain() {
    tracing_subscriber::registry()
        .with(filter(false))
        .with(fmt::layer().with_target(false).compact())
        .init();
}
