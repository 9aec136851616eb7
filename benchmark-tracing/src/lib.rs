//! This crate configures logging for the benchmark binaries. Logging is performed through the
//! [tracing] family of crates; callers use the normal `tracing` macros and let this crate deal
//! with installing a subscriber.
//!
//! # Example
//! ```rust
//! use clap::Parser;
//!
//! #[derive(Debug, Parser)]
//! struct Options {
//!     #[command(flatten)]
//!     tracing: benchmark_tracing::Options,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = Options::parse_from(["example"]);
//!
//!     // Keep the guard alive for the duration of the program so file logs get flushed
//!     let _guard = options.tracing.init("example")?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod error;
pub use error::Error;
mod logformat;
pub use logformat::LogFormat;

fn warn_if_debug_build() {
    #[cfg(debug_assertions)]
    tracing::warn!("Running a debug build, timings will not be representative")
}

#[derive(Debug, Clone, Args)]
#[group(id = "logging")]
pub struct Options {
    /// Optional path to write logs to. If set, logs will rollover based on the chosen
    /// `log_rotation` policy, which defaults to daily.
    /// Logs will be written to `<service-name>.log` within this path.
    #[arg(long, env = "LOG_PATH")]
    pub log_path: Option<PathBuf>,

    /// Log rotation to use if a log file is set. Does nothing if no log file is set.
    #[arg(long, env = "LOG_ROTATION", default_value = "daily", value_enum)]
    pub log_rotation: RotationCadence,

    /// Format to use when emitting log events.
    #[arg(long, env = "LOG_FORMAT", default_value = "compact", value_enum)]
    pub log_format: LogFormat,

    /// Disable colors in all log output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log level filter for spans and events, as a comma separated list of directives.
    /// See [`tracing_subscriber::EnvFilter`] for full documentation on the directive syntax.
    ///
    /// Examples:
    ///
    /// ```bash
    /// LOG_LEVEL=info
    /// LOG_LEVEL=debug,tokio_postgres=warn
    /// ```
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_path: None,
            log_rotation: RotationCadence::Daily,
            log_format: LogFormat::Compact,
            no_color: false,
            log_level: "info".to_owned(),
        }
    }
}

/// The rotation policy for log files
// Rotation itself can't be parsed from the command line, hence the wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum RotationCadence {
    /// Rotate logs daily
    Daily,
    /// Rotate logs hourly
    Hourly,
    /// Rotate logs minutely
    Minutely,
    /// Never rotate logs
    Never,
}

impl From<RotationCadence> for Rotation {
    fn from(value: RotationCadence) -> Self {
        match value {
            RotationCadence::Daily => Rotation::DAILY,
            RotationCadence::Hourly => Rotation::HOURLY,
            RotationCadence::Minutely => Rotation::MINUTELY,
            RotationCadence::Never => Rotation::NEVER,
        }
    }
}

/// Installs the global subscriber with the fmt layer shaped by `self.log_format`.
// This is a macro rather than a fn because the layer types are embedded into the subscriber type
macro_rules! log_format_init {
    ($self:expr, $subscriber:expr, $fmt_layer:expr) => {
        match $self.log_format {
            LogFormat::Compact => $subscriber.with($fmt_layer.compact()).try_init(),
            LogFormat::Full => $subscriber.with($fmt_layer).try_init(),
            LogFormat::Pretty => $subscriber.with($fmt_layer.pretty()).try_init(),
            LogFormat::Json => $subscriber
                .with($fmt_layer.json().with_current_span(true))
                .try_init(),
        }
    };
}

impl Options {
    /// Overrides the configured log level with `debug`, keeping any per-target directives
    /// that were passed alongside the default level.
    pub fn enable_debug(&mut self) {
        let targets = self
            .log_level
            .split(',')
            .filter(|directive| directive.contains('='))
            .collect::<Vec<_>>();
        self.log_level = std::iter::once("debug")
            .chain(targets)
            .collect::<Vec<_>>()
            .join(",");
    }

    /// Sets up a non-blocking file appender with the configured log rotation policy.
    /// The returned WorkerGuard must be kept in scope for the duration of the process, its Drop
    /// is what flushes the logs.
    fn setup_file_appender(
        &self,
        log_path: &Path,
        service_name: &str,
    ) -> (NonBlocking, WorkerGuard) {
        tracing_appender::non_blocking(RollingFileAppender::new(
            self.log_rotation.into(),
            log_path,
            format!("{service_name}.log"),
        ))
    }

    /// Entrypoint to the logging subsystem. Events go to stdout, or to a rolling file under
    /// `log_path` when one is configured.
    ///
    /// # Worker Guard
    /// When logging to a file, the returned [`WorkerGuard`] **must** be kept alive for the entire
    /// duration of the program. If dropped early, pending logs will not be flushed to disk.
    pub fn init(&self, service_name: &str) -> Result<Option<WorkerGuard>, Error> {
        let filter = EnvFilter::try_new(&self.log_level)?;
        let subscriber = tracing_subscriber::registry().with(filter);

        let guard = match &self.log_path {
            Some(log_path) => {
                let (non_blocking, guard) = self.setup_file_appender(log_path, service_name);
                let fmt_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
                log_format_init!(self, subscriber, fmt_layer)?;
                Some(guard)
            }
            None => {
                let fmt_layer = fmt::layer()
                    .with_ansi(!self.no_color)
                    .with_writer(std::io::stdout);
                log_format_init!(self, subscriber, fmt_layer)?;
                None
            }
        };

        warn_if_debug_build();

        Ok(guard)
    }
}
