use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    prelude::*,
};

use crate::cli::Cli;

/// Installs the global subscriber. Logs go to stderr unless `--log-file` is
/// given; the returned guard flushes that file when dropped and must outlive
/// the run.
pub fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(cli.log_level.as_tracing_level().into());

    let (writer, guard) = match &cli.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = guard.is_none() && !cli.no_color;
    // Span timings (load, analyze, run) are only worth keeping in
    // persisted or machine-read logs.
    let span_events = if guard.is_some() || cli.log_json {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .with_span_events(span_events);
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }

    guard
}

fn file_writer(path: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("gocut.log");

    tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LogLevel;
    use tracing::Level;

    fn parse_cli(args: &[&str]) -> Cli {
        use clap::Parser;
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn log_level_ordering_matches_verbosity() {
        let error = LogLevel::Error.as_tracing_level();
        let warn = LogLevel::Warn.as_tracing_level();
        let info = LogLevel::Info.as_tracing_level();
        let debug = LogLevel::Debug.as_tracing_level();
        assert!(error < warn);
        assert!(warn < info);
        assert!(info < debug);
        assert_eq!(debug, Level::DEBUG);
    }

    #[test]
    fn default_log_level_is_info() {
        let cli = parse_cli(&["gocut", "--input", "main.go"]);
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn file_writer_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gocut.log");

        let (_writer, guard) = file_writer(&path);
        drop(guard);

        assert!(path.exists());
    }

    #[test]
    fn logs_go_to_stderr_by_default() {
        let cli = parse_cli(&["gocut", "--input", "main.go"]);
        assert!(cli.log_file.is_none());
        assert!(!cli.log_json);
    }
}
