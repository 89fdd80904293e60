use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Long options that may also be spelled with a single dash, the way Go
/// tools spell them (`-input main.go`).
const SINGLE_DASH_LONG: &[&str] = &[
    "input",
    "output",
    "config",
    "format",
    "no-normalize",
    "strict-imports",
    "log-level",
    "log-file",
    "log-json",
    "no-color",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "gocut",
    author,
    version,
    about = "Cut a Go source file down to the declarations it reaches",
    long_about = "gocut loads the package around an entry file, follows every reference from \
                  the file's declarations through the package, and writes a copy of the entry \
                  file holding exactly the reachable declarations.\n\n\
                  Options may be spelled Go style with a single dash (-input, -output)."
)]
pub struct Cli {
    /// Entry Go source file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Directory the cut file is written to [default: output]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Config file to use instead of the nearest gocut.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report format printed to stdout
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Keep the entry file's import list as is
    #[arg(long)]
    pub no_normalize: bool,

    /// Fail when the import list cannot be normalized
    #[arg(long)]
    pub strict_imports: bool,

    #[arg(long, value_enum, default_value = "info", help = "Set the log level")]
    pub log_level: LogLevel,

    #[arg(long, help = "Write logs to the specified file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, help = "Output logs in JSON format")]
    pub log_json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Rewrites `-input` and `-input=x` to their double-dash spelling.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            let Some(rest) = arg.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if SINGLE_DASH_LONG.contains(&name) {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}
