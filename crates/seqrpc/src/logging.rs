use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// Env var consulted when `--log-level` is not given. Useful for `serve`
/// deployments where flags are awkward to thread through a unit file.
const LEVEL_ENV: &str = "SEQRPC_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|raw| parse_level(&raw))
    }
}

fn parse_level(raw: &str) -> Option<LogLevel> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "error" => Some(LogLevel::Error),
        "warn" => Some(LogLevel::Warn),
        "info" => Some(LogLevel::Info),
        "debug" => Some(LogLevel::Debug),
        "trace" => Some(LogLevel::Trace),
        _ => None,
    }
}

/// Initialize stderr logging.
///
/// Level precedence: `--log-level` flag, then `SEQRPC_LOG`, then `info`.
pub fn init_logging(format: LogFormat, level: Option<LogLevel>) {
    let level = level.or_else(LogLevel::from_env).unwrap_or(LogLevel::Info);

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
