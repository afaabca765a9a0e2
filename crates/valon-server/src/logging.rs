//! Logging setup.
//!
//! Every component logs under a `valon::<area>` target. A preset picks the
//! baseline directives, `--log area=level` refines individual targets, and
//! `RUST_LOG` replaces both when set.

use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const TARGET_PREFIX: &str = "valon::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Baseline verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Connections, API calls and warnings
    #[default]
    Production,
    /// Adds per-command engine and router activity
    Verbose,
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    /// Pick a preset from CLI flags. Quieter and more detailed flags win over
    /// less specific ones.
    pub fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (_, _, _, true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        }
    }

    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "valon::startup=info",
                "valon::api=info",
                "valon::ws=info",
                "valon::ws::ping=off",
                "valon::registry=info",
                "valon::engine=warn",
                "valon::router=warn",
                "valon::ledger=warn",
                "valon::broadcast=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["valon=info", "valon::ws::ping=off", "tower_http=info"],
            LogPreset::Debug => &["valon=debug", "valon::ws::ping=off", "tower_http=debug"],
            LogPreset::Trace => &["valon=trace", "tower_http=trace"],
            LogPreset::Quiet => &["valon=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target levels, keyed by full target name
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Build from a preset and raw `--log` values. Each value may hold several
    /// comma-separated `target=level` pairs; malformed pairs are ignored.
    pub fn new(preset: LogPreset, log_overrides: &[String], format: LogFormat) -> Self {
        let overrides = log_overrides
            .iter()
            .flat_map(|value| value.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Directive string handed to the `EnvFilter`.
    pub fn filter_directives(&self) -> String {
        self.preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level.to_string().to_ascii_lowercase())),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.filter_directives()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Parse `area=level`, qualifying bare areas with the `valon::` prefix.
fn parse_override(pair: &str) -> Option<(String, Level)> {
    let (target, level) = pair.split_once('=')?;
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let level = Level::from_str(level.trim()).ok()?;

    let target = if target.starts_with(TARGET_PREFIX) || target == "valon" || target == "tower_http" {
        target.to_string()
    } else {
        format!("{}{}", TARGET_PREFIX, target)
    };
    Some((target, level))
}

/// Install the global subscriber.
pub fn init(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.build_filter());

    match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init(),
    }
}
