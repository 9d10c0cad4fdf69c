//! Logging setup: human-readable stderr plus optional JSONL files.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const ENV_LOG_PATH: &str = "PHRASE_TREE_LOG_PATH";
const ENV_LOG_DIR: &str = "PHRASE_TREE_LOG_DIR";
const LOG_FILE_PREFIX: &str = "phrase-tree";
const LOG_FILE_SUFFIX: &str = "jsonl";

/// Where structured logs go, besides stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    /// Stderr only.
    #[default]
    Stderr,
    /// A single file, appended to.
    File(PathBuf),
    /// Daily-rotated files in a directory.
    Dir(PathBuf),
}

/// Resolved logging destinations.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// File logging target.
    pub target: LogTarget,
}

impl ObservabilityConfig {
    /// Resolve the target from the environment, falling back to the
    /// configured log directory.
    ///
    /// `PHRASE_TREE_LOG_PATH` beats `PHRASE_TREE_LOG_DIR`, which beats
    /// `config_log_dir`.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        Self::resolve(
            std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
            std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
            config_log_dir,
        )
    }

    fn resolve(
        log_path: Option<PathBuf>,
        log_dir: Option<PathBuf>,
        config_log_dir: Option<PathBuf>,
    ) -> Self {
        let target = match (log_path, log_dir.or(config_log_dir)) {
            (Some(path), _) => LogTarget::File(path),
            (None, Some(dir)) => LogTarget::Dir(dir),
            (None, None) => LogTarget::Stderr,
        };
        Self { target }
    }
}

/// Build the event filter.
///
/// `RUST_LOG` wins when set. Otherwise `--quiet` means errors only and each
/// `-v` raises the configured level one step (an unknown level counts as
/// `info`), capped at `trace`.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(level_directive(quiet, verbose, config_level))
}

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

fn level_directive(quiet: bool, verbose: u8, config_level: &str) -> &'static str {
    if quiet {
        return LEVELS[0];
    }
    let base = LEVELS
        .iter()
        .position(|l| l.eq_ignore_ascii_case(config_level))
        .unwrap_or(2);
    LEVELS[(base + usize::from(verbose)).min(LEVELS.len() - 1)]
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive until
/// the program exits.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file, guard) = match file_appender(&config.target)? {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .with_span_list(false);
            (Some(layer.boxed()), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(guard)
}

fn file_appender(target: &LogTarget) -> anyhow::Result<Option<RollingFileAppender>> {
    let appender = match target {
        LogTarget::Stderr => return Ok(None),
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            let name = path
                .file_name()
                .with_context(|| format!("log path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name.to_string_lossy())
                .build(&dir)
        }
        LogTarget::Dir(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix(LOG_FILE_SUFFIX)
                .build(dir)
        }
    };
    appender
        .map(Some)
        .context("failed to create log file appender")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_beats_log_dir() {
        let cfg = ObservabilityConfig::resolve(
            Some(PathBuf::from("/tmp/a.jsonl")),
            Some(PathBuf::from("/tmp/logs")),
            Some(PathBuf::from("/tmp/config-logs")),
        );
        assert_eq!(cfg.target, LogTarget::File(PathBuf::from("/tmp/a.jsonl")));
    }

    #[test]
    fn env_dir_beats_config_dir() {
        let cfg = ObservabilityConfig::resolve(
            None,
            Some(PathBuf::from("/tmp/logs")),
            Some(PathBuf::from("/tmp/config-logs")),
        );
        assert_eq!(cfg.target, LogTarget::Dir(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn config_dir_used_last() {
        let cfg = ObservabilityConfig::resolve(None, None, Some(PathBuf::from("/tmp/c")));
        assert_eq!(cfg.target, LogTarget::Dir(PathBuf::from("/tmp/c")));
        assert_eq!(
            ObservabilityConfig::resolve(None, None, None).target,
            LogTarget::Stderr
        );
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_directive(true, 3, "info"), "error");
        assert_eq!(level_directive(false, 0, "warn"), "warn");
        assert_eq!(level_directive(false, 1, "warn"), "info");
        assert_eq!(level_directive(false, 2, "warn"), "debug");
        assert_eq!(level_directive(false, 9, "warn"), "trace");
    }

    #[test]
    fn verbose_steps_one_level_from_configured() {
        assert_eq!(level_directive(false, 1, "error"), "warn");
        assert_eq!(level_directive(false, 2, "error"), "info");
        assert_eq!(level_directive(false, 1, "info"), "debug");
        assert_eq!(level_directive(false, 1, "bogus"), "debug");
    }

    #[test]
    fn file_target_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.jsonl");
        let appender = file_appender(&LogTarget::File(path)).unwrap();
        assert!(appender.is_some());
        assert!(dir.path().join("nested").is_dir());
    }
}
