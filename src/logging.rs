use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

/// Routes tracing output to the log file at `path`. The terminal belongs to
/// the UI, so nothing is written to stdout or stderr.
///
/// The returned guard flushes buffered lines on drop; keep it alive for the
/// lifetime of the program.
pub fn init(path: &Path, verbose: bool) -> Result<WorkerGuard> {
    let log_dir = path.parent().unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path {} has no file name", path.display()))?;
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(log_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "wikiscroll=debug" } else { "wikiscroll=info" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_level() {
        assert_eq!(default_directive(false), "wikiscroll=info");
        assert_eq!(default_directive(true), "wikiscroll=debug");
    }
}
