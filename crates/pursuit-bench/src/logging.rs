use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{Level, event};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub struct LoggingGuard {
    _guard: WorkerGuard,
    _run: tracing::span::EnteredSpan,
    pub telemetry_path: PathBuf,
}

/// `telemetry-<run_id>.jsonl` beside the summary. Characters that are unsafe
/// in file names are replaced with `_`.
pub fn telemetry_path(outputs: &ResolvedOutputs, run_id: &str) -> PathBuf {
    let stem: String = run_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    outputs.telemetry_dir().join(format!("telemetry-{stem}.jsonl"))
}

/// Installs a JSON subscriber writing engine and game events for `run_id`.
/// Events on the calling thread carry the run id through an entered
/// `bench_run` span.
/// Returns `None` when disabled.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_dir = outputs.telemetry_dir();
    fs::create_dir_all(&telemetry_dir).with_context(|| {
        format!("creating telemetry directory at {}", telemetry_dir.display())
    })?;

    let telemetry_path = telemetry_path(outputs, run_id);
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // A subscriber may already be installed (tests).
    let _ = tracing::subscriber::set_global_default(subscriber);

    let run = tracing::span!(Level::ERROR, "bench_run", run_id = %run_id).entered();
    event!(
        target: "pursuit_bench::game",
        Level::INFO,
        run_id = %run_id,
        level = %level,
        path = %telemetry_path.display(),
        "telemetry started"
    );

    Ok(Some(LoggingGuard {
        _guard: guard,
        _run: run,
        telemetry_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn outputs(summary: &str) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: PathBuf::from("out/games.jsonl"),
            summary_md: PathBuf::from(summary),
        }
    }

    #[test]
    fn telemetry_file_is_named_after_the_run() {
        let path = telemetry_path(&outputs("bench/out/nightly/summary.md"), "nightly-03");
        assert_eq!(path, Path::new("bench/out/nightly/telemetry-nightly-03.jsonl"));
    }

    #[test]
    fn unsafe_run_id_characters_are_replaced() {
        let path = telemetry_path(&outputs("summary.md"), "a/b c");
        assert_eq!(path, Path::new("./telemetry-a_b_c.jsonl"));
    }
}
