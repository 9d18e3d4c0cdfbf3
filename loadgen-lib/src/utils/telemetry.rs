use std::{fs::OpenOptions, io::IsTerminal as _, path::Path};

use rama::{
    error::{BoxError, ErrorContext as _},
    telemetry::tracing::{
        self,
        subscriber::{EnvFilter, fmt::writer::BoxMakeWriter},
    },
};

/// Crates whose logs are raised by `verbose`.
const OWN_TARGETS: &[&str] = &["partly_open", "partly_open_lib"];

#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryConfig<'a> {
    /// Debug logs of the load generator itself, instead of info.
    pub verbose: bool,
    /// Format the logs for humans.
    pub pretty: bool,
    /// Append the logs to this file instead of writing them to stderr.
    pub output: Option<&'a Path>,
}

/// Set up the global tracing subscriber.
///
/// The load generator logs at info (debug when verbose),
/// its dependencies only at warn. `RUST_LOG` replaces these defaults.
pub fn init_tracing(cfg: TelemetryConfig<'_>) -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(cfg.verbose)));

    let subscriber = tracing::subscriber::fmt()
        .with_ansi(cfg.output.is_none() && std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .with_writer(log_writer(cfg.output)?);

    if cfg.pretty {
        subscriber.pretty().try_init()?;
    } else {
        subscriber.try_init()?;
    }

    tracing::debug!(verbose = %cfg.verbose, output = ?cfg.output, "tracing initialized");
    Ok(())
}

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    OWN_TARGETS
        .iter()
        .fold(String::from("warn"), |directives, target| {
            format!("{directives},{target}={level}")
        })
}

fn log_writer(output: Option<&Path>) -> Result<BoxMakeWriter, BoxError> {
    let Some(path) = output else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    Ok(BoxMakeWriter::new(file))
}

#[cfg(test)]
mod tests {
    use rama::telemetry::tracing::metadata::LevelFilter;

    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(false),
            "warn,partly_open=info,partly_open_lib=info"
        );
        assert_eq!(
            default_directives(true),
            "warn,partly_open=debug,partly_open_lib=debug"
        );
    }

    #[test]
    fn test_verbose_only_raises_own_targets() {
        let quiet = EnvFilter::new(default_directives(false));
        assert_eq!(quiet.max_level_hint(), Some(LevelFilter::INFO));

        let verbose = EnvFilter::new(default_directives(true));
        assert_eq!(verbose.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_log_writer_fails_for_unwritable_path() {
        let dir = std::env::temp_dir().join("partly-open-missing-dir").join("nested");
        assert!(log_writer(Some(&dir.join("out.log"))).is_err());
    }
}
