use std::{path::PathBuf, sync::Arc, time::Duration};

use rama::{error::BoxError, graceful::ShutdownGuard, telemetry::tracing};

use clap::Args;
use partly_open_lib::LoadGenerator;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{GeneratorConfig, Scenario},
    mock::{SimulatedExecutor, SimulatedFailure, SimulatedWorkConfig},
};

mod sink;

use self::sink::{CountingLogger, WorkLogSink};

#[derive(Debug, Clone, Args)]
/// run the load generator against a simulated executor
pub struct RunCommand {
    #[arg(long)]
    /// Scenario to run,
    /// manually defined parameters overwrite scenario parameters.
    scenario: Option<Scenario>,

    #[clap(flatten)]
    config: Option<GeneratorConfig>,

    /// Seed used for all random decisions, making a run reproducible.
    ///
    /// When omitted OS entropy is used.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Base latency of a simulated unit of work.
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration, default_value = "20ms")]
    latency: Duration,

    /// Random multiplier on the simulated latency, in the range [0, 1].
    #[arg(long, value_name = "RATIO", default_value_t = 0.)]
    latency_jitter: f64,

    /// Ratio of simulated units of work that fail, in the range [0, 1].
    #[arg(long, value_name = "RATIO", default_value_t = 0.)]
    error_rate: f64,

    /// Write the work log (JSON lines) to this file instead of stdout.
    #[arg(long, value_name = "PATH", conflicts_with = "no_work_log")]
    work_log: Option<PathBuf>,

    /// Do not record the work log at all.
    #[arg(long, default_value_t = false)]
    no_work_log: bool,

    /// Print the work log to stdout in a human readable form instead of JSON lines.
    #[arg(long, default_value_t = false, conflicts_with_all = ["work_log", "no_work_log"])]
    print_work_log: bool,
}

pub async fn exec(guard: ShutdownGuard, args: RunCommand) -> Result<(), BoxError> {
    let cfg = merge_generator_cfg(args.scenario, args.config).into_load_generator_config();

    let work_cfg = SimulatedWorkConfig {
        latency: args.latency,
        latency_jitter: args.latency_jitter,
        error_rate: args.error_rate,
    };
    tracing::info!(
        latency = ?work_cfg.latency,
        latency_jitter = %work_cfg.latency_jitter,
        error_rate = %work_cfg.error_rate,
        "simulated executor parameters ready",
    );

    let executor = match args.seed {
        // derive a distinct stream for the executor from the same seed
        Some(seed) => SimulatedExecutor::new_with_seed(work_cfg, seed.wrapping_add(1)),
        None => SimulatedExecutor::new(work_cfg),
    };

    let sink = if args.no_work_log {
        WorkLogSink::discard()
    } else if let Some(path) = args.work_log.as_deref() {
        tracing::info!(path = ?path, "write work log to file");
        WorkLogSink::try_new_file(path)?
    } else if args.print_work_log {
        WorkLogSink::print()
    } else {
        WorkLogSink::stdout()
    };
    let logger = Arc::new(CountingLogger::new(sink));

    let generator = match args.seed {
        Some(seed) => LoadGenerator::new_with_seed(cfg, seed, logger.clone(), executor)?,
        None => LoadGenerator::new(cfg, logger.clone(), executor)?,
    };

    // shutdown stops the run cooperatively instead of dropping it mid-flight
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        let cancelled = guard.clone_weak().into_cancelled();
        async move {
            cancelled.await;
            cancel.cancel();
        }
    });

    let start = Instant::now();
    let result = generator.generate_load(cancel.clone()).await;

    tracing::info!(
        completed = %logger.count(),
        elapsed = ?start.elapsed(),
        "load generation done",
    );

    match result {
        Err(err) if cancel.is_cancelled() && is_aborted(&err) => {
            tracing::info!("in flight work aborted due to shutdown: {err}");
            Ok(())
        }
        result => result,
    }
}

fn is_aborted(err: &BoxError) -> bool {
    matches!(
        err.downcast_ref::<SimulatedFailure>(),
        Some(SimulatedFailure::Aborted(_))
    )
}

fn merge_generator_cfg(
    scenario: Option<Scenario>,
    config: Option<GeneratorConfig>,
) -> GeneratorConfig {
    let scenario_cfg = scenario
        .map(|s| {
            tracing::info!("use scenario to define base config: {s:?}");
            s.generator_config()
        })
        .unwrap_or_else(|| {
            tracing::info!("no scenario defined, use default as base config");
            Default::default()
        });

    let overwrite_cfg = config.unwrap_or_default();

    macro_rules! merge_config {
        ($scenario:ident, $overwrite:ident, {$($property:ident),+ $(,)?}) => {
            GeneratorConfig {
                $(
                    $property: if let Some(value) = $overwrite.$property {
                        tracing::info!("property '{}': use overwrite: {value:?}", stringify!($property));
                        Some(value)
                    } else if let Some(value) = $scenario.$property {
                        tracing::info!("property '{}': use scenario: {value:?}", stringify!($property));
                        Some(value)
                    } else {
                        tracing::info!("property '{}': undefined", stringify!($property));
                        None
                    },
                )+
            }
        };
    }

    merge_config!(
        scenario_cfg, overwrite_cfg,
        {
            mean_new_workers_per_second,
            arrival_jitter,
            max_workers,
            stay_probability,
            think_time,
            max_requests,
        }
    )
}

#[cfg(test)]
mod tests {
    use partly_open_lib::{logger::NopLogger, work_fn};
    use rama::telemetry::tracing;
    use tracing_test::traced_test;

    use super::*;

    #[traced_test]
    #[test]
    fn test_merge_overwrite_wins_over_scenario() {
        let cfg = merge_generator_cfg(
            Some(Scenario::Sessions),
            Some(GeneratorConfig {
                max_workers: Some(3),
                think_time: Some(Duration::ZERO),
                ..Default::default()
            }),
        );

        assert_eq!(cfg.max_workers, Some(3));
        assert_eq!(cfg.think_time, Some(Duration::ZERO));
        assert_eq!(cfg.stay_probability, Some(0.9));
        assert_eq!(cfg.mean_new_workers_per_second, Some(5.));
        assert!(logs_contain("property 'max_workers': use overwrite: 3"));
        assert!(logs_contain("property 'stay_probability': use scenario: 0.9"));
    }

    #[test]
    fn test_merge_without_scenario_uses_defaults() {
        let cfg = merge_generator_cfg(None, None).into_load_generator_config();
        assert_eq!(
            cfg.mean_new_workers_per_second,
            GeneratorConfig::DEFAULT_MEAN_NEW_WORKERS_PER_SECOND
        );
        assert_eq!(cfg.max_workers, GeneratorConfig::DEFAULT_MAX_WORKERS);
        assert_eq!(cfg.stay_probability, 0.);
        assert_eq!(cfg.arrival_jitter, Duration::ZERO);
        assert_eq!(cfg.think_time, Duration::ZERO);
        assert_eq!(cfg.max_requests, 0);
    }

    #[test]
    fn test_all_scenarios_are_valid() {
        for scenario in [Scenario::Steady, Scenario::Sessions, Scenario::Burst] {
            let cfg = merge_generator_cfg(Some(scenario), None).into_load_generator_config();
            let executor = work_fn(|_cancel, _id| async { Ok::<_, BoxError>(()) });
            assert!(
                LoadGenerator::new(cfg, NopLogger::new(), executor).is_ok(),
                "scenario: {scenario:?}"
            );
        }
    }

    #[test]
    fn test_is_aborted() {
        let id = partly_open_lib::WorkId {
            worker_id: 0,
            request_id: 0,
        };
        assert!(is_aborted(&SimulatedFailure::Aborted(id).into()));
        assert!(!is_aborted(&SimulatedFailure::Failed(id).into()));
        assert!(!is_aborted(&BoxError::from("other")));
    }
}
