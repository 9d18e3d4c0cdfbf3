use std::time::Duration;

use partly_open_lib::LoadGeneratorConfig;

/// Load generation configuration.
/// This models when virtual users arrive and how long they stay.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct GeneratorConfig {
    /// Mean amount of new workers (virtual users) arriving per second.
    #[arg(long = "rate", value_name = "WORKERS_PER_SECOND")]
    pub mean_new_workers_per_second: Option<f64>,

    /// Maximum random deviation of each inter-arrival delay.
    /// Must not exceed the inter-arrival interval.
    #[arg(long = "jitter", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub arrival_jitter: Option<Duration>,

    /// Amount of workers arriving over the whole run.
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Probability in [0, 1] that a worker issues another request.
    #[arg(long, value_name = "P")]
    pub stay_probability: Option<f64>,

    /// Pause of a worker between two of its requests.
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub think_time: Option<Duration>,

    /// Maximum amount of requests over all workers (0 = unbounded).
    #[arg(long, value_name = "N")]
    pub max_requests: Option<u64>,
}

impl GeneratorConfig {
    pub const DEFAULT_MEAN_NEW_WORKERS_PER_SECOND: f64 = 10.;
    pub const DEFAULT_MAX_WORKERS: usize = 10;

    /// Fill in the undefined properties with their defaults.
    pub fn into_load_generator_config(self) -> LoadGeneratorConfig {
        LoadGeneratorConfig {
            mean_new_workers_per_second: self
                .mean_new_workers_per_second
                .unwrap_or(Self::DEFAULT_MEAN_NEW_WORKERS_PER_SECOND),
            arrival_jitter: self.arrival_jitter.unwrap_or_default(),
            max_workers: self.max_workers.unwrap_or(Self::DEFAULT_MAX_WORKERS),
            stay_probability: self.stay_probability.unwrap_or_default(),
            think_time: self.think_time.unwrap_or_default(),
            max_requests: self.max_requests.unwrap_or_default(),
        }
    }
}
