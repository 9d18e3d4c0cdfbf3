use std::{fmt, time::Duration};

/// Shape of a partly open load experiment.
///
/// Workers arrive at `mean_new_workers_per_second`, each arrival spaced by the
/// nominal interval plus or minus a random amount bounded by `arrival_jitter`.
/// Every worker issues at least one request and keeps going with
/// `stay_probability`, pausing `think_time` between requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadGeneratorConfig {
    /// Mean arrival rate, in workers per second.
    pub mean_new_workers_per_second: f64,
    /// Upper bound of the symmetric jitter applied to each arrival delay.
    pub arrival_jitter: Duration,
    /// Amount of workers launched over the whole run.
    pub max_workers: usize,
    /// Probability in `[0, 1]` that a worker issues another request.
    pub stay_probability: f64,
    /// Pause between two requests of the same worker.
    pub think_time: Duration,
    /// Global cap on the total amount of requests (`0` = unbounded).
    pub max_requests: u64,
}

impl Default for LoadGeneratorConfig {
    fn default() -> Self {
        Self {
            mean_new_workers_per_second: 1.,
            arrival_jitter: Duration::ZERO,
            max_workers: 1,
            stay_probability: 0.,
            think_time: Duration::ZERO,
            max_requests: 0,
        }
    }
}

/// Arrival timings derived from a validated [`LoadGeneratorConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArrivalTiming {
    /// Nominal sleep between two arrivals, in nanoseconds.
    pub(crate) sleep_for: u64,
    /// Jitter bound, in nanoseconds. Never larger than `sleep_for`.
    pub(crate) jitter: u64,
}

/// Rates above this value would need sub-nanosecond spacing.
const MAX_SPACED_RATE: f64 = 1_000_000_000.;

impl LoadGeneratorConfig {
    /// Validate the config and derive the arrival timings from it.
    pub(crate) fn validate(&self) -> Result<ArrivalTiming, InvalidConfig> {
        // written negated so that NaN is rejected as well
        if !(self.mean_new_workers_per_second > 0.) {
            return Err(InvalidConfig::MeanNewWorkersPerSecond(
                self.mean_new_workers_per_second,
            ));
        }
        if self.max_workers == 0 {
            return Err(InvalidConfig::MaxWorkers);
        }
        if !(0. ..=1.).contains(&self.stay_probability) {
            return Err(InvalidConfig::StayProbability(self.stay_probability));
        }

        let sleep_for = if self.mean_new_workers_per_second <= MAX_SPACED_RATE {
            (MAX_SPACED_RATE / self.mean_new_workers_per_second) as u64
        } else {
            0
        };
        let jitter = u64::try_from(self.arrival_jitter.as_nanos()).unwrap_or(u64::MAX);

        if jitter > sleep_for {
            return Err(InvalidConfig::ArrivalJitter {
                jitter: self.arrival_jitter,
                sleep_for: Duration::from_nanos(sleep_for),
                mean_new_workers_per_second: self.mean_new_workers_per_second,
            });
        }

        Ok(ArrivalTiming { sleep_for, jitter })
    }
}

/// A [`LoadGeneratorConfig`] that violates one of its constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidConfig {
    MeanNewWorkersPerSecond(f64),
    MaxWorkers,
    StayProbability(f64),
    ArrivalJitter {
        jitter: Duration,
        sleep_for: Duration,
        mean_new_workers_per_second: f64,
    },
}

impl fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidConfig::MeanNewWorkersPerSecond(rate) => write!(
                f,
                "InvalidConfig: mean_new_workers_per_second must be greater than zero, got={rate}"
            ),
            InvalidConfig::MaxWorkers => {
                write!(f, "InvalidConfig: max_workers must be greater than zero")
            }
            InvalidConfig::StayProbability(p) => write!(
                f,
                "InvalidConfig: stay_probability must be in [0, 1], got={p}"
            ),
            InvalidConfig::ArrivalJitter {
                jitter,
                sleep_for,
                mean_new_workers_per_second,
            } => write!(
                f,
                "InvalidConfig: arrival_jitter={jitter:?} must not exceed the sleep={sleep_for:?} \
                 required for mean_new_workers_per_second={mean_new_workers_per_second}"
            ),
        }
    }
}

impl std::error::Error for InvalidConfig {}
