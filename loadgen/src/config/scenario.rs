use std::time::Duration;

use super::GeneratorConfig;

/// High level load scenarios.
/// Each scenario is a preset of the arrival process and session behavior.
#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum Scenario {
    /// Every worker issues a single request.
    /// Approximates an open system with a steady arrival rate.
    #[default]
    Steady,

    /// Workers stay for several requests, thinking in between.
    /// Models interactive users browsing a service.
    Sessions,

    /// Many workers arriving quickly with a global request budget.
    /// Used to observe behavior under a sudden spike.
    Burst,
}

impl Scenario {
    /// Construct the (partial) generator configuration
    /// associated with this scenario.
    pub fn generator_config(self) -> GeneratorConfig {
        match self {
            Scenario::Steady => GeneratorConfig {
                mean_new_workers_per_second: Some(10.),
                arrival_jitter: None,
                max_workers: Some(100),
                stay_probability: Some(0.),
                think_time: None,
                max_requests: None,
            },

            Scenario::Sessions => {
                // mean session length of 10 requests
                GeneratorConfig {
                    mean_new_workers_per_second: Some(5.),
                    arrival_jitter: Some(Duration::from_millis(50)),
                    max_workers: Some(50),
                    stay_probability: Some(0.9),
                    think_time: Some(Duration::from_millis(500)),
                    max_requests: None,
                }
            }

            Scenario::Burst => GeneratorConfig {
                mean_new_workers_per_second: Some(200.),
                arrival_jitter: Some(Duration::from_millis(2)),
                max_workers: Some(1000),
                stay_probability: Some(0.5),
                think_time: Some(Duration::from_millis(10)),
                max_requests: Some(2000),
            },
        }
    }
}
