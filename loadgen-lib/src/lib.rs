#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod config;
pub mod generator;
pub mod logger;
pub mod utils;
pub mod work;

pub use self::{
    config::{InvalidConfig, LoadGeneratorConfig},
    generator::LoadGenerator,
    work::{WorkExecutor, WorkFn, WorkId, WorkLogEntry, WorkLogger, work_fn},
};
