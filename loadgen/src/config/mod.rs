mod generator;
mod scenario;

pub use self::{generator::GeneratorConfig, scenario::Scenario};
