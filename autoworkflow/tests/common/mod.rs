//! Common test utilities shared by the unit and integration suites

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{FakePlatform, ScenarioBuilder};
