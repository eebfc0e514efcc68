//! # Rolegate Testkit
//!
//! Testing utilities for rolegate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenarios**: End-to-end call sequences with expected outcomes that every backend must pass
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test policies, plus a recording audit sink
//!
//! ## Scenarios
//!
//! ```rust,no_run
//! use rolegate_testkit::fixtures::PolicyFixture;
//! use rolegate_testkit::scenarios::{all_scenarios, run_scenario};
//!
//! async fn check() {
//!     for scenario in all_scenarios() {
//!         let fixture = PolicyFixture::new();
//!         run_scenario(&fixture.authz, &scenario).await.unwrap();
//!     }
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use rolegate_testkit::generators::PolicyParams;
//!
//! proptest! {
//!     #[test]
//!     fn holders_are_distinct(params in any::<PolicyParams>()) {
//!         for role in 0..params.roles.len() {
//!             let holders = params.holders(role);
//!             prop_assert!(holders.windows(2).all(|w| w[0] != w[1]));
//!         }
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{actors, uaa, PolicyFixture, RecordingAuditSink};
pub use generators::PolicyParams;
pub use scenarios::{all_scenarios, run_scenario, Scenario, ScenarioFailure};
