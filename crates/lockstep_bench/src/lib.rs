//! Scenario catalog, device stand-ins and runner of the lockstep verification
//! engine.
//!
//! A run takes a [`Catalog`] of parameter sets and scenarios, builds a bench
//! (clock, reset, ports and a behavioral device) for each, lets every
//! scenario drive the device while a reference model predicts its outputs,
//! and collects one [`ScenarioOutcome`] per scenario.

#![warn(missing_docs)]

pub mod bench;
pub mod catalog;
pub mod devices;
pub mod outcome;
pub mod runner;
pub mod scenarios;

pub use bench::{scenario_rng, Bench};
pub use catalog::{Catalog, Circuit, ScenarioEntry, Selection, Target, TargetEntry};
pub use devices::{spawn_device, Device, DeviceHandle, Fault};
pub use outcome::{FailureReport, RunReport, ScenarioOutcome};
pub use runner::{run_catalog, RunOptions};
