//! Signal, clock and timing layer of the lockstep verification engine.
//!
//! This crate provides the pieces a scenario is built from:
//!
//! - [`signal`]: named four-state signals and the registry declaring them
//! - [`clock`]: clock generation and synchronous reset sequencing
//! - [`wait`]: bounded waits that fail with a typed timeout
//! - [`time`]: picosecond simulated time on the paused runtime clock
//! - [`waveform`]: optional VCD recording of every signal change
//! - [`runtime`]: the deterministic runtime scenarios run on
//! - [`error`]: the failure taxonomy shared by every layer

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod runtime;
pub mod signal;
pub mod time;
pub mod wait;
pub mod waveform;

pub use clock::{ClockDomain, ResetPolarity, ResetSequence};
pub use error::{FailureKind, SimError};
pub use runtime::scenario_runtime;
pub use signal::{Edge, Signal, SignalId, SignalRegistry};
pub use time::{ParseTimeError, SimTime, Timebase};
pub use wait::{delay, wait_for_value, wait_until};
pub use waveform::TraceRecorder;
