//! Failure taxonomy of the verification engine.
//!
//! Every failure a scenario can hit is a variant of [`SimError`]. The
//! variants fall into the classes reported by [`SimError::kind`]:
//! unresolvable signals, assertion mismatches, timeouts, protocol misuse of a
//! model or clock, and setup errors.

use std::io;

use serde::{Deserialize, Serialize};

use crate::time::SimTime;

/// Errors that can occur while building or running a scenario.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// A signal that had to carry a definite value contained X or Z bits.
    #[error("unresolvable signal `{signal}` (x or z in some or all bits) at {time}")]
    Unresolvable {
        /// Name of the offending signal.
        signal: String,
        /// Simulated time of the read.
        time: SimTime,
    },

    /// The device disagreed with the reference model.
    #[error("incorrect result on `{signal}`: expected {expected}, got {actual} at {time}")]
    Mismatch {
        /// Name of the observed signal.
        signal: String,
        /// What the model predicted.
        expected: String,
        /// What the device produced.
        actual: String,
        /// Simulated time of the comparison.
        time: SimTime,
    },

    /// A bounded wait did not complete in time.
    #[error("timed out after {after} waiting for {what} at {time}")]
    Timeout {
        /// Description of the awaited condition.
        what: String,
        /// The wait bound.
        after: SimTime,
        /// Simulated time when the bound expired.
        time: SimTime,
    },

    /// `start()` was called on something already running.
    #[error("{what} already started")]
    AlreadyStarted {
        /// The model or clock that was started twice.
        what: String,
    },

    /// `stop()` was called on something that never ran.
    #[error("{what} never started")]
    NeverStarted {
        /// The model or clock that was stopped.
        what: String,
    },

    /// A model output was read before the model completed a clock cycle.
    #[error("model `{model}` has not completed a clock cycle since start")]
    ModelNotReady {
        /// Name of the model.
        model: String,
    },

    /// A signal name was looked up but never declared.
    #[error("unknown signal `{name}`")]
    UnknownSignal {
        /// The requested name.
        name: String,
    },

    /// A signal name was declared twice.
    #[error("signal `{name}` declared twice")]
    DuplicateSignal {
        /// The duplicated name.
        name: String,
    },

    /// A write did not match the declared width of the signal.
    #[error("width mismatch on `{signal}`: declared {expected} bits, got {actual}")]
    WidthMismatch {
        /// Name of the signal.
        signal: String,
        /// Declared width.
        expected: u32,
        /// Width of the written value.
        actual: u32,
    },

    /// A signal width outside the supported range.
    #[error("invalid width {width} for `{signal}` (supported: 1..=64)")]
    InvalidWidth {
        /// Name of the signal.
        signal: String,
        /// The rejected width.
        width: u32,
    },

    /// A model, clock or scenario parameter is out of range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Why the parameter was rejected.
        reason: String,
    },

    /// The task driving a signal or clock went away.
    #[error("signal `{signal}` closed")]
    ChannelClosed {
        /// Name of the signal.
        signal: String,
    },

    /// Writing a waveform trace failed.
    #[error("trace I/O error: {reason}")]
    Io {
        /// Rendered I/O error.
        reason: String,
    },
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io {
            reason: e.to_string(),
        }
    }
}

/// Coarse classification of a [`SimError`], used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required value contained unknown bits.
    Unresolvable,
    /// Model and device disagreed.
    Mismatch,
    /// A bounded wait expired.
    Timeout,
    /// A model or clock was started, stopped or read out of order.
    Protocol,
    /// The scenario could not be set up.
    Setup,
}

impl SimError {
    /// Returns the failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            SimError::Unresolvable { .. } => FailureKind::Unresolvable,
            SimError::Mismatch { .. } => FailureKind::Mismatch,
            SimError::Timeout { .. } => FailureKind::Timeout,
            SimError::AlreadyStarted { .. }
            | SimError::NeverStarted { .. }
            | SimError::ModelNotReady { .. } => FailureKind::Protocol,
            SimError::UnknownSignal { .. }
            | SimError::DuplicateSignal { .. }
            | SimError::WidthMismatch { .. }
            | SimError::InvalidWidth { .. }
            | SimError::InvalidParameter { .. }
            | SimError::ChannelClosed { .. }
            | SimError::Io { .. } => FailureKind::Setup,
        }
    }

    /// Shorthand for [`SimError::InvalidParameter`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            reason: reason.into(),
        }
    }
}
