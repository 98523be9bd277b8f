//! Reference models and the comparator layer of the lockstep verification
//! engine.
//!
//! Each model in this crate predicts, cycle by cycle, what a synchronous
//! circuit should drive on its outputs. Models are clocked by a
//! [`lockstep_sim::ClockDomain`] through a [`ModelHandle`] and checked
//! against the device with the functions in [`compare`].

#![warn(missing_docs)]

pub mod compare;
pub mod counter;
pub mod debounce;
pub mod edge;
pub mod model;
pub mod sequence;
pub mod shift;

pub use compare::{check, check_model, expect_quiet_for, expect_within, spawn_monitor, Monitor};
pub use counter::{CounterModel, CounterParams};
pub use debounce::{DebounceModel, DebounceParams, Envelope};
pub use edge::{EdgeModel, EdgePulses};
pub use model::{Expectation, Model, ModelHandle, ModelView};
pub use sequence::{
    compass_code, CompassDecoder, GoalSet, KonamiDecoder, SequenceModel, SymbolDecoder,
    COMPASS_ALPHABET, COMPASS_GOALS, KONAMI_ALPHABET, KONAMI_GOAL,
};
pub use shift::{ShiftModel, ShiftParams};
