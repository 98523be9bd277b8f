//! Shared foundational types for the Lockstep verification engine.
//!
//! This crate provides the four-state [`Logic`] scalar and the fixed-width
//! [`LogicVec`] used for every signal value a model reads or predicts.

#![warn(missing_docs)]

pub mod logic;
pub mod logic_vec;

pub use logic::Logic;
pub use logic_vec::{width_mask, LogicVec, MAX_WIDTH};
