//! Timing envelope of an input debouncer.
//!
//! A debouncer's internal counter width is an implementation choice, so the
//! model does not predict an exact output. It bounds it instead: after the
//! raw input goes high and stays high, the debounced output may not assert
//! before `min_delay` cycles and must assert within `max_delay` cycles, where
//! `max_delay = 2^ceil(log2(min_delay)) + 1` reflects a power-of-two timer.
//!
//! The same contract is checked two ways. The bounded waits in
//! [`crate::compare`] measure it directly in simulated time, and
//! [`DebounceModel`] turns it into a per-cycle [`Envelope`] that the ordinary
//! monitor can check on every rising edge.

use lockstep_sim::{SimError, Signal};

use crate::model::{Expectation, Model};

/// Parameters of a debouncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceParams {
    /// Cycles the input must stay high before the output may assert.
    pub min_delay: u64,
}

impl DebounceParams {
    /// Largest accepted `min_delay`, in cycles.
    pub const MAX_MIN_DELAY: u64 = 1 << 32;

    /// Creates the parameters; `min_delay` must be in
    /// `1..=`[`MAX_MIN_DELAY`](Self::MAX_MIN_DELAY).
    pub fn new(min_delay: u64) -> Result<Self, SimError> {
        if min_delay == 0 {
            return Err(SimError::invalid("debounce min_delay must be at least 1"));
        }
        if min_delay > Self::MAX_MIN_DELAY {
            return Err(SimError::invalid(format!(
                "debounce min_delay {min_delay} exceeds {}",
                Self::MAX_MIN_DELAY
            )));
        }
        Ok(Self { min_delay })
    }

    /// Latest cycle by which the output must have asserted.
    pub fn max_delay(&self) -> u64 {
        self.min_delay.next_power_of_two() + 1
    }
}

/// Per-cycle prediction of the debounced output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Envelope {
    /// The output must read `0`.
    Low,
    /// Either level is acceptable.
    Any,
    /// The output must read `1`.
    High,
}

impl From<Envelope> for Expectation {
    fn from(e: Envelope) -> Self {
        match e {
            Envelope::Low => Expectation::Exact(0),
            Envelope::Any => Expectation::Any,
            Envelope::High => Expectation::Exact(1),
        }
    }
}

/// Envelope implied by `run` committed consecutive high samples.
///
/// `armed` is set once a run has reached `min_delay` since the last reset;
/// after that a debouncer may legitimately hold its output through a
/// release, so a short run no longer forces the output low.
pub fn envelope(params: &DebounceParams, run: u64, armed: bool) -> Envelope {
    if run + 1 >= params.max_delay() {
        Envelope::High
    } else if !armed && run < params.min_delay {
        Envelope::Low
    } else {
        Envelope::Any
    }
}

/// Per-cycle envelope model of the debouncer.
pub struct DebounceModel {
    params: DebounceParams,
    reset: Signal,
    button: Signal,
    run: u64,
    armed: bool,
    next_run: u64,
    next_armed: bool,
}

impl DebounceModel {
    /// Creates a model sampling `reset` and the raw `button` input.
    pub fn new(params: DebounceParams, reset: Signal, button: Signal) -> Self {
        Self {
            params,
            reset,
            button,
            run: 0,
            armed: false,
            next_run: 0,
            next_armed: false,
        }
    }

    /// The debouncer parameters.
    pub fn params(&self) -> &DebounceParams {
        &self.params
    }

    /// Committed count of consecutive high samples.
    pub fn run_length(&self) -> u64 {
        self.run
    }
}

impl Model for DebounceModel {
    type Output = Envelope;

    fn name(&self) -> &str {
        "debounce"
    }

    fn on_rising(&mut self) -> Result<(), SimError> {
        match self.reset.value() {
            None => return Ok(()),
            Some(r) if r != 0 => {
                self.next_run = 0;
                self.next_armed = false;
                return Ok(());
            }
            Some(_) => {}
        }
        if self.button.require_bool()? {
            self.next_run = self.run.saturating_add(1);
            self.next_armed = self.armed || self.next_run >= self.params.min_delay;
        } else {
            self.next_run = 0;
            self.next_armed = self.armed;
        }
        Ok(())
    }

    fn on_falling(&mut self) {
        self.run = self.next_run;
        self.armed = self.next_armed;
    }

    fn output(&self) -> Result<Envelope, SimError> {
        Ok(envelope(&self.params, self.run, self.armed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn max_delay_follows_power_of_two() {
        assert_eq!(DebounceParams::new(10).unwrap().max_delay(), 17);
        assert_eq!(DebounceParams::new(500).unwrap().max_delay(), 513);
        assert_eq!(DebounceParams::new(1000).unwrap().max_delay(), 1025);
        assert_eq!(DebounceParams::new(16).unwrap().max_delay(), 17);
        assert_eq!(DebounceParams::new(1).unwrap().max_delay(), 2);
    }

    #[test]
    fn zero_min_delay_rejected() {
        assert!(DebounceParams::new(0).is_err());
    }

    #[test]
    fn oversized_min_delay_rejected() {
        let max = DebounceParams::new(DebounceParams::MAX_MIN_DELAY).unwrap();
        assert_eq!(max.max_delay(), (1 << 32) + 1);
        assert!(DebounceParams::new(DebounceParams::MAX_MIN_DELAY + 1).is_err());
        assert!(DebounceParams::new(1 << 55).is_err());
    }

    #[test]
    fn envelope_boundaries() {
        let p = DebounceParams::new(10).unwrap();
        assert_eq!(envelope(&p, 0, false), Envelope::Low);
        assert_eq!(envelope(&p, 9, false), Envelope::Low);
        assert_eq!(envelope(&p, 10, true), Envelope::Any);
        assert_eq!(envelope(&p, 15, true), Envelope::Any);
        assert_eq!(envelope(&p, 16, true), Envelope::High);
        assert_eq!(envelope(&p, 2, true), Envelope::Any);
    }

    #[test]
    fn envelope_to_expectation() {
        assert_eq!(Expectation::from(Envelope::Low), Expectation::Exact(0));
        assert_eq!(Expectation::from(Envelope::Any), Expectation::Any);
        assert_eq!(Expectation::from(Envelope::High), Expectation::Exact(1));
    }

    proptest! {
        #[test]
        fn never_high_before_min_never_low_at_max(min in 1u64..5000) {
            let p = DebounceParams::new(min).unwrap();
            for run in 0..min {
                prop_assert_ne!(envelope(&p, run, false), Envelope::High);
            }
            prop_assert_eq!(envelope(&p, p.max_delay() - 1, true), Envelope::High);
            prop_assert!(p.max_delay() > min);
        }
    }
}
