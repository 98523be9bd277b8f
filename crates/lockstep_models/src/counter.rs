//! Saturating up/down counter.

use lockstep_common::width_mask;
use lockstep_sim::{SimError, Signal};

use crate::model::Model;

/// Parameters of a saturating counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterParams {
    /// Output width in bits.
    pub width: u32,
    /// Value loaded by reset.
    pub reset_value: u64,
    /// Ceiling the counter never exceeds.
    pub saturate: u64,
}

impl CounterParams {
    /// Checks `0 <= reset_value <= saturate < 2^width`.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(1..=64).contains(&self.width) {
            return Err(SimError::invalid(format!(
                "counter width {} outside 1..=64",
                self.width
            )));
        }
        if self.saturate > width_mask(self.width) {
            return Err(SimError::invalid(format!(
                "counter ceiling {} does not fit in {} bits",
                self.saturate, self.width
            )));
        }
        if self.reset_value > self.saturate {
            return Err(SimError::invalid(format!(
                "counter reset value {} above ceiling {}",
                self.reset_value, self.saturate
            )));
        }
        Ok(())
    }
}

/// One rising-edge transition of the counter.
///
/// `None` marks an unresolved input. Rules, in priority order: unresolved
/// reset holds; reset loads the reset value; an unresolved `up` or `down`
/// holds; both asserted hold; `up` alone increments below the ceiling;
/// `down` alone decrements above zero; anything else holds.
pub fn next_count(
    params: &CounterParams,
    count: u64,
    reset: Option<bool>,
    up: Option<bool>,
    down: Option<bool>,
) -> u64 {
    match (reset, up, down) {
        (None, _, _) => count,
        (Some(true), _, _) => params.reset_value,
        (Some(false), None, _) | (Some(false), _, None) => count,
        (Some(false), Some(true), Some(true)) => count,
        (Some(false), Some(true), Some(false)) if count != params.saturate => count + 1,
        (Some(false), Some(false), Some(true)) if count != 0 => count - 1,
        _ => count,
    }
}

/// Reference model of the saturating counter. Moore output: the committed
/// count.
pub struct CounterModel {
    params: CounterParams,
    reset: Signal,
    up: Signal,
    down: Signal,
    count: u64,
    next: u64,
}

impl CounterModel {
    /// Creates a model sampling the given input signals.
    pub fn new(
        params: CounterParams,
        reset: Signal,
        up: Signal,
        down: Signal,
    ) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            params,
            reset,
            up,
            down,
            count: 0,
            next: 0,
        })
    }

    /// The counter parameters.
    pub fn params(&self) -> &CounterParams {
        &self.params
    }
}

fn level(signal: &Signal) -> Option<bool> {
    signal.value().map(|v| v != 0)
}

impl Model for CounterModel {
    type Output = u64;

    fn name(&self) -> &str {
        "counter_sat"
    }

    fn on_rising(&mut self) -> Result<(), SimError> {
        self.next = next_count(
            &self.params,
            self.count,
            level(&self.reset),
            level(&self.up),
            level(&self.down),
        );
        Ok(())
    }

    fn on_falling(&mut self) {
        self.count = self.next;
    }

    fn output(&self) -> Result<u64, SimError> {
        Ok(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const P: CounterParams = CounterParams {
        width: 7,
        reset_value: 11,
        saturate: 67,
    };

    #[test]
    fn validate_ranges() {
        assert!(P.validate().is_ok());
        let bad = CounterParams {
            saturate: 128,
            ..P
        };
        assert!(bad.validate().is_err());
        let bad = CounterParams {
            reset_value: 68,
            ..P
        };
        assert!(bad.validate().is_err());
        let bad = CounterParams { width: 0, ..P };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn priority_order() {
        let t = Some(true);
        let f = Some(false);
        assert_eq!(next_count(&P, 20, None, t, f), 20);
        assert_eq!(next_count(&P, 20, t, None, None), 11);
        assert_eq!(next_count(&P, 20, f, None, f), 20);
        assert_eq!(next_count(&P, 20, f, t, t), 20);
        assert_eq!(next_count(&P, 20, f, t, f), 21);
        assert_eq!(next_count(&P, 20, f, f, t), 19);
        assert_eq!(next_count(&P, 20, f, f, f), 20);
    }

    #[test]
    fn limits() {
        let t = Some(true);
        let f = Some(false);
        assert_eq!(next_count(&P, 67, f, t, f), 67);
        assert_eq!(next_count(&P, 0, f, f, t), 0);
    }

    #[test]
    fn fifty_six_ups_reach_ceiling() {
        let mut count = next_count(&P, 0, Some(true), None, None);
        for _ in 0..56 {
            count = next_count(&P, count, Some(false), Some(true), Some(false));
        }
        assert_eq!(count, 67);
        count = next_count(&P, count, Some(false), Some(true), Some(false));
        assert_eq!(count, 67);
    }

    fn params() -> impl Strategy<Value = CounterParams> {
        (1u32..=12).prop_flat_map(|width| {
            (0..=width_mask(width)).prop_flat_map(move |saturate| {
                (0..=saturate).prop_map(move |reset_value| CounterParams {
                    width,
                    reset_value,
                    saturate,
                })
            })
        })
    }

    fn input() -> impl Strategy<Value = Option<bool>> {
        prop_oneof![Just(None), Just(Some(false)), Just(Some(true))]
    }

    proptest! {
        #[test]
        fn count_stays_in_range(
            p in params(),
            steps in prop::collection::vec((input(), input(), input()), 0..200),
        ) {
            let mut count = p.reset_value;
            for (reset, up, down) in steps {
                count = next_count(&p, count, reset, up, down);
                prop_assert!(count <= p.saturate);
            }
        }

        #[test]
        fn both_asserted_holds(p in params(), seed in 0u64..4096) {
            let count = seed % (p.saturate + 1);
            prop_assert_eq!(
                next_count(&p, count, Some(false), Some(true), Some(true)),
                count
            );
        }
    }
}
