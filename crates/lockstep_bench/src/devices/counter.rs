use lockstep_common::width_mask;
use lockstep_models::CounterParams;
use lockstep_sim::Signal;

use super::{drive_or_unknown, sample_bit, Device, Fault};

/// Saturating up/down counter with a synchronous reset.
pub struct CounterDevice {
    params: CounterParams,
    wraps: bool,
    reset: Signal,
    up: Signal,
    down: Signal,
    count_o: Signal,
    count: Option<u64>,
}

impl CounterDevice {
    /// Creates the device. Only [`Fault::CounterWraps`] affects it.
    pub fn new(
        params: CounterParams,
        fault: Option<Fault>,
        reset: Signal,
        up: Signal,
        down: Signal,
        count_o: Signal,
    ) -> Self {
        Self {
            params,
            wraps: fault == Some(Fault::CounterWraps),
            reset,
            up,
            down,
            count_o,
            count: None,
        }
    }
}

impl Device for CounterDevice {
    fn name(&self) -> &str {
        "counter_sat"
    }

    fn clock(&mut self) {
        let top = width_mask(self.params.width);
        self.count = match sample_bit(&self.reset) {
            None => None,
            Some(true) => Some(self.params.reset_value),
            Some(false) => match (self.count, sample_bit(&self.up), sample_bit(&self.down)) {
                (None, _, _) => None,
                (Some(c), Some(true), Some(false)) if self.wraps => Some(c.wrapping_add(1) & top),
                (Some(c), Some(false), Some(true)) if self.wraps => Some(c.wrapping_sub(1) & top),
                (Some(c), Some(true), Some(false)) if c < self.params.saturate => Some(c + 1),
                (Some(c), Some(false), Some(true)) if c > 0 => Some(c - 1),
                (Some(c), Some(_), Some(_)) => Some(c),
                (Some(_), _, _) => None,
            },
        };
    }

    fn drive_outputs(&self) {
        drive_or_unknown(&self.count_o, self.count);
    }
}
