use lockstep_models::DebounceParams;
use lockstep_sim::Signal;

use super::{drive_or_unknown, sample_bit, Device, Fault};

/// Debouncer built from a saturating stability counter: the output asserts
/// once the raw input has been sampled high `threshold` times in a row.
pub struct DebounceDevice {
    threshold: u64,
    reset: Signal,
    button_i: Signal,
    button_o: Signal,
    stable: Option<u64>,
}

impl DebounceDevice {
    /// Creates the device. The threshold is the minimum delay, moved one
    /// cycle early by [`Fault::DebounceEarly`] or one cycle past the maximum
    /// delay by [`Fault::DebounceLate`].
    pub fn new(
        params: DebounceParams,
        fault: Option<Fault>,
        reset: Signal,
        button_i: Signal,
        button_o: Signal,
    ) -> Self {
        let threshold = match fault {
            Some(Fault::DebounceEarly) => params.min_delay - 1,
            Some(Fault::DebounceLate) => params.max_delay(),
            _ => params.min_delay,
        };
        Self {
            threshold,
            reset,
            button_i,
            button_o,
            stable: None,
        }
    }
}

impl Device for DebounceDevice {
    fn name(&self) -> &str {
        "debounce"
    }

    fn clock(&mut self) {
        self.stable = match (sample_bit(&self.reset), sample_bit(&self.button_i)) {
            (None, _) => None,
            (Some(true), _) => Some(0),
            (Some(false), None) => None,
            (Some(false), Some(false)) => Some(0),
            (Some(false), Some(true)) => self.stable.map(|n| (n + 1).min(self.threshold)),
        };
    }

    fn drive_outputs(&self) {
        drive_or_unknown(
            &self.button_o,
            self.stable.map(|n| u64::from(n >= self.threshold)),
        );
    }
}
