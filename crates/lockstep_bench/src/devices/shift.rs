use lockstep_models::ShiftParams;
use lockstep_sim::Signal;

use super::{drive_or_unknown, sample_bit, Device, Fault};

/// Shift register with synchronous reset, parallel load and shift enable.
pub struct ShiftDevice {
    params: ShiftParams,
    reversed: bool,
    reset: Signal,
    load: Signal,
    en: Signal,
    d: Signal,
    data_i: Signal,
    data_o: Signal,
    q: Option<u64>,
}

impl ShiftDevice {
    /// Creates the device. [`Fault::ShiftReversed`] shifts `d` in at the most
    /// significant end.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: ShiftParams,
        fault: Option<Fault>,
        reset: Signal,
        load: Signal,
        en: Signal,
        d: Signal,
        data_i: Signal,
        data_o: Signal,
    ) -> Self {
        Self {
            params,
            reversed: fault == Some(Fault::ShiftReversed),
            reset,
            load,
            en,
            d,
            data_i,
            data_o,
            q: None,
        }
    }

    fn shifted(&self, q: u64, bit: bool) -> u64 {
        let mask = self.params.mask();
        if self.reversed {
            (q >> 1) | (u64::from(bit) << (self.params.width - 1))
        } else {
            ((q << 1) | u64::from(bit)) & mask
        }
    }
}

impl Device for ShiftDevice {
    fn name(&self) -> &str {
        "shift"
    }

    fn clock(&mut self) {
        // `if (reset) .. else if (load) .. else if (en)`: an unknown control
        // takes the else branch.
        let asserted = |s: &Signal| sample_bit(s) == Some(true);
        self.q = if asserted(&self.reset) {
            Some(self.params.masked_reset_value())
        } else if asserted(&self.load) {
            self.data_i.value().map(|v| v & self.params.mask())
        } else if asserted(&self.en) {
            self.q
                .zip(sample_bit(&self.d))
                .map(|(q, bit)| self.shifted(q, bit))
        } else {
            self.q
        };
    }

    fn drive_outputs(&self) {
        drive_or_unknown(&self.data_o, self.q);
    }
}
