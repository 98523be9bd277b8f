use lockstep_sim::Signal;

use super::{drive_or_unknown, sample_bit, Device, Fault};

#[derive(Clone, Copy, Debug, Default)]
struct Regs {
    prev: bool,
    rising: bool,
    falling: bool,
}

/// Edge detector with registered pulse outputs.
pub struct EdgeDevice {
    same_cycle: bool,
    reset: Signal,
    button_i: Signal,
    button_o: Signal,
    unbutton_o: Signal,
    regs: Option<Regs>,
}

impl EdgeDevice {
    /// Creates the device. [`Fault::EdgeSameCycle`] turns the pulses into a
    /// combinational function of the live input.
    pub fn new(
        fault: Option<Fault>,
        reset: Signal,
        button_i: Signal,
        button_o: Signal,
        unbutton_o: Signal,
    ) -> Self {
        Self {
            same_cycle: fault == Some(Fault::EdgeSameCycle),
            reset,
            button_i,
            button_o,
            unbutton_o,
            regs: None,
        }
    }
}

impl Device for EdgeDevice {
    fn name(&self) -> &str {
        "detect_edge"
    }

    fn clock(&mut self) {
        self.regs = match (sample_bit(&self.reset), sample_bit(&self.button_i)) {
            (None, _) => self.regs,
            (Some(true), _) => Some(Regs::default()),
            (Some(false), None) => None,
            (Some(false), Some(level)) => self.regs.map(|r| Regs {
                prev: level,
                rising: level && !r.prev,
                falling: !level && r.prev,
            }),
        };
    }

    fn drive_outputs(&self) {
        let (rising, falling) = if self.same_cycle {
            let level = sample_bit(&self.button_i);
            let prev = self.regs.map(|r| r.prev);
            (
                level.zip(prev).map(|(l, p)| l && !p),
                level.zip(prev).map(|(l, p)| !l && p),
            )
        } else {
            (self.regs.map(|r| r.rising), self.regs.map(|r| r.falling))
        };
        drive_or_unknown(&self.button_o, rising.map(u64::from));
        drive_or_unknown(&self.unbutton_o, falling.map(u64::from));
    }

    fn is_mealy(&self) -> bool {
        self.same_cycle
    }
}
