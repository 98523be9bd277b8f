//! Shift register with parallel load.

use lockstep_common::width_mask;
use lockstep_sim::{SimError, Signal};

use crate::model::Model;

/// Parameters of a shift register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShiftParams {
    /// Register width in bits.
    pub width: u32,
    /// Value loaded by reset. Bits at or above `width` are dropped.
    pub reset_value: u64,
}

impl ShiftParams {
    /// Checks the width.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(1..=64).contains(&self.width) {
            return Err(SimError::invalid(format!(
                "shift register width {} outside 1..=64",
                self.width
            )));
        }
        Ok(())
    }

    /// Mask of the register bits.
    pub fn mask(&self) -> u64 {
        width_mask(self.width)
    }

    /// The reset value as the register holds it.
    pub fn masked_reset_value(&self) -> u64 {
        self.reset_value & self.mask()
    }
}

/// Control inputs sampled at one rising edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShiftControls {
    /// Reset asserted.
    pub reset: bool,
    /// Parallel load asserted.
    pub load: bool,
    /// Shift enable asserted.
    pub enable: bool,
}

/// One rising-edge transition. `data` and `d` are only consulted when the
/// controls select them.
pub fn next_state(
    params: &ShiftParams,
    current: u64,
    controls: ShiftControls,
    data: impl FnOnce() -> Result<u64, SimError>,
    d: impl FnOnce() -> Result<bool, SimError>,
) -> Result<u64, SimError> {
    let mask = params.mask();
    if controls.reset {
        Ok(params.masked_reset_value())
    } else if controls.load {
        Ok(data()? & mask)
    } else if controls.enable {
        Ok(((current << 1) | u64::from(d()?)) & mask)
    } else {
        Ok(current)
    }
}

/// Reference model of the shift register. Moore output: the committed
/// register contents.
pub struct ShiftModel {
    params: ShiftParams,
    reset: Signal,
    load: Signal,
    enable: Signal,
    d: Signal,
    data: Signal,
    state: u64,
    next: u64,
}

impl ShiftModel {
    /// Creates a model sampling the given inputs.
    pub fn new(
        params: ShiftParams,
        reset: Signal,
        load: Signal,
        enable: Signal,
        d: Signal,
        data: Signal,
    ) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            params,
            reset,
            load,
            enable,
            d,
            data,
            state: 0,
            next: 0,
        })
    }
}

/// Unresolved controls read as deasserted.
fn asserted(signal: &Signal) -> bool {
    matches!(signal.value(), Some(v) if v != 0)
}

impl Model for ShiftModel {
    type Output = u64;

    fn name(&self) -> &str {
        "shift"
    }

    fn on_rising(&mut self) -> Result<(), SimError> {
        let controls = ShiftControls {
            reset: asserted(&self.reset),
            load: asserted(&self.load),
            enable: asserted(&self.enable),
        };
        self.next = next_state(
            &self.params,
            self.state,
            controls,
            || self.data.require_u64(),
            || self.d.require_bool(),
        )?;
        Ok(())
    }

    fn on_falling(&mut self) {
        self.state = self.next;
    }

    fn output(&self) -> Result<u64, SimError> {
        Ok(self.state)
    }
}
