//! Behavioral stand-ins for the circuits under verification.
//!
//! A device reads its input signals and drives its output signals the way
//! synthesized RTL would in simulation: registered state is updated from the
//! inputs sampled at a rising clock edge and becomes visible on the outputs
//! one clock-to-output delay later. Mealy devices additionally recompute
//! their outputs after each falling edge, when the bench has changed the
//! inputs. Unknown inputs propagate to unknown outputs.
//!
//! Each device carries an optional [`Fault`] that reproduces a typical
//! design mistake, so that failing runs can be demonstrated as well as
//! passing ones.

mod counter;
mod debounce;
mod edge;
mod sequence;
mod shift;

use lockstep_sim::{delay, ClockDomain, Edge, SimError, SimTime, Signal};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

pub use counter::CounterDevice;
pub use debounce::DebounceDevice;
pub use edge::EdgeDevice;
pub use sequence::{SequenceDevice, SymbolInputs};
pub use shift::ShiftDevice;

/// A deliberate design mistake injected into a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fault {
    /// The counter wraps around instead of saturating.
    CounterWraps,
    /// The debouncer asserts one cycle before its minimum delay.
    DebounceEarly,
    /// The debouncer asserts one cycle after its maximum delay.
    DebounceLate,
    /// The edge detector pulses combinationally in the same cycle as the
    /// level change.
    EdgeSameCycle,
    /// The shift register shifts toward the least significant bit.
    ShiftReversed,
    /// The sequence detector holds its output once a goal matched.
    DetectorLatches,
}

impl Fault {
    /// Every fault, in display order.
    pub const ALL: [Fault; 6] = [
        Fault::CounterWraps,
        Fault::DebounceEarly,
        Fault::DebounceLate,
        Fault::EdgeSameCycle,
        Fault::ShiftReversed,
        Fault::DetectorLatches,
    ];

    /// The kebab-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Fault::CounterWraps => "counter-wraps",
            Fault::DebounceEarly => "debounce-early",
            Fault::DebounceLate => "debounce-late",
            Fault::EdgeSameCycle => "edge-same-cycle",
            Fault::ShiftReversed => "shift-reversed",
            Fault::DetectorLatches => "detector-latches",
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Fault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fault::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown fault `{s}`"))
    }
}

/// A clocked behavioral device.
pub trait Device: Send + 'static {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Samples the inputs at a rising edge and updates registered state.
    fn clock(&mut self);

    /// Drives every output from the current state (and, for Mealy devices,
    /// from the live inputs).
    fn drive_outputs(&self);

    /// Whether outputs depend combinationally on the inputs.
    fn is_mealy(&self) -> bool {
        false
    }
}

/// A running device task. Dropping the handle aborts it.
pub struct DeviceHandle {
    name: String,
    task: Option<JoinHandle<Result<(), SimError>>>,
}

impl DeviceHandle {
    /// The device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` while the device task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawns `device` on the current runtime, clocked by `clock`, with outputs
/// settling `clk_to_q` after each edge.
pub fn spawn_device<D: Device>(device: D, clock: &ClockDomain, clk_to_q: SimTime) -> DeviceHandle {
    let name = device.name().to_string();
    tracing::debug!(device = %name, %clk_to_q, "device started");
    let task = tokio::spawn(operate(device, clock.clone(), clk_to_q));
    DeviceHandle {
        name,
        task: Some(task),
    }
}

async fn operate<D: Device>(
    mut device: D,
    clock: ClockDomain,
    clk_to_q: SimTime,
) -> Result<(), SimError> {
    loop {
        match clock.signal().any_edge().await? {
            Edge::Rising => {
                device.clock();
                delay(clk_to_q).await;
                device.drive_outputs();
            }
            Edge::Falling if device.is_mealy() => {
                delay(clk_to_q).await;
                device.drive_outputs();
            }
            Edge::Falling => {}
        }
    }
}

/// Drives `value`, or all-`X` when the device state is unknown.
pub(crate) fn drive_or_unknown(signal: &Signal, value: Option<u64>) {
    match value {
        Some(v) => signal.drive(v),
        None => signal.set_unknown(),
    }
}

/// Reads a 1-bit input as asserted, deasserted or unknown.
pub(crate) fn sample_bit(signal: &Signal) -> Option<bool> {
    signal.value().map(|v| v != 0)
}
