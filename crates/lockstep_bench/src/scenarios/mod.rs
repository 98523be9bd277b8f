//! Scenario bodies, one module per circuit.
//!
//! A scenario owns a fresh reference model, drives the device inputs on
//! falling edges and compares at rising edges. It starts with a reset, so it
//! can run on a freshly built bench or on one shared with earlier scenarios.

pub mod compass;
pub mod counter;
pub mod debounce;
pub mod edge;
pub mod konami;
pub mod shift;

use lockstep_sim::{ClockDomain, SimError, SimTime, Signal, SignalRegistry};

use crate::bench::Bench;
use crate::catalog::Target;
use crate::devices::{spawn_device, DeviceHandle, Fault};

pub(crate) fn unknown_scenario(name: &str) -> SimError {
    SimError::invalid(format!("unknown scenario `{name}`"))
}

/// The ports of one parameter set, declared on a registry.
pub enum Harness {
    /// Counter ports.
    Counter(counter::CounterBench),
    /// Debouncer ports.
    Debounce(debounce::DebounceBench),
    /// Edge detector ports.
    Edge(edge::EdgeBench),
    /// Shift register ports.
    Shift(shift::ShiftBench),
    /// Compass detector ports.
    Compass(compass::CompassBench),
    /// Cheat-code detector ports.
    Konami(konami::KonamiBench),
}

impl Harness {
    /// Declares the ports of `target`.
    pub fn declare(target: &Target, registry: &mut SignalRegistry) -> Result<Self, SimError> {
        Ok(match target {
            Target::Counter(p) => Harness::Counter(counter::CounterBench::declare(registry, *p)?),
            Target::Debounce(p) => {
                Harness::Debounce(debounce::DebounceBench::declare(registry, *p)?)
            }
            Target::Edge => Harness::Edge(edge::EdgeBench::declare(registry)?),
            Target::Shift(p) => Harness::Shift(shift::ShiftBench::declare(registry, *p)?),
            Target::Compass(g) => {
                Harness::Compass(compass::CompassBench::declare(registry, g.clone())?)
            }
            Target::Konami(g) => Harness::Konami(konami::KonamiBench::declare(registry, g.clone())?),
        })
    }

    /// Starts the stand-in device on the declared ports.
    pub fn spawn_device(
        &self,
        clock: &ClockDomain,
        reset: &Signal,
        clk_to_q: SimTime,
        fault: Option<Fault>,
    ) -> DeviceHandle {
        match self {
            Harness::Counter(h) => spawn_device(h.device(reset, fault), clock, clk_to_q),
            Harness::Debounce(h) => spawn_device(h.device(reset, fault), clock, clk_to_q),
            Harness::Edge(h) => spawn_device(h.device(reset, fault), clock, clk_to_q),
            Harness::Shift(h) => spawn_device(h.device(reset, fault), clock, clk_to_q),
            Harness::Compass(h) => spawn_device(h.device(reset, fault), clock, clk_to_q),
            Harness::Konami(h) => spawn_device(h.device(reset, fault), clock, clk_to_q),
        }
    }

    /// Runs one scenario against the device.
    pub async fn run(&self, scenario: &str, bench: &mut Bench) -> Result<(), SimError> {
        match self {
            Harness::Counter(h) => h.run(scenario, bench).await,
            Harness::Debounce(h) => h.run(scenario, bench).await,
            Harness::Edge(h) => h.run(scenario, bench).await,
            Harness::Shift(h) => h.run(scenario, bench).await,
            Harness::Compass(h) => h.run(scenario, bench).await,
            Harness::Konami(h) => h.run(scenario, bench).await,
        }
    }
}
