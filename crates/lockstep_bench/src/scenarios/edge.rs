//! Edge detector scenarios.

use lockstep_models::{
    check, spawn_monitor, EdgeModel, EdgePulses, Expectation, ModelHandle,
};
use lockstep_sim::{SimError, Signal, SignalRegistry};

use crate::bench::Bench;
use crate::devices::{EdgeDevice, Fault};

/// Scenario names, in run order.
pub const SCENARIOS: &[&str] = &["posedge", "negedge", "random"];

const QUIET_CYCLES: u64 = 10;
const RANDOM_CYCLES: u64 = 200;

/// Ports of the edge detector.
pub struct EdgeBench {
    button_i: Signal,
    button_o: Signal,
    unbutton_o: Signal,
}

impl EdgeBench {
    /// Declares `button_i`, `button_o` (rising pulse) and `unbutton_o`
    /// (falling pulse).
    pub fn declare(registry: &mut SignalRegistry) -> Result<Self, SimError> {
        Ok(Self {
            button_i: registry.declare("button_i", 1)?,
            button_o: registry.declare("button_o", 1)?,
            unbutton_o: registry.declare("unbutton_o", 1)?,
        })
    }

    /// The stand-in device on these ports.
    pub fn device(&self, reset: &Signal, fault: Option<Fault>) -> EdgeDevice {
        EdgeDevice::new(
            fault,
            reset.clone(),
            self.button_i.clone(),
            self.button_o.clone(),
            self.unbutton_o.clone(),
        )
    }

    /// Runs the named scenario.
    pub async fn run(&self, name: &str, bench: &mut Bench) -> Result<(), SimError> {
        let model = EdgeModel::new(bench.reset_signal().clone(), self.button_i.clone());
        let mut model = ModelHandle::new(model, bench.clock());
        model.start()?;
        bench
            .reset_holding_unknown(std::slice::from_ref(&self.button_i))
            .await?;
        self.button_i.drive(0);
        let rising = spawn_monitor(bench.clock(), &self.button_o, &model, |p: EdgePulses| {
            Expectation::from(p.rising)
        });
        let falling = spawn_monitor(bench.clock(), &self.unbutton_o, &model, |p: EdgePulses| {
            Expectation::from(p.falling)
        });
        match name {
            "posedge" => self.pulse(bench, true, &self.button_o).await?,
            "negedge" => {
                self.button_i.drive(1);
                bench.cycles(QUIET_CYCLES).await?;
                self.pulse(bench, false, &self.unbutton_o).await?;
            }
            "random" => self.random(bench).await?,
            other => return Err(super::unknown_scenario(other)),
        }
        rising.finish().await?;
        falling.finish().await?;
        Ok(())
    }

    /// Moves the input to `level` after a quiet stretch and expects exactly
    /// one pulse on `output`, registered one cycle late.
    async fn pulse(&self, bench: &Bench, level: bool, output: &Signal) -> Result<(), SimError> {
        for _ in 0..QUIET_CYCLES {
            bench.rising().await?;
            check(output, 0u64)?;
        }
        bench.falling().await?;
        self.button_i.drive_bool(level);
        bench.rising().await?;
        // A pulse here means the output follows the input combinationally.
        check(output, 0u64)?;
        bench.rising().await?;
        check(output, 1u64)?;
        for _ in 0..QUIET_CYCLES {
            bench.rising().await?;
            check(output, 0u64)?;
        }
        Ok(())
    }

    /// Random levels, checked by the monitors on every edge.
    async fn random(&self, bench: &mut Bench) -> Result<(), SimError> {
        for _ in 0..RANDOM_CYCLES {
            let level = bench.coin();
            self.button_i.drive_bool(level);
            bench.falling().await?;
        }
        Ok(())
    }
}
