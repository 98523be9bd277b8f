//! Debouncer scenarios.
//!
//! The delay bounds are checked twice: directly, as bounded waits measured
//! from the falling edge that raised the input, and cycle by cycle, by a
//! monitor comparing the output with the model's envelope.

use lockstep_models::{
    check, expect_quiet_for, expect_within, spawn_monitor, DebounceModel, DebounceParams,
    Envelope, Expectation, ModelHandle,
};
use lockstep_sim::{SimError, SimTime, Signal, SignalRegistry};

use crate::bench::Bench;
use crate::devices::{DebounceDevice, Fault};

/// Scenario names, in run order.
pub const SCENARIOS: &[&str] = &["reset", "min_delay", "max_delay", "noise"];

/// Ports of the debouncer.
pub struct DebounceBench {
    params: DebounceParams,
    button_i: Signal,
    button_o: Signal,
}

impl DebounceBench {
    /// Declares `button_i` and `button_o`.
    pub fn declare(registry: &mut SignalRegistry, params: DebounceParams) -> Result<Self, SimError> {
        Ok(Self {
            params,
            button_i: registry.declare("button_i", 1)?,
            button_o: registry.declare("button_o", 1)?,
        })
    }

    /// The stand-in device on these ports.
    pub fn device(&self, reset: &Signal, fault: Option<Fault>) -> DebounceDevice {
        DebounceDevice::new(
            self.params,
            fault,
            reset.clone(),
            self.button_i.clone(),
            self.button_o.clone(),
        )
    }

    fn model(&self, bench: &Bench) -> Result<ModelHandle<DebounceModel>, SimError> {
        let model = DebounceModel::new(
            self.params,
            bench.reset_signal().clone(),
            self.button_i.clone(),
        );
        let mut handle = ModelHandle::new(model, bench.clock());
        handle.start()?;
        Ok(handle)
    }

    fn max_span(&self, bench: &Bench) -> Result<SimTime, SimError> {
        bench.cycles_span(self.params.max_delay())
    }

    /// Runs the named scenario.
    pub async fn run(&self, name: &str, bench: &mut Bench) -> Result<(), SimError> {
        let model = self.model(bench)?;
        bench
            .reset_holding_unknown(std::slice::from_ref(&self.button_i))
            .await?;
        self.button_i.drive(0);
        let monitor = spawn_monitor(bench.clock(), &self.button_o, &model, |e: Envelope| {
            Expectation::from(e)
        });
        match name {
            "reset" => self.reset(bench).await?,
            "min_delay" => self.min_delay(bench).await?,
            "max_delay" => self.max_delay(bench).await?,
            "noise" => self.noise(bench).await?,
            other => return Err(super::unknown_scenario(other)),
        }
        monitor.finish().await?;
        Ok(())
    }

    /// Reset leaves the output low, after an unknown input and after a
    /// press held through it.
    async fn reset(&self, bench: &Bench) -> Result<(), SimError> {
        bench.rising().await?;
        check(&self.button_o, 0u64)?;
        bench.falling().await?;
        self.button_i.drive(1);
        expect_within(bench.clock(), &self.button_o, 1, self.max_span(bench)?).await?;
        bench.falling().await?;
        bench.reset().await?;
        bench.rising().await?;
        check(&self.button_o, 0u64)?;
        bench.falling().await?;
        self.button_i.drive(0);
        bench.cycles(2).await?;
        Ok(())
    }

    /// A steady press must not assert the output before the minimum delay.
    async fn min_delay(&self, bench: &Bench) -> Result<(), SimError> {
        bench.rising().await?;
        check(&self.button_o, 0u64)?;
        bench.falling().await?;
        self.button_i.drive(1);
        let min_span = bench.cycles_span(self.params.min_delay)?;
        expect_quiet_for(bench.clock(), &self.button_o, 1, min_span).await?;
        Ok(())
    }

    /// A steady press must assert the output within the maximum delay.
    async fn max_delay(&self, bench: &Bench) -> Result<(), SimError> {
        bench.rising().await?;
        check(&self.button_o, 0u64)?;
        bench.falling().await?;
        self.button_i.drive(1);
        expect_within(bench.clock(), &self.button_o, 1, self.max_span(bench)?).await?;
        bench.rising().await?;
        check(&self.button_o, 1u64)?;
        Ok(())
    }

    /// Bouncing input for `min_delay` cycles, then a steady press. The
    /// output must assert within the maximum delay of the last rising
    /// transition.
    async fn noise(&self, bench: &mut Bench) -> Result<(), SimError> {
        let mut level = false;
        let mut raised_at = bench.now();
        for _ in 0..self.params.min_delay {
            let next = bench.coin();
            if next && !level {
                raised_at = bench.now();
            }
            level = next;
            self.button_i.drive_bool(level);
            bench.falling().await?;
        }
        if !level {
            raised_at = bench.now();
            self.button_i.drive(1);
        }
        let bound = self.max_span(bench)?.saturating_sub(bench.now() - raised_at);
        if bound == SimTime::zero() {
            bench.rising().await?;
            check(&self.button_o, 1u64)?;
        } else {
            expect_within(bench.clock(), &self.button_o, 1, bound).await?;
        }
        Ok(())
    }
}
