//! Saturating counter scenarios.

use lockstep_models::{
    check, check_model, expect_within, spawn_monitor, CounterModel, CounterParams, Expectation,
    ModelHandle,
};
use lockstep_sim::{SimError, Signal, SignalRegistry};

use crate::bench::Bench;
use crate::devices::{CounterDevice, Fault};

/// Scenario names, in run order.
pub const SCENARIOS: &[&str] = &[
    "reset",
    "reset_twice",
    "saturate_up",
    "saturate_down",
    "single_cycle",
    "fuzz",
];

const FUZZ_CYCLES: u64 = 1_000;

/// Ports of the counter.
pub struct CounterBench {
    params: CounterParams,
    up: Signal,
    down: Signal,
    count: Signal,
}

impl CounterBench {
    /// Declares `up_i`, `down_i` and `count_o`.
    pub fn declare(registry: &mut SignalRegistry, params: CounterParams) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            params,
            up: registry.declare("up_i", 1)?,
            down: registry.declare("down_i", 1)?,
            count: registry.declare("count_o", params.width)?,
        })
    }

    /// The stand-in device on these ports.
    pub fn device(&self, reset: &Signal, fault: Option<Fault>) -> CounterDevice {
        CounterDevice::new(
            self.params,
            fault,
            reset.clone(),
            self.up.clone(),
            self.down.clone(),
            self.count.clone(),
        )
    }

    fn model(&self, bench: &Bench) -> Result<ModelHandle<CounterModel>, SimError> {
        let model = CounterModel::new(
            self.params,
            bench.reset_signal().clone(),
            self.up.clone(),
            self.down.clone(),
        )?;
        let mut handle = ModelHandle::new(model, bench.clock());
        handle.start()?;
        Ok(handle)
    }

    fn set(&self, up: bool, down: bool) {
        self.up.drive_bool(up);
        self.down.drive_bool(down);
    }

    /// Runs the named scenario.
    pub async fn run(&self, name: &str, bench: &mut Bench) -> Result<(), SimError> {
        let model = self.model(bench)?;
        bench
            .reset_holding_unknown(&[self.up.clone(), self.down.clone()])
            .await?;
        self.set(false, false);
        let monitor = spawn_monitor(bench.clock(), &self.count, &model, Expectation::from);
        match name {
            "reset" => self.reset(bench, &model).await?,
            "reset_twice" => self.reset_twice(bench, &model).await?,
            "saturate_up" => self.saturate_up(bench).await?,
            "saturate_down" => self.saturate_down(bench).await?,
            "single_cycle" => self.single_cycle(bench, &model).await?,
            "fuzz" => self.fuzz(bench).await?,
            other => return Err(super::unknown_scenario(other)),
        }
        monitor.finish().await?;
        Ok(())
    }

    /// Reset loads the reset value, whether the inputs were unknown during
    /// it or asking to count.
    async fn reset(&self, bench: &Bench, model: &ModelHandle<CounterModel>) -> Result<(), SimError> {
        bench.rising().await?;
        check(&self.count, self.params.reset_value)?;
        bench.falling().await?;
        self.set(true, false);
        bench.reset().await?;
        self.set(false, false);
        for _ in 0..3 {
            bench.rising().await?;
            check(&self.count, self.params.reset_value)?;
            check_model(&self.count, model, Expectation::from)?;
        }
        Ok(())
    }

    /// Counting, then resetting twice in a row, lands on the reset value.
    async fn reset_twice(
        &self,
        bench: &Bench,
        model: &ModelHandle<CounterModel>,
    ) -> Result<(), SimError> {
        let toward = self.params.reset_value < self.params.saturate;
        self.set(toward, !toward);
        bench.cycles(3).await?;
        self.set(false, false);
        for _ in 0..2 {
            bench.reset().await?;
            bench.rising().await?;
            check(&self.count, self.params.reset_value)?;
            check_model(&self.count, model, Expectation::from)?;
        }
        Ok(())
    }

    /// Counting up reaches the ceiling in time and stays there.
    async fn saturate_up(&self, bench: &Bench) -> Result<(), SimError> {
        let steps = self.params.saturate - self.params.reset_value;
        self.set(true, false);
        expect_within(
            bench.clock(),
            &self.count,
            self.params.saturate,
            bench.cycles_span(steps.saturating_add(1))?,
        )
        .await?;
        for _ in 0..2 {
            bench.rising().await?;
            check(&self.count, self.params.saturate)?;
        }
        Ok(())
    }

    /// Counting down reaches zero in time and stays there.
    async fn saturate_down(&self, bench: &Bench) -> Result<(), SimError> {
        self.set(false, true);
        expect_within(
            bench.clock(),
            &self.count,
            0,
            bench.cycles_span(self.params.reset_value.saturating_mul(2).saturating_add(1))?,
        )
        .await?;
        for _ in 0..2 {
            bench.rising().await?;
            check(&self.count, 0u64)?;
        }
        Ok(())
    }

    /// Every `(up, down)` combination, one cycle each, from reset.
    async fn single_cycle(
        &self,
        bench: &Bench,
        model: &ModelHandle<CounterModel>,
    ) -> Result<(), SimError> {
        for (up, down) in [(false, false), (false, true), (true, false), (true, true)] {
            bench.reset().await?;
            self.set(up, down);
            bench.falling().await?;
            self.set(false, false);
            for _ in 0..2 {
                bench.rising().await?;
                check_model(&self.count, model, Expectation::from)?;
            }
        }
        Ok(())
    }

    /// Random `up`/`down` traffic, checked by the monitor on every edge.
    async fn fuzz(&self, bench: &mut Bench) -> Result<(), SimError> {
        for _ in 0..FUZZ_CYCLES {
            let pick = bench.upto(4);
            self.set(pick == 1 || pick == 3, pick == 2 || pick == 3);
            bench.falling().await?;
        }
        Ok(())
    }
}
