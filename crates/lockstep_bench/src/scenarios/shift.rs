//! Shift register scenarios.

use lockstep_models::{
    check, check_model, spawn_monitor, Expectation, ModelHandle, ShiftModel, ShiftParams,
};
use lockstep_sim::{SimError, Signal, SignalRegistry};

use crate::bench::Bench;
use crate::devices::{Fault, ShiftDevice};

/// Scenario names, in run order.
pub const SCENARIOS: &[&str] = &["reset", "load", "enable_tick", "hold", "free_run"];

const FREE_RUN_CYCLES: u64 = 100;

/// Ports of the shift register.
pub struct ShiftBench {
    params: ShiftParams,
    load: Signal,
    en: Signal,
    d: Signal,
    data_i: Signal,
    data_o: Signal,
}

impl ShiftBench {
    /// Declares `load_i`, `en_i`, `d_i`, `data_i` and `data_o`.
    pub fn declare(registry: &mut SignalRegistry, params: ShiftParams) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            params,
            load: registry.declare("load_i", 1)?,
            en: registry.declare("en_i", 1)?,
            d: registry.declare("d_i", 1)?,
            data_i: registry.declare("data_i", params.width)?,
            data_o: registry.declare("data_o", params.width)?,
        })
    }

    /// The stand-in device on these ports.
    pub fn device(&self, reset: &Signal, fault: Option<Fault>) -> ShiftDevice {
        ShiftDevice::new(
            self.params,
            fault,
            reset.clone(),
            self.load.clone(),
            self.en.clone(),
            self.d.clone(),
            self.data_i.clone(),
            self.data_o.clone(),
        )
    }

    fn model(&self, bench: &Bench) -> Result<ModelHandle<ShiftModel>, SimError> {
        let model = ShiftModel::new(
            self.params,
            bench.reset_signal().clone(),
            self.load.clone(),
            self.en.clone(),
            self.d.clone(),
            self.data_i.clone(),
        )?;
        let mut handle = ModelHandle::new(model, bench.clock());
        handle.start()?;
        Ok(handle)
    }

    fn idle(&self) {
        self.load.drive(0);
        self.en.drive(0);
        self.d.drive(0);
        self.data_i.drive(0);
    }

    fn inputs(&self) -> [Signal; 4] {
        [
            self.load.clone(),
            self.en.clone(),
            self.d.clone(),
            self.data_i.clone(),
        ]
    }

    /// Runs the named scenario.
    pub async fn run(&self, name: &str, bench: &mut Bench) -> Result<(), SimError> {
        let model = self.model(bench)?;
        bench.reset_holding_unknown(&self.inputs()).await?;
        self.idle();
        let monitor = spawn_monitor(bench.clock(), &self.data_o, &model, Expectation::from);
        match name {
            "reset" => self.reset(bench).await?,
            "load" => self.load(bench, &model).await?,
            "enable_tick" => self.enable_tick(bench, &model).await?,
            "hold" => self.hold(bench).await?,
            "free_run" => self.free_run(bench).await?,
            other => return Err(super::unknown_scenario(other)),
        }
        monitor.finish().await?;
        Ok(())
    }

    /// Reset loads the reset value, cut to the register width.
    async fn reset(&self, bench: &Bench) -> Result<(), SimError> {
        for _ in 0..3 {
            bench.rising().await?;
            check(&self.data_o, self.params.masked_reset_value())?;
        }
        Ok(())
    }

    /// A parallel load replaces every bit.
    async fn load(&self, bench: &Bench, model: &ModelHandle<ShiftModel>) -> Result<(), SimError> {
        let value = self.params.masked_reset_value() ^ self.params.mask();
        self.data_i.drive(value);
        self.load.drive(1);
        bench.falling().await?;
        self.load.drive(0);
        self.data_i.drive(0);
        for _ in 0..2 {
            bench.rising().await?;
            check(&self.data_o, value)?;
            check_model(&self.data_o, model, Expectation::from)?;
        }
        Ok(())
    }

    /// One enabled shift of a `1`, then, from a fresh reset, of a `0`.
    async fn enable_tick(
        &self,
        bench: &Bench,
        model: &ModelHandle<ShiftModel>,
    ) -> Result<(), SimError> {
        for bit in [true, false] {
            self.d.drive_bool(bit);
            self.en.drive(1);
            bench.falling().await?;
            self.en.drive(0);
            let expected = ((self.params.masked_reset_value() << 1) | u64::from(bit))
                & self.params.mask();
            bench.rising().await?;
            check(&self.data_o, expected)?;
            check_model(&self.data_o, model, Expectation::from)?;
            bench.falling().await?;
            bench.reset().await?;
        }
        Ok(())
    }

    /// With `en` low the serial input is ignored.
    async fn hold(&self, bench: &Bench) -> Result<(), SimError> {
        let held = self.params.masked_reset_value();
        for bit in [true, false] {
            self.d.drive_bool(bit);
            for _ in 0..2 {
                bench.rising().await?;
                check(&self.data_o, held)?;
            }
            bench.falling().await?;
        }
        Ok(())
    }

    /// Random enables, serial bits, loads and load data, checked by the
    /// monitor on every edge.
    async fn free_run(&self, bench: &mut Bench) -> Result<(), SimError> {
        for _ in 0..FREE_RUN_CYCLES {
            let en = bench.coin();
            let d = bench.coin();
            let data = bench.upto(self.params.mask());
            let load = bench.upto(10) == 1;
            self.en.drive_bool(en);
            self.d.drive_bool(d);
            self.data_i.drive(data);
            self.load.drive_bool(load);
            bench.falling().await?;
        }
        self.idle();
        Ok(())
    }
}
