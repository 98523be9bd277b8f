//! Running catalogs of scenarios.
//!
//! In [`RunMode::Each`] every scenario gets its own runtime, clock, signals
//! and device. In [`RunMode::Shared`] the scenarios of one parameter set run
//! back to back on a single bench, each starting from a reset. Either way
//! every scenario draws from its own random stream, so results do not depend
//! on the mode or on which other scenarios were selected.

use std::path::{Path, PathBuf};

use lockstep_config::{RunConfig, RunMode};
use lockstep_sim::{scenario_runtime, ClockDomain, SimError, SimTime, Signal, SignalRegistry, Timebase};

use crate::bench::{scenario_rng, Bench};
use crate::catalog::{Catalog, ScenarioEntry, Target, TargetEntry};
use crate::devices::{DeviceHandle, Fault};
use crate::outcome::{FailureReport, RunReport, ScenarioOutcome};
use crate::scenarios::Harness;

/// Settings of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Base seed of the per-scenario random streams.
    pub seed: u64,
    /// Scenario isolation.
    pub mode: RunMode,
    /// Clock period.
    pub clock_period: SimTime,
    /// Clock-to-output delay of the devices.
    pub clk_to_q: SimTime,
    /// Reset pulse length in cycles.
    pub reset_cycles: u32,
    /// Simulated time after which a scenario is abandoned.
    pub time_limit: SimTime,
    /// Directory receiving one VCD trace per bench.
    pub trace_dir: Option<PathBuf>,
    /// Fault injected into the devices it applies to.
    pub fault: Option<Fault>,
}

impl From<&RunConfig> for RunOptions {
    fn from(run: &RunConfig) -> Self {
        Self {
            seed: run.seed,
            mode: run.mode,
            clock_period: run.clock_period,
            clk_to_q: run.clk_to_q,
            reset_cycles: run.reset_cycles,
            time_limit: run.time_limit,
            trace_dir: run.trace_dir.clone(),
            fault: None,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&RunConfig::default())
    }
}

/// Runs every scenario of `catalog`.
///
/// Scenario failures are reported in the outcomes. An `Err` means the run
/// itself could not proceed: the runtime could not be built or a trace
/// could not be written.
pub fn run_catalog(catalog: &Catalog, options: &RunOptions) -> Result<RunReport, SimError> {
    tracing::info!(
        scenarios = catalog.len(),
        seed = options.seed,
        mode = %options.mode,
        "starting run"
    );
    let mut outcomes = Vec::with_capacity(catalog.len());
    for entry in catalog.entries() {
        match options.mode {
            RunMode::Each => {
                for scenario in &entry.scenarios {
                    outcomes.push(run_isolated(&entry.target, scenario, options)?);
                }
            }
            RunMode::Shared => outcomes.extend(run_shared(entry, options)?),
        }
    }
    let report = RunReport {
        seed: options.seed,
        outcomes,
    };
    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        "run finished"
    );
    Ok(report)
}

fn run_isolated(
    target: &Target,
    scenario: &ScenarioEntry,
    options: &RunOptions,
) -> Result<ScenarioOutcome, SimError> {
    scenario_runtime()?.block_on(isolated(target, scenario, options))
}

async fn isolated(
    target: &Target,
    scenario: &ScenarioEntry,
    options: &RunOptions,
) -> Result<ScenarioOutcome, SimError> {
    let rig = match Rig::build(target, &scenario.full_name, options) {
        Ok(rig) => rig,
        Err(e) => return Ok(outcome(target, scenario, SimTime::zero(), Err(e))),
    };
    let mut bench = rig.bench(scenario_rng(options.seed, scenario.index), options);
    let result = execute(&rig.harness, scenario, &mut bench, options.time_limit).await;
    let done = outcome(target, scenario, bench.now(), result);
    rig.write_trace(options.trace_dir.as_deref(), &scenario.full_name)?;
    Ok(done)
}

fn run_shared(entry: &TargetEntry, options: &RunOptions) -> Result<Vec<ScenarioOutcome>, SimError> {
    scenario_runtime()?.block_on(shared(entry, options))
}

async fn shared(entry: &TargetEntry, options: &RunOptions) -> Result<Vec<ScenarioOutcome>, SimError> {
    let label = entry.target.label();
    let rig = match Rig::build(&entry.target, &label, options) {
        Ok(rig) => rig,
        Err(e) => {
            return Ok(entry
                .scenarios
                .iter()
                .map(|s| outcome(&entry.target, s, SimTime::zero(), Err(e.clone())))
                .collect())
        }
    };
    let mut bench = rig.bench(scenario_rng(options.seed, 0), options);
    let mut outcomes = Vec::with_capacity(entry.scenarios.len());
    for scenario in &entry.scenarios {
        bench.reseed(scenario_rng(options.seed, scenario.index));
        // Start on a driving point, whatever edge the last scenario ended on.
        let result = match bench.falling().await {
            Ok(()) => execute(&rig.harness, scenario, &mut bench, options.time_limit).await,
            Err(e) => Err(e),
        };
        outcomes.push(outcome(&entry.target, scenario, bench.now(), result));
    }
    rig.write_trace(options.trace_dir.as_deref(), &label)?;
    Ok(outcomes)
}

async fn execute(
    harness: &Harness,
    scenario: &ScenarioEntry,
    bench: &mut Bench,
    time_limit: SimTime,
) -> Result<(), SimError> {
    tracing::info!(scenario = %scenario.full_name, start = %bench.now(), "scenario started");
    let bounded = tokio::time::timeout(time_limit.to_runtime(), harness.run(scenario.name, bench)).await;
    let result = match bounded {
        Ok(result) => result,
        Err(_) => Err(SimError::Timeout {
            what: format!("scenario `{}` to finish", scenario.full_name),
            after: time_limit,
            time: bench.now(),
        }),
    };
    match &result {
        Ok(()) => tracing::info!(scenario = %scenario.full_name, end = %bench.now(), "scenario passed"),
        Err(e) => tracing::warn!(scenario = %scenario.full_name, error = %e, "scenario failed"),
    }
    result
}

fn outcome(
    target: &Target,
    scenario: &ScenarioEntry,
    sim_time: SimTime,
    result: Result<(), SimError>,
) -> ScenarioOutcome {
    ScenarioOutcome {
        circuit: target.circuit(),
        target: target.label(),
        scenario: scenario.name.to_string(),
        index: scenario.index,
        sim_time,
        failure: result.err().as_ref().map(FailureReport::from),
    }
}

/// Signals, clock and device of one bench.
struct Rig {
    registry: SignalRegistry,
    clock: ClockDomain,
    reset: Signal,
    harness: Harness,
    _device: DeviceHandle,
}

impl Rig {
    /// Declares the ports of `target`, starts the clock and the device.
    /// Must run inside the scenario runtime.
    fn build(target: &Target, scope: &str, options: &RunOptions) -> Result<Self, SimError> {
        let timebase = Timebase::start();
        let mut registry = match options.trace_dir {
            Some(_) => SignalRegistry::with_trace(timebase, &trace_stem(scope)),
            None => SignalRegistry::new(timebase),
        };
        let clk = registry.declare("clk_i", 1)?;
        let reset = registry.declare("reset_i", 1)?;
        let harness = Harness::declare(target, &mut registry)?;
        let clock = ClockDomain::new(clk, options.clock_period)?;
        clock.start()?;
        let device = harness.spawn_device(&clock, &reset, options.clk_to_q, options.fault);
        Ok(Self {
            registry,
            clock,
            reset,
            harness,
            _device: device,
        })
    }

    fn bench(&self, rng: rand_chacha::ChaCha8Rng, options: &RunOptions) -> Bench {
        Bench::new(
            self.clock.clone(),
            self.reset.clone(),
            options.reset_cycles,
            rng,
        )
    }

    fn write_trace(&self, dir: Option<&Path>, name: &str) -> Result<(), SimError> {
        let (Some(dir), Some(vcd)) = (dir, self.registry.render_trace()) else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.vcd", trace_stem(name)));
        std::fs::write(&path, vcd?)?;
        tracing::debug!(path = %path.display(), "trace written");
        Ok(())
    }
}

/// File-system friendly form of a scenario or parameter set name.
fn trace_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    stem.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_models::CounterParams;

    /// `up_i` at every rising edge of the first reset pulse.
    async fn up_while_reset_held(clock: ClockDomain, reset: Signal, up: Signal) -> Vec<Option<u64>> {
        let mut held = Vec::new();
        loop {
            clock.rising_edge().await.unwrap();
            match reset.value() {
                Some(1) => held.push(up.value()),
                Some(_) if !held.is_empty() => return held,
                _ => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn inputs_stay_unknown_through_the_opening_reset() {
        let target = Target::Counter(CounterParams {
            width: 4,
            reset_value: 3,
            saturate: 9,
        });
        let options = RunOptions::default();
        let rig = Rig::build(&target, "counter", &options).unwrap();
        let up = rig.registry.get("up_i").unwrap();
        let sampler = tokio::spawn(up_while_reset_held(rig.clock.clone(), rig.reset.clone(), up));
        tokio::task::yield_now().await;
        let scenario = ScenarioEntry {
            index: 0,
            name: "reset",
            full_name: "counter/reset".to_string(),
        };
        let mut bench = rig.bench(scenario_rng(options.seed, 0), &options);
        execute(&rig.harness, &scenario, &mut bench, options.time_limit)
            .await
            .unwrap();
        assert_eq!(sampler.await.unwrap(), vec![None; 10]);
    }

    #[test]
    fn trace_stems() {
        assert_eq!(trace_stem("counter(w=7,r=11,s=67)/fuzz"), "counter_w_7_r_11_s_67_fuzz");
        assert_eq!(trace_stem("edge/posedge"), "edge_posedge");
    }

    #[test]
    fn options_follow_run_config() {
        let options = RunOptions::default();
        assert_eq!(options.seed, 42);
        assert_eq!(options.mode, RunMode::Each);
        assert_eq!(options.clock_period, SimTime::from_ns(1));
        assert_eq!(options.fault, None);
    }
}
