//! Compass sequence detector scenarios.
//!
//! Every valid direction is preceded by a random number of idle cycles with
//! a random value on the direction bus; the monitor checks the match output
//! on every rising edge.

use lockstep_models::{
    compass_code, spawn_monitor, CompassDecoder, Expectation, GoalSet, ModelHandle,
    SequenceModel, COMPASS_ALPHABET,
};
use lockstep_sim::{SimError, Signal, SignalRegistry};

use crate::bench::Bench;
use crate::devices::{Fault, SequenceDevice, SymbolInputs};

/// Scenario names, in run order.
pub const SCENARIOS: &[&str] = &["symbols", "goals", "reversed_goals", "mixed", "all_goals"];

const MIXED: [&str; 3] = ["EWNSN", "WSEW", "NSNSE"];

/// Ports of the compass detector.
pub struct CompassBench {
    goals: GoalSet,
    valid: Signal,
    direction: Signal,
    match_o: Signal,
}

impl CompassBench {
    /// Declares `valid_i`, `dir_i` and `match_o`.
    pub fn declare(registry: &mut SignalRegistry, goals: GoalSet) -> Result<Self, SimError> {
        Ok(Self {
            goals,
            valid: registry.declare("valid_i", 1)?,
            direction: registry.declare("dir_i", 2)?,
            match_o: registry.declare("match_o", 1)?,
        })
    }

    /// The stand-in device on these ports.
    pub fn device(&self, reset: &Signal, fault: Option<Fault>) -> SequenceDevice {
        SequenceDevice::new(
            "compass",
            self.goals.goals(),
            fault,
            reset.clone(),
            SymbolInputs::Compass {
                valid: self.valid.clone(),
                direction: self.direction.clone(),
            },
            self.match_o.clone(),
        )
    }

    /// The direction strings fed by the named scenario, each from reset.
    fn sequences(&self, name: &str) -> Result<Vec<String>, SimError> {
        let goals = self.goals.goals();
        Ok(match name {
            "symbols" => COMPASS_ALPHABET.chars().map(String::from).collect(),
            "goals" => goals.to_vec(),
            "reversed_goals" => goals.iter().map(|g| g.chars().rev().collect()).collect(),
            "mixed" => MIXED.iter().map(|s| s.to_string()).collect(),
            "all_goals" => vec![goals.concat()],
            other => return Err(super::unknown_scenario(other)),
        })
    }

    /// Runs the named scenario.
    pub async fn run(&self, name: &str, bench: &mut Bench) -> Result<(), SimError> {
        let sequences = self.sequences(name)?;
        let decoder = CompassDecoder::new(self.valid.clone(), self.direction.clone());
        let model = SequenceModel::new(
            "compass",
            decoder,
            bench.reset_signal().clone(),
            self.goals.clone(),
        );
        let mut model = ModelHandle::new(model, bench.clock());
        model.start()?;
        bench
            .reset_holding_unknown(&[self.valid.clone(), self.direction.clone()])
            .await?;
        self.valid.drive(0);
        self.direction.drive(0);
        let monitor = spawn_monitor(bench.clock(), &self.match_o, &model, Expectation::from);
        for (i, sequence) in sequences.iter().enumerate() {
            if i > 0 {
                bench.reset().await?;
            }
            tracing::debug!(sequence = %sequence, "feeding compass directions");
            for symbol in sequence.chars() {
                let code = compass_code(symbol).ok_or_else(|| {
                    SimError::invalid(format!("`{symbol}` is not a compass direction"))
                })?;
                self.idle_cycles(bench).await?;
                self.valid.drive(1);
                self.direction.drive(code);
                bench.falling().await?;
            }
            self.valid.drive(0);
            bench.cycles(2).await?;
        }
        monitor.finish().await?;
        Ok(())
    }

    /// Idle cycles until a one-in-eleven draw comes up.
    async fn idle_cycles(&self, bench: &mut Bench) -> Result<(), SimError> {
        loop {
            self.valid.drive(0);
            self.direction.drive(bench.upto(3));
            bench.falling().await?;
            if bench.upto(10) == 5 {
                return Ok(());
            }
        }
    }
}
