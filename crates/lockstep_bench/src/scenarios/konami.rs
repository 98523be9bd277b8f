//! Cheat-code detector scenarios.
//!
//! Each cycle presents exactly one button, one-hot, with no idle cycles in
//! between.

use lockstep_models::{
    spawn_monitor, Expectation, GoalSet, KonamiDecoder, ModelHandle, SequenceModel,
    KONAMI_ALPHABET,
};
use lockstep_sim::{SimError, Signal, SignalRegistry};

use crate::bench::Bench;
use crate::devices::{Fault, SequenceDevice, SymbolInputs};

/// Scenario names with the button string each one feeds.
const SEQUENCES: [(&str, &str); 11] = [
    ("presses", "UUDDLRLRBAS"),
    ("releases", "uuddlrlrbas"),
    ("presses_then_releases", "UUDDLRLRBASuuddlrlrbas"),
    ("reversed", "SsAaBbRrLlRrLlDdDdUuUu"),
    ("exact", "UuUuDdDdLlRrLlRrBbAaSs"),
    ("extra_prefix", "UuUuUuUuDdDdLlRrLlRrBbAaSs"),
    ("reversed_extra_suffix", "SsAaBbRrLlRrLlDdDdUuUuUu"),
    ("extra_suffix", "UuUuUuUuDdDdLlRrLlRrBbAaSsSs"),
    ("reversed_extra_prefix", "SsSsAaBbRrLlRrLlDdDdUuUuUu"),
    ("twice", "UuUuDdDdLlRrLlRrBbAaSsUuUuDdDdLlRrLlRrBbAaSs"),
    ("reversed_twice", "SsAaBbRrLlRrLlDdDdUuUuSsAaBbRrLlRrLlDdDdUuUu"),
];

/// Scenario names, in run order.
pub const SCENARIOS: &[&str] = &[
    SEQUENCES[0].0,
    SEQUENCES[1].0,
    SEQUENCES[2].0,
    SEQUENCES[3].0,
    SEQUENCES[4].0,
    SEQUENCES[5].0,
    SEQUENCES[6].0,
    SEQUENCES[7].0,
    SEQUENCES[8].0,
    SEQUENCES[9].0,
    SEQUENCES[10].0,
];

/// Ports of the cheat-code detector.
pub struct KonamiBench {
    goals: GoalSet,
    buttons: Vec<Signal>,
    match_o: Signal,
}

/// Port name of the button carrying `symbol`.
fn button_port(symbol: char) -> String {
    let button = match symbol.to_ascii_uppercase() {
        'U' => "up",
        'R' => "right",
        'D' => "down",
        'L' => "left",
        'A' => "a",
        'B' => "b",
        _ => "start",
    };
    let action = if symbol.is_ascii_uppercase() {
        "press"
    } else {
        "release"
    };
    format!("{button}_{action}_i")
}

impl KonamiBench {
    /// Declares one input per button symbol and `match_o`.
    pub fn declare(registry: &mut SignalRegistry, goals: GoalSet) -> Result<Self, SimError> {
        let buttons = KONAMI_ALPHABET
            .chars()
            .map(|symbol| registry.declare(&button_port(symbol), 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            goals,
            buttons,
            match_o: registry.declare("match_o", 1)?,
        })
    }

    /// The stand-in device on these ports.
    pub fn device(&self, reset: &Signal, fault: Option<Fault>) -> SequenceDevice {
        SequenceDevice::new(
            "konami",
            self.goals.goals(),
            fault,
            reset.clone(),
            SymbolInputs::Konami(self.buttons.clone()),
            self.match_o.clone(),
        )
    }

    fn release_all(&self) {
        for button in &self.buttons {
            button.drive(0);
        }
    }

    /// Runs the named scenario.
    pub async fn run(&self, name: &str, bench: &mut Bench) -> Result<(), SimError> {
        let sequence = SEQUENCES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| *s)
            .ok_or_else(|| super::unknown_scenario(name))?;
        let decoder = KonamiDecoder::new(self.buttons.clone())?;
        let model = SequenceModel::new(
            "konami",
            decoder,
            bench.reset_signal().clone(),
            self.goals.clone(),
        );
        let mut model = ModelHandle::new(model, bench.clock());
        model.start()?;
        bench.reset_holding_unknown(&self.buttons).await?;
        self.release_all();
        let monitor = spawn_monitor(bench.clock(), &self.match_o, &model, Expectation::from);
        tracing::debug!(sequence, "feeding buttons");
        let mut previous: Option<usize> = None;
        for symbol in sequence.chars() {
            let index = KONAMI_ALPHABET.find(symbol).ok_or_else(|| {
                SimError::invalid(format!("`{symbol}` is not a cheat-code button"))
            })?;
            if let Some(prev) = previous {
                self.buttons[prev].drive(0);
            }
            self.buttons[index].drive(1);
            previous = Some(index);
            bench.falling().await?;
        }
        self.release_all();
        bench.cycles(2).await?;
        monitor.finish().await?;
        Ok(())
    }
}
