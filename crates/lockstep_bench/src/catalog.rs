//! The scenario catalog: which parameter sets exist and which scenarios run
//! against each.

use std::fmt;
use std::str::FromStr;

use lockstep_config::SuiteConfig;
use lockstep_models::{
    CounterParams, DebounceParams, GoalSet, ShiftParams, COMPASS_ALPHABET, KONAMI_ALPHABET,
};
use lockstep_sim::SimError;
use serde::{Deserialize, Serialize};

use crate::scenarios;

/// The circuits the engine can verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Circuit {
    /// Saturating up/down counter.
    Counter,
    /// Input debouncer.
    Debounce,
    /// Edge detector.
    Edge,
    /// Shift register.
    Shift,
    /// Compass-direction sequence detector.
    Compass,
    /// Cheat-code sequence detector.
    Konami,
}

impl Circuit {
    /// Every circuit, in catalog order.
    pub const ALL: [Circuit; 6] = [
        Circuit::Counter,
        Circuit::Debounce,
        Circuit::Edge,
        Circuit::Shift,
        Circuit::Compass,
        Circuit::Konami,
    ];

    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Circuit::Counter => "counter",
            Circuit::Debounce => "debounce",
            Circuit::Edge => "edge",
            Circuit::Shift => "shift",
            Circuit::Compass => "compass",
            Circuit::Konami => "konami",
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Circuit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Circuit::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown circuit `{s}`"))
    }
}

/// One parameter set of one circuit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A counter parametrization.
    Counter(CounterParams),
    /// A debouncer parametrization.
    Debounce(DebounceParams),
    /// The edge detector (no parameters).
    Edge,
    /// A shift register parametrization.
    Shift(ShiftParams),
    /// The compass detector with its goals.
    Compass(GoalSet),
    /// The cheat-code detector with its goals.
    Konami(GoalSet),
}

impl Target {
    /// The circuit this parameter set belongs to.
    pub fn circuit(&self) -> Circuit {
        match self {
            Target::Counter(_) => Circuit::Counter,
            Target::Debounce(_) => Circuit::Debounce,
            Target::Edge => Circuit::Edge,
            Target::Shift(_) => Circuit::Shift,
            Target::Compass(_) => Circuit::Compass,
            Target::Konami(_) => Circuit::Konami,
        }
    }

    /// Short label such as `counter(w=7,r=11,s=67)`.
    pub fn label(&self) -> String {
        match self {
            Target::Counter(p) => format!(
                "counter(w={},r={},s={})",
                p.width, p.reset_value, p.saturate
            ),
            Target::Debounce(p) => format!("debounce(min={})", p.min_delay),
            Target::Edge => "edge".to_string(),
            Target::Shift(p) => format!("shift(w={},r={})", p.width, p.reset_value),
            Target::Compass(g) => format!("compass(goals={})", g.goals().len()),
            Target::Konami(g) => format!("konami(goals={})", g.goals().len()),
        }
    }

    /// Names of the scenarios run against this parameter set.
    pub fn scenario_names(&self) -> &'static [&'static str] {
        match self.circuit() {
            Circuit::Counter => scenarios::counter::SCENARIOS,
            Circuit::Debounce => scenarios::debounce::SCENARIOS,
            Circuit::Edge => scenarios::edge::SCENARIOS,
            Circuit::Shift => scenarios::shift::SCENARIOS,
            Circuit::Compass => scenarios::compass::SCENARIOS,
            Circuit::Konami => scenarios::konami::SCENARIOS,
        }
    }
}

/// One scenario of the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioEntry {
    /// Position in the full catalog; selects the scenario's random stream.
    pub index: u64,
    /// Scenario name within its circuit.
    pub name: &'static str,
    /// Qualified name, `<target label>/<scenario>`.
    pub full_name: String,
}

/// A parameter set with its scenarios.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetEntry {
    /// The parameter set.
    pub target: Target,
    /// Its scenarios in run order.
    pub scenarios: Vec<ScenarioEntry>,
}

/// Every scenario a suite file enables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<TargetEntry>,
}

impl Catalog {
    /// Builds the catalog from a validated suite configuration.
    pub fn from_config(config: &SuiteConfig) -> Result<Self, SimError> {
        let mut targets = Vec::new();
        for counter in &config.counter {
            let params = counter.params();
            params.validate()?;
            targets.push(Target::Counter(params));
        }
        if config.debounce.enabled {
            targets.extend(config.debounce.params()?.into_iter().map(Target::Debounce));
        }
        if config.edge.enabled {
            targets.push(Target::Edge);
        }
        for shift in &config.shift {
            let params = shift.params();
            params.validate()?;
            targets.push(Target::Shift(params));
        }
        if config.compass.enabled {
            targets.push(Target::Compass(GoalSet::new(
                &config.compass.goals,
                COMPASS_ALPHABET,
            )?));
        }
        if config.konami.enabled {
            targets.push(Target::Konami(GoalSet::new(
                &config.konami.goals,
                KONAMI_ALPHABET,
            )?));
        }
        Ok(Self::from_targets(targets))
    }

    /// Builds the catalog of the given parameter sets, with every scenario
    /// of each.
    pub fn from_targets(targets: Vec<Target>) -> Self {
        let mut index = 0;
        let entries = targets
            .into_iter()
            .map(|target| {
                let label = target.label();
                let scenarios = target
                    .scenario_names()
                    .iter()
                    .map(|&name| {
                        let entry = ScenarioEntry {
                            index,
                            name,
                            full_name: format!("{label}/{name}"),
                        };
                        index += 1;
                        entry
                    })
                    .collect();
                TargetEntry { target, scenarios }
            })
            .collect();
        Self { entries }
    }

    /// The parameter sets in order.
    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    /// Total number of scenarios.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.scenarios.len()).sum()
    }

    /// Returns `true` if nothing is enabled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps only the scenarios `selection` admits; parameter sets left
    /// without scenarios are dropped. Indices are preserved.
    pub fn select(&self, selection: &Selection) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|e| selection.circuit.map_or(true, |c| c == e.target.circuit()))
            .map(|e| TargetEntry {
                target: e.target.clone(),
                scenarios: e
                    .scenarios
                    .iter()
                    .filter(|s| selection.admits(&s.full_name))
                    .cloned()
                    .collect(),
            })
            .filter(|e| !e.scenarios.is_empty())
            .collect();
        Self { entries }
    }
}

/// Which scenarios of a catalog to run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Only this circuit.
    pub circuit: Option<Circuit>,
    /// Only qualified names containing this substring.
    pub filter: Option<String>,
}

impl Selection {
    fn admits(&self, full_name: &str) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |f| full_name.contains(f))
    }
}
