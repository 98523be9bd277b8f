//! Configuration types deserialized from `lockstep.toml`.

use std::fmt;
use std::path::PathBuf;

use lockstep_models::{
    CounterParams, DebounceParams, ShiftParams, COMPASS_GOALS, KONAMI_GOAL,
};
use lockstep_sim::SimTime;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// The top-level suite configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// How scenarios are run.
    pub run: RunConfig,
    /// Saturating counter parameter sets.
    pub counter: Vec<CounterConfig>,
    /// Debouncer parameter sets.
    pub debounce: DebounceConfig,
    /// Shift register parameter sets.
    pub shift: Vec<ShiftConfig>,
    /// Edge detector selection.
    pub edge: EdgeConfig,
    /// Compass sequence detector goals.
    pub compass: CompassConfig,
    /// Cheat-code detector goals.
    pub konami: KonamiConfig,
}

impl Default for SuiteConfig {
    /// The stock parametrizations of every circuit.
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            counter: CounterConfig::stock(),
            debounce: DebounceConfig::default(),
            shift: ShiftConfig::stock(),
            edge: EdgeConfig::default(),
            compass: CompassConfig::default(),
            konami: KonamiConfig::default(),
        }
    }
}

/// Scenario isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// A fresh runtime, clock and device per scenario.
    #[default]
    Each,
    /// One runtime, clock and device for all scenarios of a parameter set,
    /// with a reset between scenarios.
    Shared,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Each => write!(f, "each"),
            RunMode::Shared => write!(f, "shared"),
        }
    }
}

/// Global run settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Base seed; each scenario draws from its own stream of it.
    pub seed: u64,
    /// Scenario isolation mode.
    pub mode: RunMode,
    /// Clock period (e.g. `"1ns"`).
    #[serde(deserialize_with = "deserialize_time")]
    pub clock_period: SimTime,
    /// Clock-to-output delay of the device stand-ins.
    #[serde(deserialize_with = "deserialize_time")]
    pub clk_to_q: SimTime,
    /// Length of the reset pulse in clock cycles.
    pub reset_cycles: u32,
    /// Simulated time after which a scenario is abandoned.
    #[serde(deserialize_with = "deserialize_time")]
    pub time_limit: SimTime,
    /// Directory for per-scenario VCD traces, if any.
    pub trace_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            mode: RunMode::Each,
            clock_period: SimTime::from_ns(1),
            clk_to_q: SimTime::from_ps(1),
            reset_cycles: 10,
            time_limit: SimTime::from_ns(50_000),
            trace_dir: None,
        }
    }
}

/// One saturating counter parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterConfig {
    /// Output width in bits.
    pub width: u32,
    /// Value loaded by reset.
    pub reset_value: u64,
    /// Saturation ceiling.
    pub saturate: u64,
}

impl CounterConfig {
    /// `(2,1,3) (7,11,67) (5,30,31) (4,0,11)`.
    pub fn stock() -> Vec<Self> {
        [(2, 1, 3), (7, 11, 67), (5, 30, 31), (4, 0, 11)]
            .into_iter()
            .map(|(width, reset_value, saturate)| Self {
                width,
                reset_value,
                saturate,
            })
            .collect()
    }

    /// Model parameters for this set.
    pub fn params(&self) -> CounterParams {
        CounterParams {
            width: self.width,
            reset_value: self.reset_value,
            saturate: self.saturate,
        }
    }
}

/// Debouncer parameter sets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebounceConfig {
    /// Whether the debouncer is verified at all.
    pub enabled: bool,
    /// Minimum delays, in clock cycles, one parameter set each.
    pub min_delays: Vec<u64>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delays: vec![10, 500, 1000],
        }
    }
}

impl DebounceConfig {
    /// Model parameters for each set; fails on a zero delay.
    pub fn params(&self) -> Result<Vec<DebounceParams>, lockstep_sim::SimError> {
        self.min_delays
            .iter()
            .map(|&d| DebounceParams::new(d))
            .collect()
    }
}

/// One shift register parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftConfig {
    /// Register width in bits.
    pub width: u32,
    /// Reset value; bits above the width are dropped.
    pub reset_value: u64,
}

impl ShiftConfig {
    /// `(2,1) (2,0) (5,63)`.
    pub fn stock() -> Vec<Self> {
        [(2, 1), (2, 0), (5, 63)]
            .into_iter()
            .map(|(width, reset_value)| Self { width, reset_value })
            .collect()
    }

    /// Model parameters for this set.
    pub fn params(&self) -> ShiftParams {
        ShiftParams {
            width: self.width,
            reset_value: self.reset_value,
        }
    }
}

/// Edge detector selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeConfig {
    /// Whether the edge detector is verified.
    pub enabled: bool,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Compass detector goals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompassConfig {
    /// Whether the compass detector is verified.
    pub enabled: bool,
    /// Goal strings over `N`, `E`, `W`, `S`.
    pub goals: Vec<String>,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            goals: COMPASS_GOALS.iter().map(|g| g.to_string()).collect(),
        }
    }
}

/// Cheat-code detector goals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KonamiConfig {
    /// Whether the cheat-code detector is verified.
    pub enabled: bool,
    /// Goal strings over `UuRrDdLlAaBbSs`.
    pub goals: Vec<String>,
}

impl Default for KonamiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            goals: vec![KONAMI_GOAL.to_string()],
        }
    }
}

/// Deserializes a time given either as a string with a unit (`"1ns"`) or as
/// an integer number of picoseconds.
fn deserialize_time<'de, D>(deserializer: D) -> Result<SimTime, D::Error>
where
    D: Deserializer<'de>,
{
    struct TimeVisitor;

    impl Visitor<'_> for TimeVisitor {
        type Value = SimTime;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a time like \"1ns\" or an integer number of picoseconds")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.parse().map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v)
                .map(SimTime::from_ps)
                .map_err(|_| E::custom(format!("negative time {v}")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(SimTime::from_ps(v))
        }
    }

    deserializer.deserialize_any(TimeVisitor)
}
