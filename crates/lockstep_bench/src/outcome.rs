//! Pass/fail results of scenario runs.

use lockstep_sim::{FailureKind, SimError, SimTime};
use serde::{Deserialize, Serialize};

use crate::catalog::Circuit;

/// Why a scenario failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable diagnostic with expected value, actual value and
    /// simulated time.
    pub message: String,
}

impl From<&SimError> for FailureReport {
    fn from(e: &SimError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// The result of one scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Circuit under verification.
    pub circuit: Circuit,
    /// Parameter set label.
    pub target: String,
    /// Scenario name.
    pub scenario: String,
    /// Catalog index, which also selects the random stream.
    pub index: u64,
    /// Simulated time at which the scenario ended.
    pub sim_time: SimTime,
    /// `None` when the scenario passed.
    pub failure: Option<FailureReport>,
}

impl ScenarioOutcome {
    /// Returns `true` if the scenario passed.
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    /// `<target>/<scenario>`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.target, self.scenario)
    }
}

/// Outcomes of a whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Base seed of the run.
    pub seed: u64,
    /// Every outcome, in run order.
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    /// Number of passed scenarios.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of failed scenarios.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Returns `true` if every scenario passed.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// The failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(failure: Option<FailureReport>) -> ScenarioOutcome {
        ScenarioOutcome {
            circuit: Circuit::Counter,
            target: "counter(w=2,r=1,s=3)".to_string(),
            scenario: "fuzz".to_string(),
            index: 5,
            sim_time: SimTime::from_ns(1_020),
            failure,
        }
    }

    #[test]
    fn report_counts() {
        let err = SimError::Mismatch {
            signal: "count_o".to_string(),
            expected: "3".to_string(),
            actual: "0".to_string(),
            time: SimTime::from_ps(7_500),
        };
        let report = RunReport {
            seed: 42,
            outcomes: vec![outcome(None), outcome(Some(FailureReport::from(&err)))],
        };
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_passed());
        let failed = report.failures().next().unwrap();
        assert_eq!(failed.full_name(), "counter(w=2,r=1,s=3)/fuzz");
        assert_eq!(
            failed.failure.as_ref().unwrap().message,
            "incorrect result on `count_o`: expected 3, got 0 at 7500 ps"
        );
    }

    #[test]
    fn json_shape() {
        let report = RunReport {
            seed: 42,
            outcomes: vec![outcome(Some(FailureReport {
                kind: FailureKind::Timeout,
                message: "timed out".to_string(),
            }))],
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["outcomes"][0]["circuit"], "counter");
        assert_eq!(json["outcomes"][0]["failure"]["kind"], "timeout");
        assert_eq!(json["outcomes"][0]["sim_time"]["ps"], 1_020_000);
        let back: RunReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
