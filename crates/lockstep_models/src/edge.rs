//! Single-cycle edge detector.
//!
//! The detector registers its pulses: a level change sampled at one rising
//! edge shows up on the outputs at the *next* rising edge and lasts exactly
//! one cycle. A pulse on the same cycle as the new level is a defect.

use lockstep_sim::{SimError, Signal};

use crate::model::Model;

/// The two pulse outputs of the detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgePulses {
    /// Asserted for one cycle after a 0 to 1 transition.
    pub rising: bool,
    /// Asserted for one cycle after a 1 to 0 transition.
    pub falling: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct EdgeState {
    prev: bool,
    pulses: EdgePulses,
}

/// Reference model of the edge detector.
pub struct EdgeModel {
    reset: Signal,
    level: Signal,
    state: EdgeState,
    next: EdgeState,
}

impl EdgeModel {
    /// Creates a model sampling `reset` and the monitored `level`.
    pub fn new(reset: Signal, level: Signal) -> Self {
        Self {
            reset,
            level,
            state: EdgeState::default(),
            next: EdgeState::default(),
        }
    }
}

impl Model for EdgeModel {
    type Output = EdgePulses;

    fn name(&self) -> &str {
        "detect_edge"
    }

    fn on_rising(&mut self) -> Result<(), SimError> {
        match self.reset.value() {
            None => {}
            Some(r) if r != 0 => self.next = EdgeState::default(),
            Some(_) => {
                let level = self.level.require_bool()?;
                let prev = self.state.prev;
                self.next = EdgeState {
                    prev: level,
                    pulses: EdgePulses {
                        rising: level && !prev,
                        falling: !level && prev,
                    },
                };
            }
        }
        Ok(())
    }

    fn on_falling(&mut self) {
        self.state = self.next;
    }

    fn output(&self) -> Result<EdgePulses, SimError> {
        Ok(self.state.pulses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_sim::{SignalRegistry, Timebase};

    fn model() -> (EdgeModel, Signal, Signal) {
        let mut reg = SignalRegistry::new(Timebase::start());
        let rst = reg.declare("reset_i", 1).unwrap();
        let lvl = reg.declare("button_i", 1).unwrap();
        (EdgeModel::new(rst.clone(), lvl.clone()), rst, lvl)
    }

    fn cycle(m: &mut EdgeModel) -> EdgePulses {
        m.on_rising().unwrap();
        m.on_falling();
        m.output().unwrap()
    }

    #[tokio::test]
    async fn one_pulse_per_transition() {
        let (mut m, rst, lvl) = model();
        rst.drive(1);
        lvl.drive(0);
        cycle(&mut m);
        rst.drive(0);
        assert_eq!(cycle(&mut m), EdgePulses::default());
        lvl.drive(1);
        let p = cycle(&mut m);
        assert!(p.rising && !p.falling);
        assert_eq!(cycle(&mut m), EdgePulses::default());
        lvl.drive(0);
        let p = cycle(&mut m);
        assert!(!p.rising && p.falling);
        assert_eq!(cycle(&mut m), EdgePulses::default());
    }

    #[tokio::test]
    async fn reset_clears_remembered_level() {
        let (mut m, rst, lvl) = model();
        rst.drive(0);
        lvl.drive(1);
        cycle(&mut m);
        cycle(&mut m);
        rst.drive(1);
        assert_eq!(cycle(&mut m), EdgePulses::default());
        rst.drive(0);
        // level is still high, but reset forgot it
        assert!(cycle(&mut m).rising);
    }

    #[tokio::test]
    async fn unknown_level_outside_reset_is_fault() {
        let (mut m, rst, _lvl) = model();
        rst.drive(0);
        assert!(matches!(
            m.on_rising(),
            Err(SimError::Unresolvable { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_reset_holds() {
        let (mut m, _rst, lvl) = model();
        lvl.drive(1);
        assert_eq!(cycle(&mut m), EdgePulses::default());
    }
}
