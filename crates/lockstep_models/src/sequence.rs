//! Mealy sequence detectors.
//!
//! A sequence detector keeps an append-only history of decoded input
//! symbols. Its output is combinational: it is asserted exactly when the
//! current cycle carries a valid symbol and the history extended by that
//! symbol ends with one of the goals. The symbol is appended to the history
//! at the rising edge and committed on the falling edge like any other model
//! state.
//!
//! Decoding the raw inputs into symbols is the only thing that differs
//! between detectors, and is abstracted by [`SymbolDecoder`].

use lockstep_sim::{SimError, Signal};

use crate::model::Model;

/// Turns the live input signals of a detector into a symbol.
pub trait SymbolDecoder: Send + 'static {
    /// Every symbol the decoder can produce.
    fn alphabet(&self) -> &'static str;

    /// Decodes the current inputs. `Ok(None)` means no valid symbol this
    /// cycle.
    fn decode(&self) -> Result<Option<char>, SimError>;
}

/// Ordered set of target symbol strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalSet {
    goals: Vec<String>,
}

impl GoalSet {
    /// Builds a goal set over `alphabet`. The set and each goal must be
    /// non-empty, and goals may only use symbols from the alphabet.
    pub fn new<I, S>(goals: I, alphabet: &str) -> Result<Self, SimError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let goals: Vec<String> = goals.into_iter().map(Into::into).collect();
        if goals.is_empty() {
            return Err(SimError::invalid("goal set is empty"));
        }
        for goal in &goals {
            if goal.is_empty() {
                return Err(SimError::invalid("empty goal"));
            }
            if let Some(c) = goal.chars().find(|c| !alphabet.contains(*c)) {
                return Err(SimError::invalid(format!(
                    "goal `{goal}` uses `{c}`, not in alphabet `{alphabet}`"
                )));
            }
        }
        Ok(Self { goals })
    }

    /// The goals in order.
    pub fn goals(&self) -> &[String] {
        &self.goals
    }

    /// Returns `true` if `history` followed by `symbol` ends with a goal.
    pub fn matches(&self, history: &str, symbol: char) -> bool {
        self.goals.iter().any(|goal| {
            goal.strip_suffix(symbol)
                .is_some_and(|head| history.ends_with(head))
        })
    }
}

/// Compass directions encoded on a 2-bit bus.
pub const COMPASS_ALPHABET: &str = "NEWS";

/// Goals of the compass detector.
pub const COMPASS_GOALS: [&str; 5] = ["NSN", "NSE", "EW", "WSN", "WSE"];

/// Bus encoding of a compass direction: N=0, E=1, W=2, S=3.
pub fn compass_code(symbol: char) -> Option<u64> {
    COMPASS_ALPHABET
        .chars()
        .position(|c| c == symbol)
        .map(|i| i as u64)
}

/// Decodes a `valid` strobe and a 2-bit `direction` bus.
pub struct CompassDecoder {
    valid: Signal,
    direction: Signal,
}

impl CompassDecoder {
    /// Creates a decoder over the given inputs.
    pub fn new(valid: Signal, direction: Signal) -> Self {
        Self { valid, direction }
    }
}

impl SymbolDecoder for CompassDecoder {
    fn alphabet(&self) -> &'static str {
        COMPASS_ALPHABET
    }

    fn decode(&self) -> Result<Option<char>, SimError> {
        // An unresolved strobe is not a valid cycle.
        if !matches!(self.valid.value(), Some(v) if v != 0) {
            return Ok(None);
        }
        let code = self.direction.require_u64()?;
        Ok(COMPASS_ALPHABET.chars().nth(code as usize))
    }
}

/// Button symbols of the cheat-code detector: upper case is a press, lower
/// case a release.
pub const KONAMI_ALPHABET: &str = "UuRrDdLlAaBbSs";

/// Goal of the cheat-code detector.
pub const KONAMI_GOAL: &str = "UuUuDdDdLlRrLlRrBbAaSs";

/// Decodes fourteen one-hot button inputs, in [`KONAMI_ALPHABET`] order.
pub struct KonamiDecoder {
    buttons: Vec<Signal>,
}

impl KonamiDecoder {
    /// Creates a decoder; `buttons` must have one signal per alphabet symbol.
    pub fn new(buttons: Vec<Signal>) -> Result<Self, SimError> {
        if buttons.len() != KONAMI_ALPHABET.len() {
            return Err(SimError::invalid(format!(
                "cheat-code decoder needs {} buttons, got {}",
                KONAMI_ALPHABET.len(),
                buttons.len()
            )));
        }
        Ok(Self { buttons })
    }
}

impl SymbolDecoder for KonamiDecoder {
    fn alphabet(&self) -> &'static str {
        KONAMI_ALPHABET
    }

    /// A cycle is valid when exactly one button reads `1` and every other
    /// button reads `0`.
    fn decode(&self) -> Result<Option<char>, SimError> {
        let mut pressed = None;
        for (button, symbol) in self.buttons.iter().zip(KONAMI_ALPHABET.chars()) {
            match button.value() {
                None => return Ok(None),
                Some(0) => {}
                Some(_) if pressed.is_some() => return Ok(None),
                Some(_) => pressed = Some(symbol),
            }
        }
        Ok(pressed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Hold,
    Clear,
    Append(char),
}

/// Reference model of a Mealy sequence detector.
pub struct SequenceModel<D> {
    name: &'static str,
    decoder: D,
    reset: Signal,
    goals: GoalSet,
    history: String,
    pending: Pending,
}

impl<D: SymbolDecoder> SequenceModel<D> {
    /// Creates a model named `name` (for diagnostics).
    pub fn new(name: &'static str, decoder: D, reset: Signal, goals: GoalSet) -> Self {
        Self {
            name,
            decoder,
            reset,
            goals,
            history: String::new(),
            pending: Pending::Hold,
        }
    }

    /// The committed history.
    pub fn history(&self) -> &str {
        &self.history
    }

    /// The goals.
    pub fn goals(&self) -> &GoalSet {
        &self.goals
    }
}

impl<D: SymbolDecoder> Model for SequenceModel<D> {
    type Output = bool;

    fn name(&self) -> &str {
        self.name
    }

    fn on_rising(&mut self) -> Result<(), SimError> {
        self.pending = match self.reset.value() {
            None => Pending::Hold,
            Some(r) if r != 0 => Pending::Clear,
            Some(_) => match self.decoder.decode()? {
                Some(symbol) => Pending::Append(symbol),
                None => Pending::Hold,
            },
        };
        Ok(())
    }

    fn on_falling(&mut self) {
        match std::mem::replace(&mut self.pending, Pending::Hold) {
            Pending::Hold => {}
            Pending::Clear => self.history.clear(),
            Pending::Append(symbol) => self.history.push(symbol),
        }
    }

    fn output(&self) -> Result<bool, SimError> {
        if self.reset.value() != Some(0) {
            return Ok(false);
        }
        Ok(match self.decoder.decode()? {
            Some(symbol) => self.goals.matches(&self.history, symbol),
            None => false,
        })
    }
}
