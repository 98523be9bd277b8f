use lockstep_models::{COMPASS_ALPHABET, KONAMI_ALPHABET};
use lockstep_sim::Signal;

use super::{drive_or_unknown, sample_bit, Device, Fault};

/// Input ports of a sequence detector.
pub enum SymbolInputs {
    /// A `valid` strobe with a 2-bit direction bus.
    Compass {
        /// Strobe marking a valid direction.
        valid: Signal,
        /// Direction code, N=0 E=1 W=2 S=3.
        direction: Signal,
    },
    /// One input per button symbol, in cheat-code alphabet order.
    Konami(Vec<Signal>),
}

impl SymbolInputs {
    /// The symbol presented this cycle: `Some(None)` for an idle cycle,
    /// `None` when unknown inputs make it undecidable.
    fn symbol(&self) -> Option<Option<char>> {
        match self {
            SymbolInputs::Compass { valid, direction } => match sample_bit(valid) {
                Some(true) => direction
                    .value()
                    .map(|code| COMPASS_ALPHABET.chars().nth(code as usize)),
                _ => Some(None),
            },
            SymbolInputs::Konami(buttons) => {
                let levels: Option<Vec<bool>> = buttons.iter().map(sample_bit).collect();
                let Some(levels) = levels else {
                    return Some(None);
                };
                let mut pressed = levels
                    .iter()
                    .zip(KONAMI_ALPHABET.chars())
                    .filter(|(level, _)| **level)
                    .map(|(_, symbol)| symbol);
                match (pressed.next(), pressed.next()) {
                    (Some(symbol), None) => Some(Some(symbol)),
                    _ => Some(None),
                }
            }
        }
    }
}

/// Mealy sequence detector over a sliding window of past symbols.
pub struct SequenceDevice {
    name: &'static str,
    latches: bool,
    goals: Vec<String>,
    depth: usize,
    reset: Signal,
    inputs: SymbolInputs,
    match_o: Signal,
    window: Option<String>,
    latched: bool,
}

impl SequenceDevice {
    /// Creates the device. [`Fault::DetectorLatches`] keeps the output
    /// asserted from the first match until reset.
    pub fn new(
        name: &'static str,
        goals: &[String],
        fault: Option<Fault>,
        reset: Signal,
        inputs: SymbolInputs,
        match_o: Signal,
    ) -> Self {
        let depth = goals
            .iter()
            .map(|g| g.chars().count())
            .max()
            .unwrap_or(1)
            .saturating_sub(1);
        Self {
            name,
            latches: fault == Some(Fault::DetectorLatches),
            goals: goals.to_vec(),
            depth,
            reset,
            inputs,
            match_o,
            window: None,
            latched: false,
        }
    }

    fn matched(&self, window: &str, symbol: char) -> bool {
        let mut seen = window.to_string();
        seen.push(symbol);
        self.goals.iter().any(|goal| seen.ends_with(goal.as_str()))
    }

    fn output(&self) -> Option<bool> {
        match sample_bit(&self.reset)? {
            true => Some(false),
            false => {
                let window = self.window.as_deref()?;
                let hit = match self.inputs.symbol()? {
                    Some(symbol) => self.matched(window, symbol),
                    None => false,
                };
                Some(hit || self.latched)
            }
        }
    }
}

impl Device for SequenceDevice {
    fn name(&self) -> &str {
        self.name
    }

    fn clock(&mut self) {
        match sample_bit(&self.reset) {
            None => {}
            Some(true) => {
                self.window = Some(String::new());
                self.latched = false;
            }
            Some(false) => {
                if self.latches && self.output() == Some(true) {
                    self.latched = true;
                }
                self.window = match (self.window.take(), self.inputs.symbol()) {
                    (Some(mut window), Some(Some(symbol))) => {
                        window.push(symbol);
                        let excess = window.chars().count().saturating_sub(self.depth);
                        Some(window.chars().skip(excess).collect())
                    }
                    (Some(window), Some(None)) => Some(window),
                    _ => None,
                };
            }
        }
    }

    fn drive_outputs(&self) {
        drive_or_unknown(&self.match_o, self.output().map(u64::from));
    }

    fn is_mealy(&self) -> bool {
        true
    }
}
