//! Per-scenario context handed to every scenario body.

use lockstep_sim::{ClockDomain, ResetSequence, SimError, SimTime, Signal};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random stream of one scenario: stream `index` of `seed`.
pub fn scenario_rng(seed: u64, index: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index);
    rng
}

/// The clock, reset and randomness a scenario drives the device with.
pub struct Bench {
    clock: ClockDomain,
    reset: Signal,
    reset_cycles: u32,
    rng: ChaCha8Rng,
}

impl Bench {
    /// Creates a context around a running clock.
    pub fn new(clock: ClockDomain, reset: Signal, reset_cycles: u32, rng: ChaCha8Rng) -> Self {
        Self {
            clock,
            reset,
            reset_cycles,
            rng,
        }
    }

    /// The scenario clock.
    pub fn clock(&self) -> &ClockDomain {
        &self.clock
    }

    /// The active-high synchronous reset input.
    pub fn reset_signal(&self) -> &Signal {
        &self.reset
    }

    /// Replaces the random stream, for the next scenario on a shared bench.
    pub fn reseed(&mut self, rng: ChaCha8Rng) {
        self.rng = rng;
    }

    /// Simulated time now.
    pub fn now(&self) -> SimTime {
        self.reset.now()
    }

    /// Span of `n` clock periods. Fails if the span does not fit in
    /// simulated time.
    pub fn cycles_span(&self, n: u64) -> Result<SimTime, SimError> {
        let period = self.clock.period();
        period.checked_mul(n).ok_or_else(|| {
            SimError::invalid(format!("{n} cycles of {period} overflow simulated time"))
        })
    }

    /// Applies the reset pulse. Returns at the falling edge that releases
    /// it, which is where the scenario may drive its first inputs.
    pub async fn reset(&self) -> Result<(), SimError> {
        ResetSequence::new(self.reset_cycles)
            .apply(&self.clock, &self.reset)
            .await
    }

    /// Applies the reset pulse with `inputs` driven to `X` while it is
    /// asserted, as undriven ports look at power-up. Returns at the
    /// releasing falling edge with `inputs` still unknown.
    pub async fn reset_holding_unknown(&self, inputs: &[Signal]) -> Result<(), SimError> {
        ResetSequence::new(self.reset_cycles)
            .apply_holding_unknown(&self.clock, &self.reset, inputs)
            .await
    }

    /// Waits for the next rising edge (a sampling point).
    pub async fn rising(&self) -> Result<(), SimError> {
        self.clock.rising_edge().await
    }

    /// Waits for the next falling edge (a driving point).
    pub async fn falling(&self) -> Result<(), SimError> {
        self.clock.falling_edge().await
    }

    /// Waits for the next falling edge `n` times.
    pub async fn cycles(&self, n: u64) -> Result<(), SimError> {
        for _ in 0..n {
            self.falling().await?;
        }
        Ok(())
    }

    /// Uniform integer in `0..=max`.
    pub fn upto(&mut self, max: u64) -> u64 {
        self.rng.gen_range(0..=max)
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.rng.gen()
    }
}
