//! Clock generation and reset sequencing.
//!
//! A [`ClockDomain`] owns one clock [`Signal`] and the task that toggles it.
//! It is the only source of time for the models and devices attached to it:
//! everything else suspends on its edges. The clock starts low; the first
//! rising edge comes half a period after [`ClockDomain::start`] and edges
//! strictly alternate from then on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::SimError;
use crate::signal::Signal;
use crate::time::SimTime;

struct ClockInner {
    signal: Signal,
    period: SimTime,
    edges: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// A free-running clock with a fixed period.
///
/// Cloning yields another handle to the same clock.
#[derive(Clone)]
pub struct ClockDomain {
    inner: Arc<ClockInner>,
}

impl ClockDomain {
    /// Creates a stopped clock driving `signal`.
    ///
    /// The period must be even and at least 2 ps so that both half periods
    /// are whole picoseconds.
    pub fn new(signal: Signal, period: SimTime) -> Result<Self, SimError> {
        if period.ps < 2 || period.ps % 2 != 0 {
            return Err(SimError::invalid(format!(
                "clock period {period} must be an even number of picoseconds, at least 2"
            )));
        }
        if signal.width() != 1 {
            return Err(SimError::WidthMismatch {
                signal: signal.name().to_string(),
                expected: 1,
                actual: signal.width(),
            });
        }
        Ok(Self {
            inner: Arc::new(ClockInner {
                signal,
                period,
                edges: Arc::new(AtomicU64::new(0)),
                task: Mutex::new(None),
            }),
        })
    }

    /// The clock signal.
    pub fn signal(&self) -> &Signal {
        &self.inner.signal
    }

    /// Full clock period.
    pub fn period(&self) -> SimTime {
        self.inner.period
    }

    /// Half of the clock period.
    pub fn half_period(&self) -> SimTime {
        SimTime::from_ps(self.inner.period.ps / 2)
    }

    /// Number of edges (rising and falling) generated since the first start.
    pub fn edge_count(&self) -> u64 {
        self.inner.edges.load(Ordering::Relaxed)
    }

    /// Returns `true` while the clock task is running.
    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drives the clock low and starts toggling it every half period.
    ///
    /// Must be called from within the scenario runtime.
    pub fn start(&self) -> Result<(), SimError> {
        let mut task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return Err(SimError::AlreadyStarted {
                what: format!("clock `{}`", self.inner.signal.name()),
            });
        }
        self.inner.signal.drive(0);
        let signal = self.inner.signal.clone();
        let edges = Arc::clone(&self.inner.edges);
        let half = self.half_period().to_runtime();
        let origin = Instant::now();
        *task = Some(tokio::spawn(async move {
            let mut deadline = origin;
            let mut level = false;
            loop {
                deadline += half;
                tokio::time::sleep_until(deadline).await;
                level = !level;
                signal.drive_bool(level);
                edges.fetch_add(1, Ordering::Relaxed);
            }
        }));
        tracing::debug!(
            clock = self.inner.signal.name(),
            period = %self.inner.period,
            "clock started"
        );
        Ok(())
    }

    /// Stops toggling; the clock holds its current level.
    pub fn stop(&self) -> Result<(), SimError> {
        let handle = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                handle.abort();
                tracing::debug!(clock = self.inner.signal.name(), "clock stopped");
                Ok(())
            }
            None => Err(SimError::NeverStarted {
                what: format!("clock `{}`", self.inner.signal.name()),
            }),
        }
    }

    /// Suspends until the next rising edge.
    pub async fn rising_edge(&self) -> Result<(), SimError> {
        self.inner.signal.rising_edge().await
    }

    /// Suspends until the next falling edge.
    pub async fn falling_edge(&self) -> Result<(), SimError> {
        self.inner.signal.falling_edge().await
    }

    /// Suspends until `n` rising edges have passed.
    pub async fn cycles(&self, n: u64) -> Result<(), SimError> {
        for _ in 0..n {
            self.rising_edge().await?;
        }
        Ok(())
    }
}

impl Drop for ClockInner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

/// Level that asserts a reset input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResetPolarity {
    /// Reset is asserted when the input is `1`.
    #[default]
    ActiveHigh,
    /// Reset is asserted when the input is `0`.
    ActiveLow,
}

/// A synchronous reset pulse of a fixed number of cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetSequence {
    /// Rising edges during which reset is held asserted.
    pub cycles: u32,
    /// Which level asserts reset.
    pub polarity: ResetPolarity,
}

impl ResetSequence {
    /// An active-high reset held for `cycles` rising edges.
    pub fn new(cycles: u32) -> Self {
        Self {
            cycles,
            polarity: ResetPolarity::ActiveHigh,
        }
    }

    /// Sets the polarity.
    pub fn with_polarity(mut self, polarity: ResetPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    fn asserted(&self) -> bool {
        self.polarity == ResetPolarity::ActiveHigh
    }

    /// Applies the pulse to `reset`.
    ///
    /// Waits for a rising edge, asserts reset on the following falling edge,
    /// holds it for exactly `cycles` rising edges and deasserts it on the
    /// next falling edge. Returns right after deassertion.
    pub async fn apply(&self, clock: &ClockDomain, reset: &Signal) -> Result<(), SimError> {
        self.apply_holding_unknown(clock, reset, &[]).await
    }

    /// Like [`apply`](Self::apply), but drives every signal in `inputs` to
    /// `X` together with asserting reset. They stay unknown after release
    /// until the caller drives them.
    pub async fn apply_holding_unknown(
        &self,
        clock: &ClockDomain,
        reset: &Signal,
        inputs: &[Signal],
    ) -> Result<(), SimError> {
        clock.rising_edge().await?;
        clock.falling_edge().await?;
        reset.drive_bool(self.asserted());
        for input in inputs {
            input.set_unknown();
        }
        tracing::debug!(reset = reset.name(), cycles = self.cycles, time = %reset.now(), "reset asserted");
        clock.cycles(u64::from(self.cycles)).await?;
        clock.falling_edge().await?;
        reset.drive_bool(!self.asserted());
        tracing::debug!(reset = reset.name(), time = %reset.now(), "reset released");
        Ok(())
    }
}
