//! Comparing device outputs against model predictions.
//!
//! Everything here is stateless: a check reads a signal, compares it to an
//! [`Expectation`] and reports. Nothing mutates a model or a device.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lockstep_sim::{wait_for_value, ClockDomain, SimError, SimTime, Signal};
use tokio::task::JoinHandle;

use crate::model::{Expectation, Model, ModelHandle, ModelView};

/// Checks that `observed` is resolvable and satisfies `expected`.
///
/// Returns the observed value.
pub fn check(observed: &Signal, expected: impl Into<Expectation>) -> Result<u64, SimError> {
    let expected = expected.into();
    let actual = observed.require_u64()?;
    if expected.admits(actual) {
        Ok(actual)
    } else {
        Err(SimError::Mismatch {
            signal: observed.name().to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            time: observed.now(),
        })
    }
}

/// Checks `observed` against a model's current prediction, projected onto
/// this output by `select`.
pub fn check_model<M, E>(
    observed: &Signal,
    model: &ModelHandle<M>,
    select: impl FnOnce(M::Output) -> E,
) -> Result<u64, SimError>
where
    M: Model,
    E: Into<Expectation>,
{
    check(observed, select(model.current_output()?))
}

/// Asserts that `signal` does **not** reach `value` within `bound`.
///
/// The bounded wait timing out is the passing outcome; the signal must then
/// still be resolvable. Reaching the value early is a mismatch.
pub async fn expect_quiet_for(
    clock: &ClockDomain,
    signal: &Signal,
    value: u64,
    bound: SimTime,
) -> Result<(), SimError> {
    match wait_for_value(clock, signal, value, bound).await {
        Ok(time) => Err(SimError::Mismatch {
            signal: signal.name().to_string(),
            expected: format!("not {value} before {bound} (too early)"),
            actual: value.to_string(),
            time,
        }),
        Err(SimError::Timeout { .. }) => {
            signal.require_u64()?;
            Ok(())
        }
        Err(other) => Err(other),
    }
}

/// Asserts that `signal` reaches `value` within `bound`; a timeout is the
/// failing outcome.
pub async fn expect_within(
    clock: &ClockDomain,
    signal: &Signal,
    value: u64,
    bound: SimTime,
) -> Result<SimTime, SimError> {
    wait_for_value(clock, signal, value, bound).await
}

/// A running self-check comparing one output with a model on every rising
/// edge.
pub struct Monitor {
    signal: String,
    checks: Arc<AtomicU64>,
    task: Option<JoinHandle<Result<(), SimError>>>,
}

/// Spawns a monitor checking `observed` against `model` at every rising edge
/// of `clock` once the model is ready.
///
/// The monitor stops at the first failure; [`Monitor::finish`] reports it.
pub fn spawn_monitor<M, E, F>(
    clock: &ClockDomain,
    observed: &Signal,
    model: &ModelHandle<M>,
    select: F,
) -> Monitor
where
    M: Model,
    E: Into<Expectation> + Send + 'static,
    F: Fn(M::Output) -> E + Send + 'static,
{
    let checks = Arc::new(AtomicU64::new(0));
    let task = tokio::spawn(watch(
        clock.clone(),
        observed.clone(),
        model.view(),
        select,
        Arc::clone(&checks),
    ));
    Monitor {
        signal: observed.name().to_string(),
        checks,
        task: Some(task),
    }
}

async fn watch<M, E, F>(
    clock: ClockDomain,
    signal: Signal,
    view: ModelView<M>,
    select: F,
    checks: Arc<AtomicU64>,
) -> Result<(), SimError>
where
    M: Model,
    E: Into<Expectation>,
    F: Fn(M::Output) -> E,
{
    loop {
        clock.rising_edge().await?;
        let expected = match view.current_output() {
            Ok(out) => select(out),
            Err(SimError::ModelNotReady { .. }) => continue,
            Err(e) => return Err(e),
        };
        if let Err(e) = check(&signal, expected) {
            tracing::warn!(model = view.name(), error = %e, "monitor check failed");
            return Err(e);
        }
        checks.fetch_add(1, Ordering::Relaxed);
    }
}

impl Monitor {
    /// Number of passed checks so far.
    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    /// Returns `true` once the monitor has stopped on a failure.
    pub fn has_failed(&self) -> bool {
        self.task.as_ref().is_some_and(JoinHandle::is_finished)
    }

    /// Stops the monitor and returns the number of passed checks, or the
    /// first failure it saw.
    ///
    /// A check due at the edge the caller just woke on still runs first.
    pub async fn finish(mut self) -> Result<u64, SimError> {
        let Some(task) = self.task.take() else {
            return Ok(self.checks());
        };
        tokio::task::yield_now().await;
        if task.is_finished() {
            return match task.await {
                Ok(Ok(())) => Ok(self.checks()),
                Ok(Err(e)) => Err(e),
                Err(join) => Err(SimError::invalid(format!(
                    "monitor on `{}` panicked: {join}",
                    self.signal
                ))),
            };
        }
        task.abort();
        let checks = self.checks();
        tracing::debug!(signal = %self.signal, checks, "monitor finished");
        Ok(checks)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_sim::{SignalRegistry, Timebase};

    #[tokio::test(start_paused = true)]
    async fn check_reports_mismatch_with_time() {
        let mut reg = SignalRegistry::new(Timebase::start());
        let out = reg.declare("count_o", 7).unwrap();
        out.drive(3);
        assert_eq!(check(&out, 3u64).unwrap(), 3);
        tokio::time::sleep(SimTime::from_ns(2).to_runtime()).await;
        let err = check(&out, 4u64).unwrap_err();
        assert_eq!(
            err.to_string(),
            "incorrect result on `count_o`: expected 4, got 3 at 2 ns"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn check_requires_resolvable() {
        let mut reg = SignalRegistry::new(Timebase::start());
        let out = reg.declare("data_o", 2).unwrap();
        assert!(matches!(
            check(&out, Expectation::Any),
            Err(SimError::Unresolvable { .. })
        ));
        out.drive(1);
        assert_eq!(check(&out, Expectation::Any).unwrap(), 1);
    }
}
