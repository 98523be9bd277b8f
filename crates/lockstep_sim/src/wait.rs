//! Bounded waits on simulated time.
//!
//! Every wait that could hang on a broken device is wrapped in
//! `tokio::time::timeout`; when the bound expires the inner future is dropped,
//! so nothing stays scheduled, and [`SimError::Timeout`] is returned.
//! Conditions are polled at rising clock edges, which keeps them off the
//! instants where bounds measured from a falling edge expire.

use crate::clock::ClockDomain;
use crate::error::SimError;
use crate::signal::Signal;
use crate::time::SimTime;

/// Suspends for `span` of simulated time.
pub async fn delay(span: SimTime) {
    tokio::time::sleep(span.to_runtime()).await;
}

/// Waits until `ready` holds at a rising edge of `clock`, for at most `bound`.
///
/// Returns the simulated time at which the condition was observed.
pub async fn wait_until<F>(
    clock: &ClockDomain,
    bound: SimTime,
    what: impl Into<String>,
    mut ready: F,
) -> Result<SimTime, SimError>
where
    F: FnMut() -> bool,
{
    let signal = clock.signal();
    match tokio::time::timeout(bound.to_runtime(), poll_edges(clock, &mut ready)).await {
        Ok(result) => result,
        Err(_) => {
            let what = what.into();
            tracing::debug!(%what, %bound, "bounded wait expired");
            Err(SimError::Timeout {
                what,
                after: bound,
                time: signal.now(),
            })
        }
    }
}

async fn poll_edges<F>(clock: &ClockDomain, ready: &mut F) -> Result<SimTime, SimError>
where
    F: FnMut() -> bool,
{
    loop {
        clock.rising_edge().await?;
        if ready() {
            return Ok(clock.signal().now());
        }
    }
}

/// Waits until `signal` reads the resolved value `expected` at a rising edge
/// of `clock`, for at most `bound`.
pub async fn wait_for_value(
    clock: &ClockDomain,
    signal: &Signal,
    expected: u64,
    bound: SimTime,
) -> Result<SimTime, SimError> {
    wait_until(
        clock,
        bound,
        format!("{} == {expected}", signal.name()),
        || signal.value() == Some(expected),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalRegistry;
    use crate::time::Timebase;

    async fn setup() -> (SignalRegistry, ClockDomain, Signal) {
        let mut reg = SignalRegistry::new(Timebase::start());
        let clk = reg.declare("clk_i", 1).unwrap();
        let out = reg.declare("button_o", 1).unwrap();
        let clock = ClockDomain::new(clk, SimTime::from_ns(1)).unwrap();
        clock.start().unwrap();
        (reg, clock, out)
    }

    #[tokio::test(start_paused = true)]
    async fn value_seen_before_bound() {
        let (reg, clock, out) = setup().await;
        out.drive(0);
        let driver = {
            let out = out.clone();
            tokio::spawn(async move {
                delay(SimTime::from_ps(3_200)).await;
                out.drive(1);
            })
        };
        let seen = wait_for_value(&clock, &out, 1, SimTime::from_ns(10))
            .await
            .unwrap();
        assert_eq!(seen, SimTime::from_ps(3_500));
        assert_eq!(reg.timebase().now(), seen);
        driver.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_distinct_error() {
        let (reg, clock, out) = setup().await;
        out.drive(0);
        let err = wait_for_value(&clock, &out, 1, SimTime::from_ns(4))
            .await
            .unwrap_err();
        match err {
            SimError::Timeout { what, after, time } => {
                assert_eq!(what, "button_o == 1");
                assert_eq!(after, SimTime::from_ns(4));
                assert_eq!(time, SimTime::from_ns(4));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(reg.timebase().now(), SimTime::from_ns(4));
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_value_never_matches() {
        let (_reg, clock, out) = setup().await;
        out.set_unknown();
        assert!(wait_for_value(&clock, &out, 0, SimTime::from_ns(3))
            .await
            .is_err());
    }
}
