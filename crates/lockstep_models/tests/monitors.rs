//! Models and comparators running against hand-driven outputs on a live
//! clock.

use lockstep_models::{
    check_model, expect_quiet_for, expect_within, spawn_monitor, CounterModel, CounterParams,
    DebounceModel, DebounceParams, Envelope, Expectation, ModelHandle,
};
use lockstep_sim::{delay, ClockDomain, ResetSequence, Signal, SignalRegistry, SimError, SimTime, Timebase};

struct Bench {
    clock: ClockDomain,
    reset: Signal,
    up: Signal,
    down: Signal,
    count: Signal,
}

fn bench() -> Bench {
    let mut reg = SignalRegistry::new(Timebase::start());
    let clk = reg.declare("clk_i", 1).unwrap();
    let reset = reg.declare("reset_i", 1).unwrap();
    let up = reg.declare("up_i", 1).unwrap();
    let down = reg.declare("down_i", 1).unwrap();
    let count = reg.declare("count_o", 7).unwrap();
    let clock = ClockDomain::new(clk, SimTime::from_ns(1)).unwrap();
    Bench {
        clock,
        reset,
        up,
        down,
        count,
    }
}

const PARAMS: CounterParams = CounterParams {
    width: 7,
    reset_value: 11,
    saturate: 67,
};

fn counter(b: &Bench) -> ModelHandle<CounterModel> {
    let model = CounterModel::new(PARAMS, b.reset.clone(), b.up.clone(), b.down.clone()).unwrap();
    ModelHandle::new(model, &b.clock)
}

#[tokio::test(start_paused = true)]
async fn counter_model_tracks_ups_after_reset() {
    let b = bench();
    b.up.set_unknown();
    b.down.set_unknown();
    b.clock.start().unwrap();
    let mut model = counter(&b);
    model.start().unwrap();
    ResetSequence::new(10).apply(&b.clock, &b.reset).await.unwrap();
    b.up.drive(1);
    b.down.drive(0);
    b.clock.rising_edge().await.unwrap();
    // committed value is still the reset value at the sampling edge
    assert_eq!(model.current_output().unwrap(), 11);
    b.clock.cycles(56).await.unwrap();
    assert_eq!(model.current_output().unwrap(), 67);
    b.clock.cycles(5).await.unwrap();
    assert_eq!(model.current_output().unwrap(), 67);
}

#[tokio::test(start_paused = true)]
async fn debounce_model_counts_the_held_press() {
    let b = bench();
    let button = b.up.clone();
    button.drive(0);
    b.clock.start().unwrap();
    let params = DebounceParams::new(4).unwrap();
    let model = DebounceModel::new(params, b.reset.clone(), button.clone());
    let mut model = ModelHandle::new(model, &b.clock);
    model.start().unwrap();
    ResetSequence::new(2).apply(&b.clock, &b.reset).await.unwrap();
    button.drive(1);
    for held in 0..5 {
        b.clock.rising_edge().await.unwrap();
        assert_eq!(model.inspect(|m| m.run_length()), held);
        let expected = if held < 4 { Envelope::Low } else { Envelope::High };
        assert_eq!(model.current_output().unwrap(), expected);
    }
    b.clock.falling_edge().await.unwrap();
    button.drive(0);
    b.clock.rising_edge().await.unwrap();
    assert_eq!(model.inspect(|m| m.run_length()), 5);
    b.clock.rising_edge().await.unwrap();
    // released, but past the minimum delay the output may still be held
    assert_eq!(model.inspect(|m| m.run_length()), 0);
    assert_eq!(model.current_output().unwrap(), Envelope::Any);
}

#[tokio::test(start_paused = true)]
async fn monitor_reports_first_mismatch() {
    let b = bench();
    b.up.drive(0);
    b.down.drive(0);
    b.reset.drive(1);
    b.clock.start().unwrap();
    let mut model = counter(&b);
    model.start().unwrap();
    b.clock.cycles(2).await.unwrap();
    b.clock.falling_edge().await.unwrap();
    b.reset.drive(0);
    b.count.drive(11);
    let monitor = spawn_monitor(&b.clock, &b.count, &model, Expectation::from);
    b.clock.cycles(4).await.unwrap();
    b.clock.falling_edge().await.unwrap();
    assert!(!monitor.has_failed());
    b.count.drive(12);
    b.clock.cycles(2).await.unwrap();
    let err = monitor.finish().await.unwrap_err();
    match err {
        SimError::Mismatch {
            signal,
            expected,
            actual,
            ..
        } => {
            assert_eq!(signal, "count_o");
            assert_eq!(expected, "11");
            assert_eq!(actual, "12");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn finish_right_after_an_edge_still_checks_it() {
    let b = bench();
    b.up.drive(0);
    b.down.drive(0);
    b.reset.drive(1);
    b.clock.start().unwrap();
    let mut model = counter(&b);
    model.start().unwrap();
    b.clock.cycles(2).await.unwrap();
    b.clock.falling_edge().await.unwrap();
    b.reset.drive(0);
    b.count.drive(11);
    let monitor = spawn_monitor(&b.clock, &b.count, &model, Expectation::from);
    b.clock.cycles(2).await.unwrap();
    b.clock.falling_edge().await.unwrap();
    b.count.drive(13);
    b.clock.rising_edge().await.unwrap();
    let err = monitor.finish().await.unwrap_err();
    assert!(matches!(err, SimError::Mismatch { ref actual, .. } if actual == "13"));
}

#[tokio::test(start_paused = true)]
async fn check_model_surfaces_not_ready() {
    let b = bench();
    b.clock.start().unwrap();
    let mut model = counter(&b);
    model.start().unwrap();
    b.count.drive(0);
    assert!(matches!(
        check_model(&b.count, &model, Expectation::from),
        Err(SimError::ModelNotReady { .. })
    ));
}

async fn raise_after(signal: Signal, after: SimTime) {
    delay(after).await;
    signal.drive(1);
}

#[tokio::test(start_paused = true)]
async fn quiet_wait_passes_on_timeout_and_fails_early() {
    let b = bench();
    b.clock.start().unwrap();
    b.count.drive(0);
    let late = tokio::spawn(raise_after(b.count.clone(), SimTime::from_ns(12)));
    expect_quiet_for(&b.clock, &b.count, 1, SimTime::from_ns(10))
        .await
        .unwrap();
    late.await.unwrap();

    b.count.drive(0);
    b.clock.falling_edge().await.unwrap();
    let early = tokio::spawn(raise_after(b.count.clone(), SimTime::from_ns(3)));
    let err = expect_quiet_for(&b.clock, &b.count, 1, SimTime::from_ns(10))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("too early"));
    early.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn within_wait_times_out_as_failure() {
    let b = bench();
    b.clock.start().unwrap();
    b.count.drive(0);
    let slow = tokio::spawn(raise_after(b.count.clone(), SimTime::from_ns(20)));
    let err = expect_within(&b.clock, &b.count, 1, SimTime::from_ns(17))
        .await
        .unwrap_err();
    assert!(matches!(err, SimError::Timeout { .. }));
    slow.abort();

    b.count.drive(0);
    b.clock.falling_edge().await.unwrap();
    let fast = tokio::spawn(raise_after(b.count.clone(), SimTime::from_ns(5)));
    expect_within(&b.clock, &b.count, 1, SimTime::from_ns(17))
        .await
        .unwrap();
    fast.await.unwrap();
}
