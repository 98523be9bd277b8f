//! The runtime every scenario executes on.

use tokio::runtime::{Builder, Runtime};

use crate::error::SimError;

/// Builds a single-threaded runtime whose clock starts paused.
///
/// With the clock paused, time only moves when every task is idle waiting on
/// a timer, and it then jumps straight to the next deadline. All tasks woken
/// by one clock edge therefore run before the next edge, and a run is
/// reproducible regardless of host load.
pub fn scenario_runtime() -> Result<Runtime, SimError> {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .map_err(SimError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{SimTime, Timebase};

    #[test]
    fn virtual_time_jumps() {
        let rt = scenario_runtime().unwrap();
        let now = rt.block_on(async {
            let tb = Timebase::start();
            tokio::time::sleep(SimTime::from_ns(50_000).to_runtime()).await;
            tb.now()
        });
        assert_eq!(now, SimTime::from_ns(50_000));
    }
}
