//! Named signals of the device under verification and the registry that
//! declares them.
//!
//! A [`Signal`] is a cloneable handle around a Tokio `watch` channel holding
//! the current [`LogicVec`]. Writers replace the value; readers either sample
//! it or suspend until it changes. Waiters are only notified when the value
//! actually changes, so an edge wait never fires on a rewrite of the same
//! level.
//!
//! The [`SignalRegistry`] is the explicit, statically declared mapping from
//! port names to handles, built once per scenario.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use lockstep_common::{Logic, LogicVec, MAX_WIDTH};
use tokio::sync::watch;

use crate::error::SimError;
use crate::time::{SimTime, Timebase};
use crate::waveform::TraceRecorder;

/// Index of a signal within its registry, in declaration order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SignalId(u32);

impl SignalId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Direction of a clock-like transition on bit 0 of a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Transition to `1` from anything else.
    Rising,
    /// Transition to `0` from anything else.
    Falling,
}

type SharedTrace = Arc<Mutex<TraceRecorder>>;

struct SignalInner {
    id: SignalId,
    name: String,
    width: u32,
    tx: watch::Sender<LogicVec>,
    timebase: Timebase,
    trace: Option<SharedTrace>,
}

/// Handle to one named signal.
///
/// Cloning a handle is cheap; all clones observe and drive the same value.
#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signal({} = {:?})", self.inner.name, self.read())
    }
}

impl Signal {
    /// The declared name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The declared width in bits.
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Position of this signal in its registry.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Current simulated time as seen by this signal's scenario.
    pub fn now(&self) -> SimTime {
        self.inner.timebase.now()
    }

    /// Samples the current value.
    pub fn read(&self) -> LogicVec {
        *self.inner.tx.borrow()
    }

    /// Returns `true` when no bit is X or Z.
    pub fn is_resolvable(&self) -> bool {
        self.read().is_resolvable()
    }

    /// The current value as an integer, or `None` if any bit is unresolved.
    pub fn value(&self) -> Option<u64> {
        self.read().to_u64()
    }

    /// The current value as an integer; unresolved bits are an error.
    pub fn require_u64(&self) -> Result<u64, SimError> {
        self.value().ok_or_else(|| self.unresolvable())
    }

    /// The current value as a boolean (non-zero is `true`); unresolved bits
    /// are an error.
    pub fn require_bool(&self) -> Result<bool, SimError> {
        self.require_u64().map(|v| v != 0)
    }

    /// Builds the [`SimError::Unresolvable`] for this signal at the current
    /// time.
    pub fn unresolvable(&self) -> SimError {
        SimError::Unresolvable {
            signal: self.inner.name.clone(),
            time: self.now(),
        }
    }

    /// Replaces the value. The width must match the declaration; unknown
    /// bits are allowed.
    pub fn write(&self, value: LogicVec) -> Result<(), SimError> {
        if value.width() != self.inner.width {
            return Err(SimError::WidthMismatch {
                signal: self.inner.name.clone(),
                expected: self.inner.width,
                actual: value.width(),
            });
        }
        self.apply(value);
        Ok(())
    }

    /// Drives a resolved integer, truncated to the declared width.
    pub fn drive(&self, value: u64) {
        self.apply(LogicVec::from_u64(value, self.inner.width));
    }

    /// Drives `1` or `0`.
    pub fn drive_bool(&self, value: bool) {
        self.drive(u64::from(value));
    }

    /// Drives every bit to `X`, as an undriven input looks before reset.
    pub fn set_unknown(&self) {
        self.apply(LogicVec::unknown(self.inner.width));
    }

    /// Drives every bit to `Z`.
    pub fn set_high_z(&self) {
        self.apply(LogicVec::high_z(self.inner.width));
    }

    fn apply(&self, value: LogicVec) {
        let changed = self.inner.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        if changed {
            if let Some(trace) = &self.inner.trace {
                trace
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record_change(self.now(), self.inner.id, value);
            }
        }
    }

    /// Suspends until bit 0 transitions to `1`.
    pub async fn rising_edge(&self) -> Result<(), SimError> {
        self.edge(Some(Edge::Rising)).await.map(|_| ())
    }

    /// Suspends until bit 0 transitions to `0`.
    pub async fn falling_edge(&self) -> Result<(), SimError> {
        self.edge(Some(Edge::Falling)).await.map(|_| ())
    }

    /// Suspends until bit 0 transitions to either `0` or `1` and reports
    /// which.
    pub async fn any_edge(&self) -> Result<Edge, SimError> {
        self.edge(None).await
    }

    /// Suspends until the value changes in any way.
    pub async fn changed(&self) -> Result<LogicVec, SimError> {
        let mut rx = self.inner.tx.subscribe();
        rx.changed().await.map_err(|_| self.closed())?;
        let value = *rx.borrow_and_update();
        Ok(value)
    }

    async fn edge(&self, wanted: Option<Edge>) -> Result<Edge, SimError> {
        let mut rx = self.inner.tx.subscribe();
        let mut last = rx.borrow_and_update().lsb();
        loop {
            rx.changed().await.map_err(|_| self.closed())?;
            let now = rx.borrow_and_update().lsb();
            let edge = match now {
                Logic::One if last != Logic::One => Some(Edge::Rising),
                Logic::Zero if last != Logic::Zero => Some(Edge::Falling),
                _ => None,
            };
            last = now;
            match (edge, wanted) {
                (Some(e), None) => return Ok(e),
                (Some(e), Some(w)) if e == w => return Ok(e),
                _ => {}
            }
        }
    }

    fn closed(&self) -> SimError {
        SimError::ChannelClosed {
            signal: self.inner.name.clone(),
        }
    }
}

/// The set of signals of one scenario, looked up by name.
///
/// Every signal starts out all-`X`, which is what an undriven port of a
/// freshly elaborated design reads as.
pub struct SignalRegistry {
    timebase: Timebase,
    signals: Vec<Signal>,
    by_name: HashMap<String, usize>,
    trace: Option<SharedTrace>,
}

impl SignalRegistry {
    /// Creates an empty registry on the given timebase.
    pub fn new(timebase: Timebase) -> Self {
        Self {
            timebase,
            signals: Vec::new(),
            by_name: HashMap::new(),
            trace: None,
        }
    }

    /// Creates an empty registry that records every value change of every
    /// signal it declares.
    pub fn with_trace(timebase: Timebase, scope: &str) -> Self {
        let mut registry = Self::new(timebase);
        registry.trace = Some(Arc::new(Mutex::new(TraceRecorder::new(scope))));
        registry
    }

    /// The scenario timebase.
    pub fn timebase(&self) -> Timebase {
        self.timebase
    }

    /// Declares a new signal of the given width.
    pub fn declare(&mut self, name: &str, width: u32) -> Result<Signal, SimError> {
        if !(1..=MAX_WIDTH).contains(&width) {
            return Err(SimError::InvalidWidth {
                signal: name.to_string(),
                width,
            });
        }
        if self.by_name.contains_key(name) {
            return Err(SimError::DuplicateSignal {
                name: name.to_string(),
            });
        }
        let id = SignalId(self.signals.len() as u32);
        let initial = LogicVec::unknown(width);
        let (tx, _) = watch::channel(initial);
        if let Some(trace) = &self.trace {
            let mut trace = trace.lock().unwrap_or_else(PoisonError::into_inner);
            trace.register_signal(id, name, width);
            trace.record_change(self.timebase.now(), id, initial);
        }
        let signal = Signal {
            inner: Arc::new(SignalInner {
                id,
                name: name.to_string(),
                width,
                tx,
                timebase: self.timebase,
                trace: self.trace.clone(),
            }),
        };
        self.by_name.insert(name.to_string(), self.signals.len());
        self.signals.push(signal.clone());
        tracing::debug!(signal = name, width, "declared signal");
        Ok(signal)
    }

    /// Looks up a declared signal by name.
    pub fn get(&self, name: &str) -> Result<Signal, SimError> {
        self.by_name
            .get(name)
            .map(|&idx| self.signals[idx].clone())
            .ok_or_else(|| SimError::UnknownSignal {
                name: name.to_string(),
            })
    }

    /// All declared signals in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }

    /// Number of declared signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns `true` if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Renders the recorded trace as VCD text, if tracing is enabled.
    pub fn render_trace(&self) -> Option<Result<Vec<u8>, SimError>> {
        self.trace.as_ref().map(|trace| {
            let mut out = Vec::new();
            trace
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_vcd(&mut out)?;
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SignalRegistry {
        SignalRegistry::new(Timebase::start())
    }

    #[tokio::test(start_paused = true)]
    async fn declared_signals_start_unknown() {
        let mut reg = registry();
        let up = reg.declare("up_i", 1).unwrap();
        assert!(!up.is_resolvable());
        assert_eq!(up.value(), None);
        assert_eq!(up.width(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn require_on_unknown_is_typed_failure() {
        let mut reg = registry();
        let count = reg.declare("count_o", 7).unwrap();
        let err = count.require_u64().unwrap_err();
        assert!(matches!(err, SimError::Unresolvable { ref signal, .. } if signal == "count_o"));
    }

    #[tokio::test(start_paused = true)]
    async fn drive_masks_to_width() {
        let mut reg = registry();
        let data = reg.declare("data_o", 5).unwrap();
        data.drive(63);
        assert_eq!(data.require_u64().unwrap(), 31);
    }

    #[tokio::test(start_paused = true)]
    async fn write_checks_width() {
        let mut reg = registry();
        let data = reg.declare("data_i", 4).unwrap();
        let err = data.write(LogicVec::from_u64(1, 3)).unwrap_err();
        assert!(matches!(
            err,
            SimError::WidthMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
        data.write(LogicVec::unknown(4)).unwrap();
        assert!(!data.is_resolvable());
    }

    #[tokio::test(start_paused = true)]
    async fn released_bus_is_unresolved() {
        let mut reg = registry();
        let bus = reg.declare("data_io", 4).unwrap();
        bus.drive(9);
        let waiter = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.changed().await })
        };
        tokio::task::yield_now().await;
        bus.set_high_z();
        assert_eq!(waiter.await.unwrap().unwrap(), LogicVec::high_z(4));
        assert_eq!(bus.value(), None);
        assert!(matches!(bus.require_bool(), Err(SimError::Unresolvable { .. })));
        bus.set_unknown();
        assert_eq!(bus.read(), LogicVec::unknown(4));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_and_unknown_names() {
        let mut reg = registry();
        reg.declare("clk_i", 1).unwrap();
        assert!(matches!(
            reg.declare("clk_i", 1),
            Err(SimError::DuplicateSignal { .. })
        ));
        assert!(matches!(
            reg.get("nope"),
            Err(SimError::UnknownSignal { .. })
        ));
        assert_eq!(reg.get("clk_i").unwrap().name(), "clk_i");
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_width_rejected() {
        let mut reg = registry();
        assert!(matches!(
            reg.declare("wide", 65),
            Err(SimError::InvalidWidth { width: 65, .. })
        ));
        assert!(reg.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rising_edge_ignores_rewrites_and_falls() {
        let mut reg = registry();
        let clk = reg.declare("clk_i", 1).unwrap();
        clk.drive(0);
        let waiter = {
            let clk = clk.clone();
            tokio::spawn(async move { clk.rising_edge().await })
        };
        tokio::task::yield_now().await;
        clk.drive(0);
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        clk.drive(1);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn any_edge_reports_direction() {
        let mut reg = registry();
        let clk = reg.declare("clk_i", 1).unwrap();
        clk.drive(1);
        let waiter = {
            let clk = clk.clone();
            tokio::spawn(async move { clk.any_edge().await })
        };
        tokio::task::yield_now().await;
        clk.drive(0);
        assert_eq!(waiter.await.unwrap().unwrap(), Edge::Falling);
    }
}
