//! The behavioral model base shared by every reference model.
//!
//! A [`Model`] is a plain state machine with a two-phase update: on each
//! rising clock edge it samples its inputs and computes the next state, and on
//! the following falling edge it commits that state. [`ModelHandle`] owns the
//! task that drives those two phases from a [`ClockDomain`] and guards the
//! start/stop/read protocol around it.
//!
//! The model state lives behind a `std::sync::Mutex` that is only ever
//! locked between await points, so readers on other tasks always observe a
//! fully committed state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lockstep_sim::{ClockDomain, SimError};
use tokio::task::JoinHandle;

/// A cycle-based reference model.
pub trait Model: Send + 'static {
    /// The prediction the model makes for its device output(s).
    type Output: Copy + fmt::Debug + Send;

    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Samples inputs at a rising edge and computes the next state.
    ///
    /// An error is a model fault, for example a required input that is not
    /// resolvable. It is latched by the owning [`ModelHandle`].
    fn on_rising(&mut self) -> Result<(), SimError>;

    /// Commits the state computed by the last [`on_rising`](Self::on_rising).
    fn on_falling(&mut self);

    /// The prediction for the current cycle.
    ///
    /// Moore models return their committed state. Mealy models combine it
    /// with the live inputs and may fail if those are unresolvable.
    fn output(&self) -> Result<Self::Output, SimError>;
}

/// What a device output is expected to read at a comparison point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// Exactly this resolved value.
    Exact(u64),
    /// Any resolved value.
    Any,
}

impl Expectation {
    /// Returns `true` if `actual` satisfies the expectation.
    pub fn admits(&self, actual: u64) -> bool {
        match self {
            Expectation::Exact(v) => *v == actual,
            Expectation::Any => true,
        }
    }
}

impl From<u64> for Expectation {
    fn from(v: u64) -> Self {
        Expectation::Exact(v)
    }
}

impl From<bool> for Expectation {
    fn from(v: bool) -> Self {
        Expectation::Exact(u64::from(v))
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Exact(v) => write!(f, "{v}"),
            Expectation::Any => write!(f, "any resolved value"),
        }
    }
}

struct CoreState<M> {
    model: M,
    ready: bool,
    fault: Option<SimError>,
}

struct ModelCore<M> {
    name: String,
    state: Mutex<CoreState<M>>,
}

impl<M: Model> ModelCore<M> {
    fn lock(&self) -> MutexGuard<'_, CoreState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_output(&self) -> Result<M::Output, SimError> {
        let state = self.lock();
        if let Some(fault) = &state.fault {
            return Err(fault.clone());
        }
        if !state.ready {
            return Err(SimError::ModelNotReady {
                model: self.name.clone(),
            });
        }
        state.model.output()
    }
}

/// Read-only access to a running model from another task.
pub struct ModelView<M> {
    core: Arc<ModelCore<M>>,
}

impl<M> Clone for ModelView<M> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<M: Model> ModelView<M> {
    /// See [`ModelHandle::current_output`].
    pub fn current_output(&self) -> Result<M::Output, SimError> {
        self.core.current_output()
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.core.name
    }
}

/// Owner of one model instance and the task updating it.
///
/// A handle is created per scenario, started once and discarded. Dropping it
/// aborts the update task.
pub struct ModelHandle<M> {
    core: Arc<ModelCore<M>>,
    clock: ClockDomain,
    started: bool,
    task: Option<JoinHandle<()>>,
}

impl<M: Model> ModelHandle<M> {
    /// Wraps `model`, to be clocked by `clock` once started.
    pub fn new(model: M, clock: &ClockDomain) -> Self {
        let name = model.name().to_string();
        Self {
            core: Arc::new(ModelCore {
                name,
                state: Mutex::new(CoreState {
                    model,
                    ready: false,
                    fault: None,
                }),
            }),
            clock: clock.clone(),
            started: false,
            task: None,
        }
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Spawns the update task. A model can only be started once.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.started {
            return Err(SimError::AlreadyStarted {
                what: format!("model `{}`", self.core.name),
            });
        }
        self.started = true;
        let core = Arc::clone(&self.core);
        let clock = self.clock.clone();
        self.task = Some(tokio::spawn(run(core, clock)));
        tracing::debug!(model = %self.core.name, "model started");
        Ok(())
    }

    /// Stops the update task; the committed state stays readable.
    pub fn stop(&mut self) -> Result<(), SimError> {
        if !self.started {
            return Err(SimError::NeverStarted {
                what: format!("model `{}`", self.core.name),
            });
        }
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(model = %self.core.name, "model stopped");
        }
        Ok(())
    }

    /// The model's prediction for the current cycle.
    ///
    /// Fails with [`SimError::ModelNotReady`] until the model has seen a full
    /// clock cycle since [`start`](Self::start), and with the latched fault
    /// once the model has faulted.
    pub fn current_output(&self) -> Result<M::Output, SimError> {
        self.core.current_output()
    }

    /// The latched fault, if any.
    pub fn fault(&self) -> Option<SimError> {
        self.core.lock().fault.clone()
    }

    /// A cloneable read-only view for monitors.
    pub fn view(&self) -> ModelView<M> {
        ModelView {
            core: Arc::clone(&self.core),
        }
    }

    /// Runs `f` against the committed model state.
    pub fn inspect<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.core.lock().model)
    }
}

impl<M> Drop for ModelHandle<M> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<M: Model>(core: Arc<ModelCore<M>>, clock: ClockDomain) {
    loop {
        if clock.rising_edge().await.is_err() {
            break;
        }
        {
            let mut state = core.lock();
            if state.fault.is_none() {
                if let Err(e) = state.model.on_rising() {
                    tracing::warn!(model = %core.name, error = %e, "model fault");
                    state.fault = Some(e);
                }
            }
        }
        if clock.falling_edge().await.is_err() {
            break;
        }
        {
            let mut state = core.lock();
            if state.fault.is_none() {
                state.model.on_falling();
            }
            state.ready = true;
        }
    }
}
