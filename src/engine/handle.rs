use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use super::{ExecutionResult, Interpreter};
use crate::error::EngineError;

/// Process-wide engine, created on first use
static SHARED: OnceLock<Arc<EngineHandle>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// Lifecycle guard around an [`Interpreter`]
///
/// Initialization is single-flight: concurrent callers of [`initialize`] share
/// one call to `Interpreter::init` and all observe its outcome. A failed
/// initialization is final for this handle.
///
/// [`initialize`]: EngineHandle::initialize
pub struct EngineHandle {
    engine: Arc<dyn Interpreter>,
    outcome: OnceCell<Result<(), EngineError>>,
    initializing: AtomicBool,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn Interpreter>) -> Self {
        Self {
            engine,
            outcome: OnceCell::new(),
            initializing: AtomicBool::new(false),
        }
    }

    /// The process-wide handle. `create` only runs for the first caller.
    pub fn shared<F>(create: F) -> Arc<EngineHandle>
    where
        F: FnOnce() -> Arc<dyn Interpreter>,
    {
        Arc::clone(SHARED.get_or_init(|| Arc::new(EngineHandle::new(create()))))
    }

    pub fn state(&self) -> EngineState {
        match self.outcome.get() {
            Some(Ok(())) => EngineState::Ready,
            Some(Err(_)) => EngineState::Failed,
            None if self.initializing.load(Ordering::Acquire) => EngineState::Initializing,
            None => EngineState::Uninitialized,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == EngineState::Ready
    }

    pub async fn initialize(&self) -> Result<(), EngineError> {
        self.outcome
            .get_or_init(|| async {
                self.initializing.store(true, Ordering::Release);
                let _flag = InitializingFlag(&self.initializing);
                info!("initializing interpreter");

                let outcome = self
                    .engine
                    .init()
                    .await
                    .map_err(|e| EngineError::Init(format!("{:#}", e)));

                match &outcome {
                    Ok(()) => info!("interpreter ready"),
                    Err(e) => error!(error = %e, "interpreter initialization failed"),
                }
                outcome
            })
            .await
            .clone()
    }

    /// Run a program. Never reaches the engine unless it is `Ready`.
    pub async fn run(&self, source: &str) -> Result<ExecutionResult, EngineError> {
        if !self.is_ready() {
            debug!(state = ?self.state(), "run rejected, interpreter not ready");
            return Err(EngineError::NotReady);
        }

        self.engine
            .run(source)
            .await
            .map_err(|e| EngineError::Runtime(format!("{:#}", e)))
    }
}

/// Clears the in-flight flag when the init future finishes or is dropped
struct InitializingFlag<'a>(&'a AtomicBool);

impl Drop for InitializingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
