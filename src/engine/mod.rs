//! Execution engine seam
//!
//! The Lox interpreter is an external collaborator behind [`Interpreter`].
//! [`EngineHandle`] wraps it with the init-once lifecycle the session relies on.

mod handle;
mod process;

use async_trait::async_trait;

pub use handle::{EngineHandle, EngineState};
pub use process::ProcessEngine;

/// What one run of a program produced
///
/// `errors` carries the script's own parse/runtime errors; a non-empty value is
/// a normal outcome, not a failure of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub output: String,
    pub errors: String,
}

impl ExecutionResult {
    pub fn new(output: impl Into<String>, errors: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            errors: errors.into(),
        }
    }

    /// Text shown to the user: output followed by errors
    pub fn display_text(&self) -> String {
        format!("{}{}", self.output, self.errors)
    }
}

/// An interpreter that has to be initialized once before it can run programs
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn init(&self) -> anyhow::Result<()>;

    /// Run a whole program. `Err` means the engine faulted.
    async fn run(&self, source: &str) -> anyhow::Result<ExecutionResult>;
}
