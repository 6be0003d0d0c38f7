//! Error types shared by the catalog, the engine guard and the session controller.
//!
//! Script-level failures (Lox parse or runtime errors) are not represented here:
//! they arrive as the `errors` text of a normal `ExecutionResult`.

use thiserror::Error;

/// Failure to resolve an example locator to text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("example not found: {0}")]
    NotFound(String),

    #[error("failed to retrieve example: {0}")]
    Transport(String),
}

/// Failures of the execution engine lifecycle guard
///
/// `Clone` because a single initialization outcome is handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Initialization failed; the engine stays unusable for the rest of the process.
    #[error("interpreter failed to initialize: {0}")]
    Init(String),

    #[error("interpreter is not ready")]
    NotReady,

    /// The engine itself faulted, as opposed to reporting a script error.
    #[error("interpreter fault: {0}")]
    Runtime(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A run is already in flight.
    #[error("a program is already running")]
    Busy,
}
