//! Session controller - sequences example loads and runs against the editor,
//! the interpreter and the output display.

mod controller;
mod status;

pub use controller::{LoadOutcome, RunReport, SessionController};
pub use status::SessionStatus;
