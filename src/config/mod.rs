//! Configuration - a Rhai script populating [`Settings`]
//!
//! Loaded from `<config dir>/lox-playground/init.rhai`, or from a path passed
//! on the command line.

mod engine;
mod settings;

pub use engine::ConfigEngine;
pub use settings::Settings;
